// src/core/mod.rs

//! The command-mapping core: protocol, codecs, gateways, and the executor that
//! turns every collection operation into exactly one pending remote command.

pub mod codec;
pub mod commands;
pub mod errors;
pub mod executor;
pub mod gateway;
pub mod protocol;
pub mod timeout;

pub use commands::RemoteCommand;
pub use errors::{CollectionError, CollectionResult};
pub use executor::{CommandExecutor, PendingResult};
