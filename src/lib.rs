// src/lib.rs

pub mod client;
pub mod collections;
pub mod config;
pub mod core;

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export
pub use crate::client::SpinelClient;
pub use crate::collections::{RemoteList, RemoteQueue};
pub use crate::config::ClientConfig;
pub use crate::core::codec::{BincodeCodec, BytesCodec, Codec, JsonCodec, StringCodec};
pub use crate::core::timeout::TimeUnit;
pub use crate::core::{CollectionError, CollectionResult, PendingResult};
