// src/core/gateway/mod.rs

//! The seam between the collection adapters and whatever actually runs the
//! commands: a live SpinelDB/Redis connection or an in-process store.

mod memory;
mod tcp;

pub use memory::InMemoryGateway;
pub use tcp::TcpGateway;

use crate::core::CollectionResult;
use crate::core::commands::RemoteCommand;
use crate::core::protocol::RespFrame;
use async_trait::async_trait;

/// Executes one remote command and returns its raw reply.
///
/// Implementations must run each command atomically with respect to every
/// other command on the same keys, and must not split a command in two.
/// Error replies may be returned as `RespFrame::Error`; the executor turns them
/// into faults.
#[async_trait]
pub trait CommandGateway: Send + Sync + 'static {
    async fn execute(&self, command: RemoteCommand) -> CollectionResult<RespFrame>;
}
