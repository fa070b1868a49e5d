// src/client.rs

//! The entry point: owns the executor (and, optionally, the runtime it runs on)
//! and hands out collection objects bound to remote keys.

use crate::collections::{RemoteList, RemoteQueue};
use crate::config::ClientConfig;
use crate::core::codec::Codec;
use crate::core::gateway::{CommandGateway, InMemoryGateway, TcpGateway};
use crate::core::protocol::RespFrame;
use crate::core::{
    CollectionError, CollectionResult, CommandExecutor, PendingResult, RemoteCommand,
};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

struct ClientInner {
    executor: CommandExecutor,
    config: ClientConfig,
}

/// A handle to one store. Clones share the connection and runtime.
///
/// Collections share the client's executor, so they keep working after every
/// clone of the client is dropped. A runtime the client built is shut down
/// once the client and all of its collections are gone.
#[derive(Clone)]
pub struct SpinelClient {
    inner: Arc<ClientInner>,
}

impl SpinelClient {
    /// Creates a client for the server in `config`, running on a runtime of
    /// its own with `config.worker_threads` workers.
    ///
    /// The connection is opened by the first command, so an unreachable server
    /// surfaces as a fault on that command.
    pub fn connect(config: ClientConfig) -> CollectionResult<Self> {
        validate(&config)?;
        let runtime = build_runtime(config.worker_threads)?;
        let gateway = Arc::new(TcpGateway::new(&config));
        info!(address = %gateway.address(), "client created with owned runtime");
        let executor = CommandExecutor::with_owned_runtime(gateway, runtime, config.absent_reply);
        Ok(Self::assemble(executor, config))
    }

    /// Like [`connect`](Self::connect), but spawns commands on an existing runtime.
    pub fn connect_with_handle(config: ClientConfig, handle: Handle) -> CollectionResult<Self> {
        validate(&config)?;
        let gateway = Arc::new(TcpGateway::new(&config));
        info!(address = %gateway.address(), "client created on caller runtime");
        Ok(Self::with_gateway(gateway, handle, config))
    }

    /// A client backed by a fresh in-process store, on a runtime of its own.
    pub fn in_memory() -> CollectionResult<Self> {
        let config = ClientConfig::default();
        let runtime = build_runtime(config.worker_threads)?;
        let executor = CommandExecutor::with_owned_runtime(
            Arc::new(InMemoryGateway::new()),
            runtime,
            config.absent_reply,
        );
        Ok(Self::assemble(executor, config))
    }

    /// A client over any gateway, spawning commands on `handle`.
    pub fn with_gateway(
        gateway: Arc<dyn CommandGateway>,
        handle: Handle,
        config: ClientConfig,
    ) -> Self {
        let executor = CommandExecutor::new(gateway, handle, config.absent_reply);
        Self::assemble(executor, config)
    }

    fn assemble(executor: CommandExecutor, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { executor, config }),
        }
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.inner.executor
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// A list view of the key `name`. Nothing is sent until an operation is called.
    pub fn get_list<V, C>(&self, name: impl Into<String>, codec: C) -> RemoteList<V, C>
    where
        V: Send + 'static,
        C: Codec<V>,
    {
        RemoteList::new(name, codec, self.inner.executor.clone())
    }

    /// A queue view of the key `name`. Nothing is sent until an operation is called.
    pub fn get_queue<V, C>(&self, name: impl Into<String>, codec: C) -> RemoteQueue<V, C>
    where
        V: Send + 'static,
        C: Codec<V>,
    {
        RemoteQueue::new(name, codec, self.inner.executor.clone())
    }

    pub fn ping_async(&self) -> PendingResult<()> {
        self.inner
            .executor
            .read_async(RemoteCommand::Ping, |frame| match frame {
                RespFrame::SimpleString(s) if s.eq_ignore_ascii_case("PONG") => Ok(()),
                RespFrame::BulkString(b) if b.eq_ignore_ascii_case(b"PONG") => Ok(()),
                other => Err(CollectionError::UnexpectedReply {
                    command: "PING".to_string(),
                    reply: other.describe(),
                }),
            })
    }

    pub fn ping(&self) -> CollectionResult<()> {
        self.inner.executor.get(self.ping_async())
    }
}

impl std::fmt::Debug for SpinelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinelClient")
            .field("address", &self.inner.config.address())
            .field("owns_runtime", &self.inner.executor.owns_runtime())
            .finish()
    }
}

fn validate(config: &ClientConfig) -> CollectionResult<()> {
    config
        .validate()
        .map_err(|e| CollectionError::InvalidRequest(format!("invalid client config: {e}")))
}

fn build_runtime(worker_threads: usize) -> CollectionResult<Runtime> {
    Ok(Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .thread_name("spineldb-collections")
        .enable_all()
        .build()?)
}
