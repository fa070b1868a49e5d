// src/core/executor/mod.rs

//! Issues remote commands and bridges their outcomes to async and blocking callers.
//!
//! Every collection operation is written once, as an async method that calls
//! `write_async` or `read_async` with the mapped command and a reply
//! conversion. The blocking form of each operation is that same call followed
//! by `get`, so both forms send exactly one command.
//!
//! Commands from one executor (and all of its clones) are handed to a single
//! driver task through a channel and reach the gateway in issue order. Blocking
//! commands are dispatched in order too, but wait on their own task so later
//! commands are not held up behind them.

mod pending;

pub use pending::PendingResult;

use crate::core::commands::reply::reject_error;
use crate::core::commands::{AbsentReplyPolicy, RemoteCommand};
use crate::core::gateway::CommandGateway;
use crate::core::protocol::RespFrame;
use crate::core::{CollectionError, CollectionResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

type Completion = Box<dyn FnOnce(CollectionResult<RespFrame>) + Send>;

/// One queued operation: an optional leading command, the command whose reply
/// is converted, and the continuation that converts and delivers it.
struct Job {
    preceding: Option<RemoteCommand>,
    command: RemoteCommand,
    complete: Completion,
}

impl Job {
    async fn run(self, gateway: Arc<dyn CommandGateway>) {
        let Job {
            preceding,
            command,
            complete,
        } = self;
        let name = command.name();
        let reply = async {
            if let Some(first) = preceding {
                reject_error(gateway.execute(first).await?)?;
            }
            reject_error(gateway.execute(command).await?)
        }
        .await;
        if let Err(e) = &reply {
            debug!(command = name, "command failed: {}", e);
        }
        complete(reply);
    }
}

async fn drive(gateway: Arc<dyn CommandGateway>, mut jobs: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = jobs.recv().await {
        if job.command.blocking_timeout().is_some() {
            tokio::spawn(job.run(Arc::clone(&gateway)));
        } else {
            job.run(Arc::clone(&gateway)).await;
        }
    }
    trace!("command driver stopped");
}

/// A runtime built by the client, shut down once the last executor using it is dropped.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            // Safe to run from inside an async context, unlike dropping the runtime.
            runtime.shutdown_background();
        }
    }
}

/// Runs commands through a gateway on a tokio runtime.
///
/// Cheap to clone; clones share the gateway, the runtime and the command order.
#[derive(Clone)]
pub struct CommandExecutor {
    gateway: Arc<dyn CommandGateway>,
    runtime: Handle,
    jobs: mpsc::UnboundedSender<Job>,
    owned_runtime: Option<Arc<OwnedRuntime>>,
    absent_reply: AbsentReplyPolicy,
}

impl CommandExecutor {
    /// Creates an executor whose commands run on `runtime`, owned by the caller.
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        runtime: Handle,
        absent_reply: AbsentReplyPolicy,
    ) -> Self {
        let (jobs, receiver) = mpsc::unbounded_channel();
        runtime.spawn(drive(Arc::clone(&gateway), receiver));
        Self {
            gateway,
            runtime,
            jobs,
            owned_runtime: None,
            absent_reply,
        }
    }

    /// Creates an executor that owns `runtime`. The runtime lives as long as
    /// any clone of the executor, including those held by collections.
    pub fn with_owned_runtime(
        gateway: Arc<dyn CommandGateway>,
        runtime: Runtime,
        absent_reply: AbsentReplyPolicy,
    ) -> Self {
        let mut executor = Self::new(gateway, runtime.handle().clone(), absent_reply);
        executor.owned_runtime = Some(Arc::new(OwnedRuntime(Some(runtime))));
        executor
    }

    pub fn absent_reply(&self) -> AbsentReplyPolicy {
        self.absent_reply
    }

    pub fn gateway(&self) -> &Arc<dyn CommandGateway> {
        &self.gateway
    }

    pub fn owns_runtime(&self) -> bool {
        self.owned_runtime.is_some()
    }

    /// Issues a command that may modify the store.
    pub fn write_async<T, F>(&self, command: RemoteCommand, convert: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(RespFrame) -> CollectionResult<T> + Send + 'static,
    {
        trace!(command = command.name(), keys = ?command.keys(), "write");
        self.submit(command, None, convert)
    }

    /// Issues a read-only command.
    pub fn read_async<T, F>(&self, command: RemoteCommand, convert: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(RespFrame) -> CollectionResult<T> + Send + 'static,
    {
        trace!(command = command.name(), keys = ?command.keys(), "read");
        self.submit(command, None, convert)
    }

    /// Issues `first`, then `second` once `first` has succeeded, and converts the
    /// reply of `second`. Reserved for the few operations the store cannot do in
    /// one command; `first` failing means `second` is never sent.
    pub fn write_then_async<T, F>(
        &self,
        first: RemoteCommand,
        second: RemoteCommand,
        convert: F,
    ) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(RespFrame) -> CollectionResult<T> + Send + 'static,
    {
        trace!(first = first.name(), second = second.name(), keys = ?first.keys(), "write pair");
        self.submit(second, Some(first), convert)
    }

    /// A pending result that has already failed, for arguments that could not be encoded.
    pub fn failed<T>(&self, error: CollectionError) -> PendingResult<T> {
        debug!("operation failed before issuing a command: {}", error);
        PendingResult::ready(Err(error))
    }

    /// Blocks until `pending` resolves, returning its value or re-raising its fault.
    pub fn get<T>(&self, pending: PendingResult<T>) -> CollectionResult<T> {
        pending.get()
    }

    /// Like [`get`](Self::get), giving up after `timeout`.
    pub fn get_timeout<T>(
        &self,
        pending: PendingResult<T>,
        timeout: Duration,
    ) -> CollectionResult<T> {
        pending.get_timeout(timeout)
    }

    fn submit<T, F>(
        &self,
        command: RemoteCommand,
        preceding: Option<RemoteCommand>,
        convert: F,
    ) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(RespFrame) -> CollectionResult<T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job = Job {
            preceding,
            command,
            complete: Box::new(move |reply| {
                // The caller may have dropped its pending result; the command
                // has completed either way.
                let _ = result_tx.send(reply.and_then(convert));
            }),
        };
        if self.jobs.send(job).is_err() {
            return PendingResult::ready(Err(CollectionError::RuntimeShutdown));
        }
        PendingResult::from_receiver(result_rx, self.runtime.clone())
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("absent_reply", &self.absent_reply)
            .field("owns_runtime", &self.owned_runtime.is_some())
            .finish_non_exhaustive()
    }
}
