// src/core/executor/pending.rs

//! The single-resolution handle for one in-flight remote command.

use crate::core::{CollectionError, CollectionResult};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

enum PendingState<T> {
    Waiting(oneshot::Receiver<CollectionResult<T>>),
    Done(CollectionResult<T>),
    Taken,
}

/// The outcome of one remote command, resolved exactly once.
///
/// The command is already issued when a `PendingResult` exists. It can be
/// `.await`ed from async code, or waited on with [`get`](Self::get) /
/// [`get_timeout`](Self::get_timeout) from a thread outside the runtime.
/// Dropping it or giving up on a wait never cancels or corrupts the command:
/// the store either has run it or will run it whole.
///
/// The blocking methods panic if called from within an async context, like
/// every blocking entry point of a tokio runtime.
pub struct PendingResult<T> {
    state: PendingState<T>,
    runtime: Option<Handle>,
}

// The receiver is polled through `Pin::new`, never through a pinned projection.
impl<T> Unpin for PendingResult<T> {}

impl<T> PendingResult<T> {
    pub(crate) fn from_receiver(
        receiver: oneshot::Receiver<CollectionResult<T>>,
        runtime: Handle,
    ) -> Self {
        Self {
            state: PendingState::Waiting(receiver),
            runtime: Some(runtime),
        }
    }

    /// A result that is resolved from the start, e.g. when encoding the
    /// arguments failed and nothing was sent.
    pub fn ready(result: CollectionResult<T>) -> Self {
        Self {
            state: PendingState::Done(result),
            runtime: None,
        }
    }

    /// Checks for resolution without blocking, caching the outcome.
    pub fn is_done(&mut self) -> bool {
        if let PendingState::Waiting(receiver) = &mut self.state {
            match receiver.try_recv() {
                Ok(result) => self.state = PendingState::Done(result),
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Closed) => {
                    self.state = PendingState::Done(Err(CollectionError::RuntimeShutdown))
                }
            }
        }
        true
    }

    /// The cached outcome, if the command has resolved. Can be called repeatedly.
    pub fn now(&mut self) -> Option<&CollectionResult<T>> {
        if !self.is_done() {
            return None;
        }
        match &self.state {
            PendingState::Done(result) => Some(result),
            _ => None,
        }
    }

    /// Blocks the calling thread until the command resolves.
    pub fn get(self) -> CollectionResult<T> {
        match self.state {
            PendingState::Waiting(receiver) => receiver
                .blocking_recv()
                .unwrap_or(Err(CollectionError::RuntimeShutdown)),
            PendingState::Done(result) => result,
            PendingState::Taken => Err(consumed()),
        }
    }

    /// Blocks for at most `timeout`. Expiry returns `Timeout` and leaves the
    /// command to complete (or not) on its own.
    pub fn get_timeout(self, timeout: Duration) -> CollectionResult<T> {
        match self.state {
            PendingState::Waiting(receiver) => {
                let Some(runtime) = self.runtime else {
                    return Err(CollectionError::RuntimeShutdown);
                };
                match runtime.block_on(tokio::time::timeout(timeout, receiver)) {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => Err(CollectionError::RuntimeShutdown),
                    Err(_) => Err(CollectionError::Timeout("pending result".to_string())),
                }
            }
            PendingState::Done(result) => result,
            PendingState::Taken => Err(consumed()),
        }
    }
}

fn consumed() -> CollectionError {
    CollectionError::Internal("pending result was already consumed".to_string())
}

impl<T> Future for PendingResult<T> {
    type Output = CollectionResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match std::mem::replace(&mut this.state, PendingState::Taken) {
            PendingState::Waiting(mut receiver) => match Pin::new(&mut receiver).poll(cx) {
                Poll::Ready(result) => {
                    Poll::Ready(result.unwrap_or(Err(CollectionError::RuntimeShutdown)))
                }
                Poll::Pending => {
                    this.state = PendingState::Waiting(receiver);
                    Poll::Pending
                }
            },
            PendingState::Done(result) => Poll::Ready(result),
            PendingState::Taken => Poll::Ready(Err(consumed())),
        }
    }
}

impl<T> std::fmt::Debug for PendingResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            PendingState::Waiting(_) => "waiting",
            PendingState::Done(Ok(_)) => "done(ok)",
            PendingState::Done(Err(_)) => "done(err)",
            PendingState::Taken => "taken",
        };
        f.debug_struct("PendingResult").field("state", &state).finish()
    }
}
