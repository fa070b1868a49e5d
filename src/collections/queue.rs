// src/collections/queue.rs

//! A FIFO queue layered on a [`RemoteList`]: offers go to the tail, polls and
//! peeks read the head.

use super::list::RemoteList;
use crate::core::codec::{Codec, decode_optional};
use crate::core::commands::reply::{expect_keyed_pop, expect_optional_bulk};
use crate::core::commands::{RemoteCommand, Side};
use crate::core::timeout::duration_to_seconds;
use crate::core::{CollectionError, CollectionResult, CommandExecutor, PendingResult};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// A distributed queue stored under `name`.
///
/// `peek`/`poll` return `None` on an empty queue, while `element`, `remove`,
/// `get_first` and `remove_first` fail with `NoSuchElement`. Both families
/// send the same command and differ only in how absence is reported.
pub struct RemoteQueue<V, C> {
    list: RemoteList<V, C>,
}

impl<V, C> Clone for RemoteQueue<V, C> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<V, C> std::fmt::Debug for RemoteQueue<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteQueue")
            .field("name", &self.list.name())
            .finish()
    }
}

fn require_element<V>(value: Option<V>) -> CollectionResult<V> {
    value.ok_or(CollectionError::NoSuchElement)
}

impl<V, C> RemoteQueue<V, C>
where
    V: Send + 'static,
    C: Codec<V>,
{
    pub fn new(name: impl Into<String>, codec: C, executor: CommandExecutor) -> Self {
        Self {
            list: RemoteList::new(name, codec, executor),
        }
    }

    pub fn with_shared_codec(
        name: impl Into<String>,
        codec: Arc<C>,
        executor: CommandExecutor,
    ) -> Self {
        Self {
            list: RemoteList::with_shared_codec(name, codec, executor),
        }
    }

    pub fn name(&self) -> &str {
        self.list.name()
    }

    /// The list view of the same remote key.
    pub fn as_list(&self) -> &RemoteList<V, C> {
        &self.list
    }

    fn executor(&self) -> &CommandExecutor {
        self.list.executor()
    }

    fn key(&self) -> Bytes {
        self.list.key().clone()
    }

    // --- Offer ---

    /// Appends `value` at the tail.
    pub fn offer_async(&self, value: &V) -> PendingResult<bool> {
        self.list.add_async(value)
    }

    pub fn offer(&self, value: &V) -> CollectionResult<bool> {
        self.executor().get(self.offer_async(value))
    }

    // --- Head reads: one `LINDEX 0`, two absence policies ---

    pub fn peek_async(&self) -> PendingResult<Option<V>> {
        self.list.read_at_async(0, Ok)
    }

    pub fn peek(&self) -> CollectionResult<Option<V>> {
        self.executor().get(self.peek_async())
    }

    pub fn element_async(&self) -> PendingResult<V> {
        self.list.read_at_async(0, require_element)
    }

    pub fn element(&self) -> CollectionResult<V> {
        self.executor().get(self.element_async())
    }

    pub fn get_first_async(&self) -> PendingResult<V> {
        self.element_async()
    }

    pub fn get_first(&self) -> CollectionResult<V> {
        self.executor().get(self.get_first_async())
    }

    // --- Head pops: one `LPOP`, two absence policies ---

    fn pop_head_async<T, F>(&self, on_pop: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Option<V>) -> CollectionResult<T> + Send + 'static,
    {
        let codec = self.list.shared_codec();
        let policy = self.executor().absent_reply();
        self.executor()
            .write_async(RemoteCommand::LPop { key: self.key() }, move |frame| {
                let payload = expect_optional_bulk("LPOP", frame, policy)?;
                on_pop(decode_optional(codec.as_ref(), payload)?)
            })
    }

    pub fn poll_async(&self) -> PendingResult<Option<V>> {
        self.pop_head_async(Ok)
    }

    pub fn poll(&self) -> CollectionResult<Option<V>> {
        self.executor().get(self.poll_async())
    }

    pub fn remove_async(&self) -> PendingResult<V> {
        self.pop_head_async(require_element)
    }

    pub fn remove(&self) -> CollectionResult<V> {
        self.executor().get(self.remove_async())
    }

    pub fn remove_first_async(&self) -> PendingResult<V> {
        self.remove_async()
    }

    pub fn remove_first(&self) -> CollectionResult<V> {
        self.executor().get(self.remove_first_async())
    }

    // --- Atomic hand-off ---

    /// Moves this queue's tail element to the head of the queue named `target`
    /// in one store command, and resolves to the moved element.
    ///
    /// The element is never observable in neither or both queues. `target`
    /// may be this queue's own name, which rotates the tail to the head. An
    /// empty source resolves to `None` and leaves `target` untouched.
    pub fn poll_last_and_offer_first_to_async(&self, target: &str) -> PendingResult<Option<V>> {
        let codec = self.list.shared_codec();
        let policy = self.executor().absent_reply();
        self.executor().write_async(
            RemoteCommand::LMove {
                source: self.key(),
                destination: Bytes::copy_from_slice(target.as_bytes()),
                from: Side::Right,
                to: Side::Left,
            },
            move |frame| {
                let payload = expect_optional_bulk("LMOVE", frame, policy)?;
                decode_optional(codec.as_ref(), payload)
            },
        )
    }

    pub fn poll_last_and_offer_first_to(&self, target: &str) -> CollectionResult<Option<V>> {
        self.executor().get(self.poll_last_and_offer_first_to_async(target))
    }

    pub fn poll_last_and_offer_first_to_queue_async(
        &self,
        target: &RemoteQueue<V, C>,
    ) -> PendingResult<Option<V>> {
        self.poll_last_and_offer_first_to_async(target.name())
    }

    pub fn poll_last_and_offer_first_to_queue(
        &self,
        target: &RemoteQueue<V, C>,
    ) -> CollectionResult<Option<V>> {
        self.poll_last_and_offer_first_to(target.name())
    }

    // --- Waiting variants ---

    /// Like `poll`, but waits up to `timeout` for an element to arrive.
    ///
    /// The wait runs in the store, in whole seconds: sub-second timeouts wait
    /// one second, and `Duration::ZERO` waits until an element arrives.
    pub fn poll_timeout_async(&self, timeout: Duration) -> PendingResult<Option<V>> {
        let codec = self.list.shared_codec();
        let policy = self.executor().absent_reply();
        self.executor().write_async(
            RemoteCommand::BLPop {
                keys: vec![self.key()],
                timeout_secs: duration_to_seconds(timeout),
            },
            move |frame| {
                let payload = expect_keyed_pop("BLPOP", frame, policy)?;
                decode_optional(codec.as_ref(), payload)
            },
        )
    }

    pub fn poll_timeout(&self, timeout: Duration) -> CollectionResult<Option<V>> {
        self.executor().get(self.poll_timeout_async(timeout))
    }

    /// Like `poll_last_and_offer_first_to`, but waits up to `timeout` for the
    /// source to hold an element. Timeout rounding follows `poll_timeout`.
    pub fn poll_last_and_offer_first_to_timeout_async(
        &self,
        target: &str,
        timeout: Duration,
    ) -> PendingResult<Option<V>> {
        let codec = self.list.shared_codec();
        let policy = self.executor().absent_reply();
        self.executor().write_async(
            RemoteCommand::BLMove {
                source: self.key(),
                destination: Bytes::copy_from_slice(target.as_bytes()),
                from: Side::Right,
                to: Side::Left,
                timeout_secs: duration_to_seconds(timeout),
            },
            move |frame| {
                let payload = expect_optional_bulk("BLMOVE", frame, policy)?;
                decode_optional(codec.as_ref(), payload)
            },
        )
    }

    pub fn poll_last_and_offer_first_to_timeout(
        &self,
        target: &str,
        timeout: Duration,
    ) -> CollectionResult<Option<V>> {
        self.executor().get(self.poll_last_and_offer_first_to_timeout_async(target, timeout))
    }

    // --- Delegated list operations ---

    pub fn size_async(&self) -> PendingResult<usize> {
        self.list.size_async()
    }

    pub fn size(&self) -> CollectionResult<usize> {
        self.list.size()
    }

    pub fn is_empty_async(&self) -> PendingResult<bool> {
        self.list.is_empty_async()
    }

    pub fn is_empty(&self) -> CollectionResult<bool> {
        self.list.is_empty()
    }

    pub fn read_all_async(&self) -> PendingResult<Vec<V>> {
        self.list.read_all_async()
    }

    pub fn read_all(&self) -> CollectionResult<Vec<V>> {
        self.list.read_all()
    }

    pub fn delete_async(&self) -> PendingResult<bool> {
        self.list.delete_async()
    }

    pub fn delete(&self) -> CollectionResult<bool> {
        self.list.delete()
    }
}
