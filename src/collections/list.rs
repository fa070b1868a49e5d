// src/collections/list.rs

//! An index-addressable list whose elements live in a remote list key.

use crate::core::codec::{Codec, decode_all, decode_optional, encode_all};
use crate::core::commands::reply::{
    expect_bulk_array, expect_integer, expect_ok, expect_optional_bulk, expect_optional_integer,
};
use crate::core::commands::{InsertPosition, RemoteCommand};
use crate::core::{CollectionError, CollectionResult, CommandExecutor, PendingResult};
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// A client-side handle to the remote list stored under `name`.
///
/// The handle holds no elements. Every method sends one command (`remove_at`
/// sends two) and the store serializes concurrent callers, so handles can be
/// cloned and shared freely; two handles with the same name see the same list.
pub struct RemoteList<V, C> {
    name: String,
    key: Bytes,
    codec: Arc<C>,
    executor: CommandExecutor,
    _element: PhantomData<fn() -> V>,
}

impl<V, C> Clone for RemoteList<V, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            codec: Arc::clone(&self.codec),
            executor: self.executor.clone(),
            _element: PhantomData,
        }
    }
}

impl<V, C> std::fmt::Debug for RemoteList<V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteList").field("name", &self.name).finish()
    }
}

impl<V, C> RemoteList<V, C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub(crate) fn key(&self) -> &Bytes {
        &self.key
    }

    pub(crate) fn shared_codec(&self) -> Arc<C> {
        Arc::clone(&self.codec)
    }

    pub(crate) fn executor(&self) -> &CommandExecutor {
        &self.executor
    }
}

/// Converts a caller index to the store's signed form. Indices past `i64::MAX`
/// name no element and must never reach the store as negative offsets.
fn store_index(index: usize) -> Option<i64> {
    i64::try_from(index).ok()
}

/// Like `store_index`, for range bounds: an oversized bound means "to the end".
fn store_bound(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

impl<V, C> RemoteList<V, C>
where
    V: Send + 'static,
    C: Codec<V>,
{
    pub fn new(name: impl Into<String>, codec: C, executor: CommandExecutor) -> Self {
        Self::with_shared_codec(name, Arc::new(codec), executor)
    }

    pub fn with_shared_codec(
        name: impl Into<String>,
        codec: Arc<C>,
        executor: CommandExecutor,
    ) -> Self {
        let name = name.into();
        Self {
            key: Bytes::from(name.clone()),
            name,
            codec,
            executor,
            _element: PhantomData,
        }
    }

    fn encode(&self, value: &V) -> CollectionResult<Bytes> {
        self.codec.encode(value)
    }

    // --- Reads ---

    /// The element at `index`, or `None` when the index is past the end.
    pub fn get_async(&self, index: usize) -> PendingResult<Option<V>> {
        match store_index(index) {
            Some(index) => self.read_at_async(index, Ok),
            None => PendingResult::ready(Ok(None)),
        }
    }

    pub fn get(&self, index: usize) -> CollectionResult<Option<V>> {
        self.executor.get(self.get_async(index))
    }

    /// Reads the element at `index` and lets `on_read` decide what absence means.
    pub(crate) fn read_at_async<T, F>(&self, index: i64, on_read: F) -> PendingResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Option<V>) -> CollectionResult<T> + Send + 'static,
    {
        let codec = self.shared_codec();
        let policy = self.executor.absent_reply();
        self.executor.read_async(
            RemoteCommand::LIndex {
                key: self.key.clone(),
                index,
            },
            move |frame| {
                let payload = expect_optional_bulk("LINDEX", frame, policy)?;
                on_read(decode_optional(codec.as_ref(), payload)?)
            },
        )
    }

    pub fn size_async(&self) -> PendingResult<usize> {
        self.executor.read_async(
            RemoteCommand::LLen {
                key: self.key.clone(),
            },
            |frame| Ok(expect_integer("LLEN", frame)?.max(0) as usize),
        )
    }

    pub fn size(&self) -> CollectionResult<usize> {
        self.executor.get(self.size_async())
    }

    pub fn is_empty_async(&self) -> PendingResult<bool> {
        self.executor.read_async(
            RemoteCommand::LLen {
                key: self.key.clone(),
            },
            |frame| Ok(expect_integer("LLEN", frame)? == 0),
        )
    }

    pub fn is_empty(&self) -> CollectionResult<bool> {
        self.executor.get(self.is_empty_async())
    }

    /// Every element, head first.
    pub fn read_all_async(&self) -> PendingResult<Vec<V>> {
        self.range_signed_async(0, -1)
    }

    pub fn read_all(&self) -> CollectionResult<Vec<V>> {
        self.executor.get(self.read_all_async())
    }

    /// The elements from `from` to `to`, both inclusive.
    pub fn range_async(&self, from: usize, to: usize) -> PendingResult<Vec<V>> {
        self.range_signed_async(store_bound(from), store_bound(to))
    }

    pub fn range(&self, from: usize, to: usize) -> CollectionResult<Vec<V>> {
        self.executor.get(self.range_async(from, to))
    }

    fn range_signed_async(&self, start: i64, stop: i64) -> PendingResult<Vec<V>> {
        let codec = self.shared_codec();
        self.executor.read_async(
            RemoteCommand::LRange {
                key: self.key.clone(),
                start,
                stop,
            },
            move |frame| decode_all(codec.as_ref(), expect_bulk_array("LRANGE", frame)?),
        )
    }

    /// The index of the first element equal to `value`.
    pub fn index_of_async(&self, value: &V) -> PendingResult<Option<usize>> {
        self.position_async(value, None)
    }

    pub fn index_of(&self, value: &V) -> CollectionResult<Option<usize>> {
        self.executor.get(self.index_of_async(value))
    }

    /// The index of the last element equal to `value`.
    pub fn last_index_of_async(&self, value: &V) -> PendingResult<Option<usize>> {
        self.position_async(value, Some(-1))
    }

    pub fn last_index_of(&self, value: &V) -> CollectionResult<Option<usize>> {
        self.executor.get(self.last_index_of_async(value))
    }

    pub fn contains_async(&self, value: &V) -> PendingResult<bool> {
        let payload = match self.encode(value) {
            Ok(payload) => payload,
            Err(e) => return self.executor.failed(e),
        };
        self.executor.read_async(
            RemoteCommand::LPos {
                key: self.key.clone(),
                value: payload,
                rank: None,
            },
            |frame| Ok(expect_optional_integer("LPOS", frame)?.is_some()),
        )
    }

    pub fn contains(&self, value: &V) -> CollectionResult<bool> {
        self.executor.get(self.contains_async(value))
    }

    fn position_async(&self, value: &V, rank: Option<i64>) -> PendingResult<Option<usize>> {
        let payload = match self.encode(value) {
            Ok(payload) => payload,
            Err(e) => return self.executor.failed(e),
        };
        self.executor.read_async(
            RemoteCommand::LPos {
                key: self.key.clone(),
                value: payload,
                rank,
            },
            |frame| Ok(expect_optional_integer("LPOS", frame)?.map(|i| i as usize)),
        )
    }

    // --- Writes ---

    /// Appends `value` at the tail. Resolves to `true` once the store has it.
    pub fn add_async(&self, value: &V) -> PendingResult<bool> {
        match self.encode(value) {
            Ok(payload) => self.push_async(vec![payload], false),
            Err(e) => self.executor.failed(e),
        }
    }

    pub fn add(&self, value: &V) -> CollectionResult<bool> {
        self.executor.get(self.add_async(value))
    }

    /// Appends every value at the tail, in order, with a single command.
    pub fn add_all_async(&self, values: &[V]) -> PendingResult<bool> {
        match encode_all(self.codec.as_ref(), values) {
            Ok(payloads) => self.push_async(payloads, false),
            Err(e) => self.executor.failed(e),
        }
    }

    pub fn add_all(&self, values: &[V]) -> CollectionResult<bool> {
        self.executor.get(self.add_all_async(values))
    }

    /// Inserts `value` at the head.
    pub fn add_first_async(&self, value: &V) -> PendingResult<bool> {
        match self.encode(value) {
            Ok(payload) => self.push_async(vec![payload], true),
            Err(e) => self.executor.failed(e),
        }
    }

    pub fn add_first(&self, value: &V) -> CollectionResult<bool> {
        self.executor.get(self.add_first_async(value))
    }

    fn push_async(&self, values: Vec<Bytes>, head: bool) -> PendingResult<bool> {
        let key = self.key.clone();
        let (command, name) = if head {
            (RemoteCommand::LPush { key, values }, "LPUSH")
        } else {
            (RemoteCommand::RPush { key, values }, "RPUSH")
        };
        self.executor
            .write_async(command, move |frame| Ok(expect_integer(name, frame)? > 0))
    }

    /// Replaces the element at `index`. Fails with `IndexOutOfRange` past the end.
    pub fn set_async(&self, index: usize, value: &V) -> PendingResult<()> {
        let Some(index) = store_index(index) else {
            return self.executor.failed(CollectionError::IndexOutOfRange);
        };
        let payload = match self.encode(value) {
            Ok(payload) => payload,
            Err(e) => return self.executor.failed(e),
        };
        self.executor.write_async(
            RemoteCommand::LSet {
                key: self.key.clone(),
                index,
                value: payload,
            },
            |frame| expect_ok("LSET", frame),
        )
    }

    pub fn set(&self, index: usize, value: &V) -> CollectionResult<()> {
        self.executor.get(self.set_async(index, value))
    }

    /// Inserts `value` before the first element equal to `pivot`.
    /// Resolves to the new length, or `None` when `pivot` is not in the list.
    pub fn insert_before_async(&self, pivot: &V, value: &V) -> PendingResult<Option<usize>> {
        self.insert_async(InsertPosition::Before, pivot, value)
    }

    pub fn insert_before(&self, pivot: &V, value: &V) -> CollectionResult<Option<usize>> {
        self.executor.get(self.insert_before_async(pivot, value))
    }

    /// Inserts `value` after the first element equal to `pivot`.
    pub fn insert_after_async(&self, pivot: &V, value: &V) -> PendingResult<Option<usize>> {
        self.insert_async(InsertPosition::After, pivot, value)
    }

    pub fn insert_after(&self, pivot: &V, value: &V) -> CollectionResult<Option<usize>> {
        self.executor.get(self.insert_after_async(pivot, value))
    }

    fn insert_async(
        &self,
        position: InsertPosition,
        pivot: &V,
        value: &V,
    ) -> PendingResult<Option<usize>> {
        let encoded = self
            .encode(pivot)
            .and_then(|pivot| Ok((pivot, self.encode(value)?)));
        let (pivot, value) = match encoded {
            Ok(pair) => pair,
            Err(e) => return self.executor.failed(e),
        };
        self.executor.write_async(
            RemoteCommand::LInsert {
                key: self.key.clone(),
                position,
                pivot,
                value,
            },
            // -1: pivot missing, 0: list missing.
            |frame| {
                let len = expect_integer("LINSERT", frame)?;
                Ok((len > 0).then_some(len as usize))
            },
        )
    }

    /// Removes the first element equal to `value`. Resolves to whether one was removed.
    pub fn remove_async(&self, value: &V) -> PendingResult<bool> {
        let payload = match self.encode(value) {
            Ok(payload) => payload,
            Err(e) => return self.executor.failed(e),
        };
        self.executor.write_async(
            RemoteCommand::LRem {
                key: self.key.clone(),
                count: 1,
                value: payload,
            },
            |frame| Ok(expect_integer("LREM", frame)? > 0),
        )
    }

    pub fn remove(&self, value: &V) -> CollectionResult<bool> {
        self.executor.get(self.remove_async(value))
    }

    /// Removes the element at `index`.
    ///
    /// The store has no remove-by-index command, so the slot is first
    /// overwritten with a tombstone unique to this call (`LSET`), then the
    /// tombstone is removed (`LREM`). Other elements never move in between.
    pub fn remove_at_async(&self, index: usize) -> PendingResult<()> {
        let Some(slot) = store_index(index) else {
            return self.executor.failed(CollectionError::IndexOutOfRange);
        };
        let tombstone = Bytes::from(format!("__spineldb:removed:{}", Uuid::new_v4()));
        let name = self.name.clone();
        self.executor.write_then_async(
            RemoteCommand::LSet {
                key: self.key.clone(),
                index: slot,
                value: tombstone.clone(),
            },
            RemoteCommand::LRem {
                key: self.key.clone(),
                count: 1,
                value: tombstone,
            },
            move |frame| {
                if expect_integer("LREM", frame)? == 0 {
                    warn!(list = %name, index, "tombstone vanished before removal");
                }
                Ok(())
            },
        )
    }

    pub fn remove_at(&self, index: usize) -> CollectionResult<()> {
        self.executor.get(self.remove_at_async(index))
    }

    /// Keeps only the elements from `from` to `to`, both inclusive.
    pub fn trim_async(&self, from: usize, to: usize) -> PendingResult<()> {
        self.executor.write_async(
            RemoteCommand::LTrim {
                key: self.key.clone(),
                start: store_bound(from),
                stop: store_bound(to),
            },
            |frame| expect_ok("LTRIM", frame),
        )
    }

    pub fn trim(&self, from: usize, to: usize) -> CollectionResult<()> {
        self.executor.get(self.trim_async(from, to))
    }

    /// Deletes the whole list. Resolves to whether it existed.
    pub fn delete_async(&self) -> PendingResult<bool> {
        self.executor.write_async(
            RemoteCommand::Del {
                keys: vec![self.key.clone()],
            },
            |frame| Ok(expect_integer("DEL", frame)? > 0),
        )
    }

    pub fn delete(&self) -> CollectionResult<bool> {
        self.executor.get(self.delete_async())
    }
}
