// src/core/gateway/memory.rs

//! An in-process store of named lists that speaks the same command set as the
//! server. Every command runs under one lock, so multi-key moves are atomic.

use super::CommandGateway;
use crate::core::commands::{InsertPosition, RemoteCommand, Side};
use crate::core::protocol::RespFrame;
use crate::core::{CollectionError, CollectionResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

/// An in-memory `CommandGateway`, used by tests, benches and embedded setups.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    lists: Mutex<HashMap<Bytes, VecDeque<Bytes>>>,
    /// Woken after every write so blocked pops can retry.
    pushed: Notify,
    /// Faults to return instead of executing the next commands.
    injected: Mutex<VecDeque<CollectionError>>,
    /// Command names in execution order, kept only when enabled.
    log: Option<Mutex<Vec<&'static str>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`new`](Self::new), but records the name of every executed command
    /// for [`take_log`](Self::take_log). The log grows until it is taken.
    pub fn with_command_log() -> Self {
        Self {
            log: Some(Mutex::new(Vec::new())),
            ..Self::default()
        }
    }

    /// The current contents of `key`, head first.
    pub fn snapshot(&self, key: &str) -> Vec<Bytes> {
        self.lists
            .lock()
            .get(key.as_bytes())
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The number of elements stored under `key`.
    pub fn len(&self, key: &str) -> usize {
        self.lists
            .lock()
            .get(key.as_bytes())
            .map_or(0, VecDeque::len)
    }

    /// True if no list holds any element.
    pub fn is_empty(&self) -> bool {
        self.lists.lock().is_empty()
    }

    /// Makes the next command fail with `error` without touching any list.
    pub fn inject_fault(&self, error: CollectionError) {
        self.injected.lock().push_back(error);
    }

    /// Names of the commands executed so far, in execution order, clearing the log.
    /// Always empty unless the gateway was built with
    /// [`with_command_log`](Self::with_command_log).
    pub fn take_log(&self) -> Vec<&'static str> {
        self.log
            .as_ref()
            .map(|log| std::mem::take(&mut *log.lock()))
            .unwrap_or_default()
    }

    fn apply(&self, command: &RemoteCommand) -> RespFrame {
        let mut lists = self.lists.lock();
        let frame = apply_to(&mut lists, command);
        drop(lists);
        if command.is_write() {
            self.pushed.notify_waiters();
        }
        frame
    }

    /// Runs `BLPOP`/`BLMOVE`: retry the non-blocking form after every write
    /// until it yields an element or the deadline passes.
    async fn apply_blocking(&self, command: &RemoteCommand, timeout_secs: u64) -> RespFrame {
        let deadline = (timeout_secs > 0)
            .then(|| Instant::now() + Duration::from_secs(timeout_secs));
        let (attempt, on_timeout) = match command {
            RemoteCommand::BLPop { keys, .. } => (BlockingAttempt::Pop(keys), RespFrame::NullArray),
            RemoteCommand::BLMove {
                source,
                destination,
                from,
                to,
                ..
            } => (
                BlockingAttempt::Move(RemoteCommand::LMove {
                    source: source.clone(),
                    destination: destination.clone(),
                    from: *from,
                    to: *to,
                }),
                RespFrame::Null,
            ),
            other => return self.apply(other),
        };

        loop {
            // Register interest before checking, so a push between the check
            // and the wait is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(frame) = self.try_blocking(&attempt) {
                return frame;
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return on_timeout;
                    }
                }
                None => notified.await,
            }
        }
    }

    fn try_blocking(&self, attempt: &BlockingAttempt<'_>) -> Option<RespFrame> {
        let frame = {
            let mut lists = self.lists.lock();
            match attempt {
                BlockingAttempt::Pop(keys) => keys.iter().find_map(|key| {
                    pop(&mut lists, key, Side::Left).map(|value| {
                        RespFrame::Array(vec![
                            RespFrame::BulkString(key.clone()),
                            RespFrame::BulkString(value),
                        ])
                    })
                }),
                BlockingAttempt::Move(lmove) => match apply_to(&mut lists, lmove) {
                    RespFrame::Null => None,
                    frame => Some(frame),
                },
            }
        };
        if frame.is_some() {
            self.pushed.notify_waiters();
        }
        frame
    }
}

enum BlockingAttempt<'a> {
    Pop(&'a [Bytes]),
    Move(RemoteCommand),
}

#[async_trait]
impl CommandGateway for InMemoryGateway {
    async fn execute(&self, command: RemoteCommand) -> CollectionResult<RespFrame> {
        if let Some(log) = &self.log {
            log.lock().push(command.name());
        }
        if let Some(error) = self.injected.lock().pop_front() {
            trace!(command = command.name(), "returning injected fault");
            return Err(error);
        }
        match command.blocking_timeout() {
            Some(timeout_secs) => Ok(self.apply_blocking(&command, timeout_secs).await),
            None => Ok(self.apply(&command)),
        }
    }
}

/// Resolves a possibly negative list index against `len`.
fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// Resolves an inclusive `start..=stop` range the way `LRANGE` and `LTRIM` do.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

fn pop(lists: &mut HashMap<Bytes, VecDeque<Bytes>>, key: &Bytes, side: Side) -> Option<Bytes> {
    let list = lists.get_mut(key)?;
    let value = match side {
        Side::Left => list.pop_front(),
        Side::Right => list.pop_back(),
    };
    // An empty list does not exist in the store.
    if list.is_empty() {
        lists.remove(key);
    }
    value
}

fn apply_to(lists: &mut HashMap<Bytes, VecDeque<Bytes>>, command: &RemoteCommand) -> RespFrame {
    match command {
        RemoteCommand::RPush { key, values } | RemoteCommand::LPush { key, values } => {
            let list = lists.entry(key.clone()).or_default();
            for value in values {
                if matches!(command, RemoteCommand::RPush { .. }) {
                    list.push_back(value.clone());
                } else {
                    list.push_front(value.clone());
                }
            }
            RespFrame::Integer(list.len() as i64)
        }
        RemoteCommand::LPop { key } => match pop(lists, key, Side::Left) {
            Some(value) => RespFrame::BulkString(value),
            None => RespFrame::Null,
        },
        RemoteCommand::LIndex { key, index } => lists
            .get(key)
            .and_then(|list| resolve_index(list.len(), *index).map(|i| list[i].clone()))
            .map_or(RespFrame::Null, RespFrame::BulkString),
        RemoteCommand::LSet { key, index, value } => {
            let Some(list) = lists.get_mut(key) else {
                return RespFrame::Error("ERR no such key".into());
            };
            match resolve_index(list.len(), *index) {
                Some(i) => {
                    list[i] = value.clone();
                    RespFrame::SimpleString("OK".into())
                }
                None => RespFrame::Error("ERR index out of range".into()),
            }
        }
        RemoteCommand::LInsert {
            key,
            position,
            pivot,
            value,
        } => {
            let Some(list) = lists.get_mut(key) else {
                return RespFrame::Integer(0);
            };
            match list.iter().position(|item| item == pivot) {
                Some(i) => {
                    let at = match position {
                        InsertPosition::Before => i,
                        InsertPosition::After => i + 1,
                    };
                    list.insert(at, value.clone());
                    RespFrame::Integer(list.len() as i64)
                }
                None => RespFrame::Integer(-1),
            }
        }
        RemoteCommand::LRem { key, count, value } => {
            let Some(list) = lists.get_mut(key) else {
                return RespFrame::Integer(0);
            };
            let limit = if *count == 0 {
                usize::MAX
            } else {
                count.unsigned_abs() as usize
            };
            let mut removed = 0;
            if *count >= 0 {
                let mut i = 0;
                while i < list.len() && removed < limit {
                    if list[i] == *value {
                        list.remove(i);
                        removed += 1;
                    } else {
                        i += 1;
                    }
                }
            } else {
                let mut i = list.len();
                while i > 0 && removed < limit {
                    i -= 1;
                    if list[i] == *value {
                        list.remove(i);
                        removed += 1;
                    }
                }
            }
            if list.is_empty() {
                lists.remove(key);
            }
            RespFrame::Integer(removed as i64)
        }
        RemoteCommand::LLen { key } => {
            RespFrame::Integer(lists.get(key).map_or(0, VecDeque::len) as i64)
        }
        RemoteCommand::LRange { key, start, stop } => {
            let items = lists
                .get(key)
                .and_then(|list| {
                    resolve_range(list.len(), *start, *stop).map(|(from, to)| {
                        list.range(from..=to)
                            .cloned()
                            .map(RespFrame::BulkString)
                            .collect()
                    })
                })
                .unwrap_or_default();
            RespFrame::Array(items)
        }
        RemoteCommand::LTrim { key, start, stop } => {
            if let Some(list) = lists.get_mut(key) {
                match resolve_range(list.len(), *start, *stop) {
                    Some((from, to)) => {
                        list.truncate(to + 1);
                        list.drain(..from);
                    }
                    None => list.clear(),
                }
                if list.is_empty() {
                    lists.remove(key);
                }
            }
            RespFrame::SimpleString("OK".into())
        }
        RemoteCommand::LPos { key, value, rank } => {
            let rank = rank.unwrap_or(1);
            if rank == 0 {
                return RespFrame::Error("ERR RANK can't be zero".into());
            }
            let Some(list) = lists.get(key) else {
                return RespFrame::Null;
            };
            let wanted = rank.unsigned_abs() as usize;
            let found = if rank > 0 {
                list.iter()
                    .enumerate()
                    .filter(|(_, item)| *item == value)
                    .nth(wanted - 1)
            } else {
                list.iter()
                    .enumerate()
                    .rev()
                    .filter(|(_, item)| *item == value)
                    .nth(wanted - 1)
            };
            found.map_or(RespFrame::Null, |(i, _)| RespFrame::Integer(i as i64))
        }
        RemoteCommand::Del { keys } => {
            let removed = keys.iter().filter(|key| lists.remove(*key).is_some()).count();
            RespFrame::Integer(removed as i64)
        }
        RemoteCommand::LMove {
            source,
            destination,
            from,
            to,
        } => {
            // Pop and push happen under the same lock; with source == destination
            // this rotates the list.
            let Some(value) = pop(lists, source, *from) else {
                return RespFrame::Null;
            };
            let target = lists.entry(destination.clone()).or_default();
            match to {
                Side::Left => target.push_front(value.clone()),
                Side::Right => target.push_back(value.clone()),
            }
            RespFrame::BulkString(value)
        }
        RemoteCommand::BLPop { keys, .. } => keys
            .iter()
            .find_map(|key| {
                pop(lists, key, Side::Left).map(|value| {
                    RespFrame::Array(vec![
                        RespFrame::BulkString(key.clone()),
                        RespFrame::BulkString(value),
                    ])
                })
            })
            .unwrap_or(RespFrame::NullArray),
        RemoteCommand::BLMove {
            source,
            destination,
            from,
            to,
            ..
        } => apply_to(
            lists,
            &RemoteCommand::LMove {
                source: source.clone(),
                destination: destination.clone(),
                from: *from,
                to: *to,
            },
        ),
        RemoteCommand::Ping => RespFrame::SimpleString("PONG".into()),
        RemoteCommand::Auth { .. } | RemoteCommand::Select { .. } => {
            RespFrame::SimpleString("OK".into())
        }
    }
}
