// src/core/commands/mod.rs

//! The typed set of remote commands the collection adapters issue.
//!
//! Every logical collection operation maps to exactly one `RemoteCommand`
//! (the single exception being `RemoteList::remove_at`, which needs two).
//! A command renders itself as a RESP array of bulk strings, and can be parsed
//! back from one so in-process fakes and proxies can interpret client traffic.

pub mod helpers;
pub mod reply;

use crate::core::CollectionError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;
use helpers::{
    extract_bytes, extract_i64, extract_string, extract_u64, validate_arg_count,
    validate_min_args,
};

pub use reply::AbsentReplyPolicy;

/// Defines the end of a list an element is taken from or pushed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    fn as_arg(self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }

    fn parse(frame: &RespFrame) -> Result<Self, CollectionError> {
        match extract_string(frame)?.to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(CollectionError::InvalidRequest(format!(
                "invalid list side '{other}'"
            ))),
        }
    }
}

/// Where `LINSERT` places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    #[default]
    Before,
    After,
}

/// A single command sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    RPush {
        key: Bytes,
        values: Vec<Bytes>,
    },
    LPush {
        key: Bytes,
        values: Vec<Bytes>,
    },
    LPop {
        key: Bytes,
    },
    LIndex {
        key: Bytes,
        index: i64,
    },
    LSet {
        key: Bytes,
        index: i64,
        value: Bytes,
    },
    LInsert {
        key: Bytes,
        position: InsertPosition,
        pivot: Bytes,
        value: Bytes,
    },
    LRem {
        key: Bytes,
        count: i64,
        value: Bytes,
    },
    LLen {
        key: Bytes,
    },
    LRange {
        key: Bytes,
        start: i64,
        stop: i64,
    },
    LTrim {
        key: Bytes,
        start: i64,
        stop: i64,
    },
    LPos {
        key: Bytes,
        value: Bytes,
        rank: Option<i64>,
    },
    Del {
        keys: Vec<Bytes>,
    },
    /// Atomically pops from one end of `source` and pushes onto one end of
    /// `destination`. `source` and `destination` may be the same key.
    LMove {
        source: Bytes,
        destination: Bytes,
        from: Side,
        to: Side,
    },
    /// `timeout_secs == 0` blocks indefinitely.
    BLPop {
        keys: Vec<Bytes>,
        timeout_secs: u64,
    },
    BLMove {
        source: Bytes,
        destination: Bytes,
        from: Side,
        to: Side,
        timeout_secs: u64,
    },
    Ping,
    Auth {
        username: Option<String>,
        password: String,
    },
    Select {
        db: usize,
    },
}

impl RemoteCommand {
    /// The command name as sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            RemoteCommand::RPush { .. } => "RPUSH",
            RemoteCommand::LPush { .. } => "LPUSH",
            RemoteCommand::LPop { .. } => "LPOP",
            RemoteCommand::LIndex { .. } => "LINDEX",
            RemoteCommand::LSet { .. } => "LSET",
            RemoteCommand::LInsert { .. } => "LINSERT",
            RemoteCommand::LRem { .. } => "LREM",
            RemoteCommand::LLen { .. } => "LLEN",
            RemoteCommand::LRange { .. } => "LRANGE",
            RemoteCommand::LTrim { .. } => "LTRIM",
            RemoteCommand::LPos { .. } => "LPOS",
            RemoteCommand::Del { .. } => "DEL",
            RemoteCommand::LMove { .. } => "LMOVE",
            RemoteCommand::BLPop { .. } => "BLPOP",
            RemoteCommand::BLMove { .. } => "BLMOVE",
            RemoteCommand::Ping => "PING",
            RemoteCommand::Auth { .. } => "AUTH",
            RemoteCommand::Select { .. } => "SELECT",
        }
    }

    /// The keys this command touches, in argument order.
    pub fn keys(&self) -> Vec<Bytes> {
        match self {
            RemoteCommand::RPush { key, .. }
            | RemoteCommand::LPush { key, .. }
            | RemoteCommand::LPop { key }
            | RemoteCommand::LIndex { key, .. }
            | RemoteCommand::LSet { key, .. }
            | RemoteCommand::LInsert { key, .. }
            | RemoteCommand::LRem { key, .. }
            | RemoteCommand::LLen { key }
            | RemoteCommand::LRange { key, .. }
            | RemoteCommand::LTrim { key, .. }
            | RemoteCommand::LPos { key, .. } => vec![key.clone()],
            RemoteCommand::Del { keys } | RemoteCommand::BLPop { keys, .. } => keys.clone(),
            RemoteCommand::LMove {
                source,
                destination,
                ..
            }
            | RemoteCommand::BLMove {
                source,
                destination,
                ..
            } => vec![source.clone(), destination.clone()],
            RemoteCommand::Ping | RemoteCommand::Auth { .. } | RemoteCommand::Select { .. } => {
                vec![]
            }
        }
    }

    /// True if the command may modify store state.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RemoteCommand::LIndex { .. }
                | RemoteCommand::LLen { .. }
                | RemoteCommand::LRange { .. }
                | RemoteCommand::LPos { .. }
                | RemoteCommand::Ping
                | RemoteCommand::Auth { .. }
                | RemoteCommand::Select { .. }
        )
    }

    /// For blocking commands, the server-side wait in seconds (`0` = forever).
    pub fn blocking_timeout(&self) -> Option<u64> {
        match self {
            RemoteCommand::BLPop { timeout_secs, .. }
            | RemoteCommand::BLMove { timeout_secs, .. } => Some(*timeout_secs),
            _ => None,
        }
    }

    /// The arguments following the command name.
    pub fn to_resp_args(&self) -> Vec<Bytes> {
        match self {
            RemoteCommand::RPush { key, values } | RemoteCommand::LPush { key, values } => {
                let mut args = Vec::with_capacity(values.len() + 1);
                args.push(key.clone());
                args.extend(values.iter().cloned());
                args
            }
            RemoteCommand::LPop { key } | RemoteCommand::LLen { key } => vec![key.clone()],
            RemoteCommand::LIndex { key, index } => {
                vec![key.clone(), index.to_string().into()]
            }
            RemoteCommand::LSet { key, index, value } => {
                vec![key.clone(), index.to_string().into(), value.clone()]
            }
            RemoteCommand::LInsert {
                key,
                position,
                pivot,
                value,
            } => vec![
                key.clone(),
                (if *position == InsertPosition::Before {
                    "BEFORE"
                } else {
                    "AFTER"
                })
                .into(),
                pivot.clone(),
                value.clone(),
            ],
            RemoteCommand::LRem { key, count, value } => {
                vec![key.clone(), count.to_string().into(), value.clone()]
            }
            RemoteCommand::LRange { key, start, stop }
            | RemoteCommand::LTrim { key, start, stop } => {
                vec![key.clone(), start.to_string().into(), stop.to_string().into()]
            }
            RemoteCommand::LPos { key, value, rank } => {
                let mut args = vec![key.clone(), value.clone()];
                if let Some(rank) = rank {
                    args.push("RANK".into());
                    args.push(rank.to_string().into());
                }
                args
            }
            RemoteCommand::Del { keys } => keys.clone(),
            RemoteCommand::LMove {
                source,
                destination,
                from,
                to,
            } => vec![
                source.clone(),
                destination.clone(),
                from.as_arg().into(),
                to.as_arg().into(),
            ],
            RemoteCommand::BLPop { keys, timeout_secs } => {
                let mut args = keys.clone();
                args.push(timeout_secs.to_string().into());
                args
            }
            RemoteCommand::BLMove {
                source,
                destination,
                from,
                to,
                timeout_secs,
            } => vec![
                source.clone(),
                destination.clone(),
                from.as_arg().into(),
                to.as_arg().into(),
                timeout_secs.to_string().into(),
            ],
            RemoteCommand::Ping => vec![],
            RemoteCommand::Auth { username, password } => {
                let mut args = Vec::with_capacity(2);
                if let Some(user) = username {
                    args.push(Bytes::from(user.clone()));
                }
                args.push(Bytes::from(password.clone()));
                args
            }
            RemoteCommand::Select { db } => vec![db.to_string().into()],
        }
    }

    /// Renders the command as the RESP array a client sends.
    pub fn to_frame(&self) -> RespFrame {
        let mut frames = Vec::with_capacity(1 + self.to_resp_args().len());
        frames.push(RespFrame::bulk(self.name()));
        frames.extend(self.to_resp_args().into_iter().map(RespFrame::BulkString));
        RespFrame::Array(frames)
    }

    /// Parses a client request frame back into a command.
    pub fn parse(frame: &RespFrame) -> Result<Self, CollectionError> {
        let RespFrame::Array(parts) = frame else {
            return Err(CollectionError::InvalidRequest(
                "command must be a RESP array".into(),
            ));
        };
        let Some((name, args)) = parts.split_first() else {
            return Err(CollectionError::InvalidRequest("empty command".into()));
        };
        let name = extract_string(name)?.to_ascii_uppercase();

        let command = match name.as_str() {
            "RPUSH" | "LPUSH" => {
                validate_min_args(args, 2, &name)?;
                let key = extract_bytes(&args[0])?;
                let values = args[1..]
                    .iter()
                    .map(extract_bytes)
                    .collect::<Result<Vec<_>, _>>()?;
                if name == "RPUSH" {
                    RemoteCommand::RPush { key, values }
                } else {
                    RemoteCommand::LPush { key, values }
                }
            }
            "LPOP" => {
                validate_arg_count(args, 1, &name)?;
                RemoteCommand::LPop {
                    key: extract_bytes(&args[0])?,
                }
            }
            "LINDEX" => {
                validate_arg_count(args, 2, &name)?;
                RemoteCommand::LIndex {
                    key: extract_bytes(&args[0])?,
                    index: extract_i64(&args[1])?,
                }
            }
            "LSET" => {
                validate_arg_count(args, 3, &name)?;
                RemoteCommand::LSet {
                    key: extract_bytes(&args[0])?,
                    index: extract_i64(&args[1])?,
                    value: extract_bytes(&args[2])?,
                }
            }
            "LINSERT" => {
                validate_arg_count(args, 4, &name)?;
                let position = match extract_string(&args[1])?.to_ascii_lowercase().as_str() {
                    "before" => InsertPosition::Before,
                    "after" => InsertPosition::After,
                    other => {
                        return Err(CollectionError::InvalidRequest(format!(
                            "invalid LINSERT position '{other}'"
                        )));
                    }
                };
                RemoteCommand::LInsert {
                    key: extract_bytes(&args[0])?,
                    position,
                    pivot: extract_bytes(&args[2])?,
                    value: extract_bytes(&args[3])?,
                }
            }
            "LREM" => {
                validate_arg_count(args, 3, &name)?;
                RemoteCommand::LRem {
                    key: extract_bytes(&args[0])?,
                    count: extract_i64(&args[1])?,
                    value: extract_bytes(&args[2])?,
                }
            }
            "LLEN" => {
                validate_arg_count(args, 1, &name)?;
                RemoteCommand::LLen {
                    key: extract_bytes(&args[0])?,
                }
            }
            "LRANGE" | "LTRIM" => {
                validate_arg_count(args, 3, &name)?;
                let key = extract_bytes(&args[0])?;
                let start = extract_i64(&args[1])?;
                let stop = extract_i64(&args[2])?;
                if name == "LRANGE" {
                    RemoteCommand::LRange { key, start, stop }
                } else {
                    RemoteCommand::LTrim { key, start, stop }
                }
            }
            "LPOS" => {
                let rank = match args.len() {
                    2 => None,
                    4 if extract_string(&args[2])?.eq_ignore_ascii_case("rank") => {
                        Some(extract_i64(&args[3])?)
                    }
                    _ => {
                        return Err(CollectionError::InvalidRequest(
                            "unsupported LPOS arguments".into(),
                        ));
                    }
                };
                RemoteCommand::LPos {
                    key: extract_bytes(&args[0])?,
                    value: extract_bytes(&args[1])?,
                    rank,
                }
            }
            "DEL" => {
                validate_min_args(args, 1, &name)?;
                RemoteCommand::Del {
                    keys: args
                        .iter()
                        .map(extract_bytes)
                        .collect::<Result<Vec<_>, _>>()?,
                }
            }
            "LMOVE" => {
                validate_arg_count(args, 4, &name)?;
                RemoteCommand::LMove {
                    source: extract_bytes(&args[0])?,
                    destination: extract_bytes(&args[1])?,
                    from: Side::parse(&args[2])?,
                    to: Side::parse(&args[3])?,
                }
            }
            // The legacy single-purpose form of `LMOVE source destination RIGHT LEFT`.
            "RPOPLPUSH" => {
                validate_arg_count(args, 2, &name)?;
                RemoteCommand::LMove {
                    source: extract_bytes(&args[0])?,
                    destination: extract_bytes(&args[1])?,
                    from: Side::Right,
                    to: Side::Left,
                }
            }
            "BLPOP" => {
                validate_min_args(args, 2, &name)?;
                let (timeout, keys) = args.split_last().ok_or_else(|| {
                    CollectionError::InvalidRequest("BLPOP requires a timeout".into())
                })?;
                RemoteCommand::BLPop {
                    keys: keys
                        .iter()
                        .map(extract_bytes)
                        .collect::<Result<Vec<_>, _>>()?,
                    timeout_secs: extract_u64(timeout)?,
                }
            }
            "BLMOVE" => {
                validate_arg_count(args, 5, &name)?;
                RemoteCommand::BLMove {
                    source: extract_bytes(&args[0])?,
                    destination: extract_bytes(&args[1])?,
                    from: Side::parse(&args[2])?,
                    to: Side::parse(&args[3])?,
                    timeout_secs: extract_u64(&args[4])?,
                }
            }
            "PING" => RemoteCommand::Ping,
            "AUTH" => match args.len() {
                1 => RemoteCommand::Auth {
                    username: None,
                    password: extract_string(&args[0])?,
                },
                2 => RemoteCommand::Auth {
                    username: Some(extract_string(&args[0])?),
                    password: extract_string(&args[1])?,
                },
                _ => {
                    return Err(CollectionError::InvalidRequest(
                        "wrong number of arguments for 'AUTH' command".into(),
                    ));
                }
            },
            "SELECT" => {
                validate_arg_count(args, 1, &name)?;
                RemoteCommand::Select {
                    db: extract_u64(&args[0])? as usize,
                }
            }
            other => {
                return Err(CollectionError::InvalidRequest(format!(
                    "unknown command '{other}'"
                )));
            }
        };
        Ok(command)
    }
}
