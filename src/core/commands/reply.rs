// src/core/commands/reply.rs

//! Interprets reply frames. Error frames are turned into faults by the executor
//! before these helpers run, so anything unexpected here is a shape mismatch.

use crate::core::protocol::RespFrame;
use crate::core::{CollectionError, CollectionResult};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Decides which replies mean "no element" for a read or pop.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AbsentReplyPolicy {
    /// Only a null reply means absent. An empty payload is a present element.
    #[default]
    NullOnly,
    /// Null and empty bulk strings both mean absent, for stores that report a
    /// missing element as an empty string.
    NullOrEmpty,
}

impl AbsentReplyPolicy {
    fn payload(self, bytes: Bytes) -> Option<Bytes> {
        match self {
            AbsentReplyPolicy::NullOrEmpty if bytes.is_empty() => None,
            _ => Some(bytes),
        }
    }
}

fn unexpected(command: &str, frame: &RespFrame) -> CollectionError {
    CollectionError::UnexpectedReply {
        command: command.to_string(),
        reply: frame.describe(),
    }
}

/// Expects a `+OK` style status reply.
pub fn expect_ok(command: &str, frame: RespFrame) -> CollectionResult<()> {
    match frame {
        RespFrame::SimpleString(_) => Ok(()),
        other => Err(unexpected(command, &other)),
    }
}

/// Expects an integer reply.
pub fn expect_integer(command: &str, frame: RespFrame) -> CollectionResult<i64> {
    match frame {
        RespFrame::Integer(i) => Ok(i),
        other => Err(unexpected(command, &other)),
    }
}

/// Expects an integer reply that may be null (e.g. `LPOS` with no match).
pub fn expect_optional_integer(command: &str, frame: RespFrame) -> CollectionResult<Option<i64>> {
    match frame {
        RespFrame::Integer(i) => Ok(Some(i)),
        RespFrame::Null | RespFrame::NullArray => Ok(None),
        other => Err(unexpected(command, &other)),
    }
}

/// Expects a single payload or the store's "not found" signal.
pub fn expect_optional_bulk(
    command: &str,
    frame: RespFrame,
    policy: AbsentReplyPolicy,
) -> CollectionResult<Option<Bytes>> {
    match frame {
        RespFrame::BulkString(bytes) => Ok(policy.payload(bytes)),
        RespFrame::SimpleString(s) => Ok(policy.payload(Bytes::from(s))),
        RespFrame::Null | RespFrame::NullArray => Ok(None),
        other => Err(unexpected(command, &other)),
    }
}

/// Expects an array of payloads, as returned by `LRANGE`.
pub fn expect_bulk_array(command: &str, frame: RespFrame) -> CollectionResult<Vec<Bytes>> {
    match frame {
        RespFrame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                RespFrame::BulkString(bytes) => Ok(bytes),
                other => Err(unexpected(command, &other)),
            })
            .collect(),
        RespFrame::NullArray => Ok(Vec::new()),
        other => Err(unexpected(command, &other)),
    }
}

/// Expects the `[key, value]` pair of a blocking pop, or a null on timeout.
pub fn expect_keyed_pop(
    command: &str,
    frame: RespFrame,
    policy: AbsentReplyPolicy,
) -> CollectionResult<Option<Bytes>> {
    match frame {
        RespFrame::Array(mut items) if items.len() == 2 => match items.pop() {
            Some(RespFrame::BulkString(bytes)) => Ok(policy.payload(bytes)),
            Some(other) => Err(unexpected(command, &other)),
            None => Err(CollectionError::Internal("keyed pop lost its value".into())),
        },
        RespFrame::Null | RespFrame::NullArray => Ok(None),
        other => Err(unexpected(command, &other)),
    }
}

/// Turns an error reply into a fault and passes every other frame through.
pub fn reject_error(frame: RespFrame) -> CollectionResult<RespFrame> {
    match frame {
        RespFrame::Error(message) => Err(CollectionError::from_server_reply(&message)),
        other => Ok(other),
    }
}
