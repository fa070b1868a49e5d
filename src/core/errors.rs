// src/core/errors.rs

//! Defines the error type shared by the collection adapters, the executor and
//! every gateway.

use std::sync::Arc;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Every failure a collection operation can surface.
///
/// An empty collection is never represented here, except through `NoSuchElement`
/// for the operations whose contract demands a fault on empty.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An error reply sent back by the store.
    #[error("Server error: {0}")]
    Server(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("Index out of range")]
    IndexOutOfRange,

    #[error("Unexpected reply to '{command}': {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("No such element")]
    NoSuchElement,

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Command runtime has shut down")]
    RuntimeShutdown,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CollectionError {
    /// Classifies an error reply from the store.
    pub fn from_server_reply(message: &str) -> Self {
        if message.starts_with("WRONGTYPE") {
            CollectionError::WrongType
        } else if message.to_ascii_lowercase().contains("index out of range") {
            CollectionError::IndexOutOfRange
        } else {
            CollectionError::Server(message.to_string())
        }
    }

    /// True for faults caused by the transport rather than by the command itself.
    /// Gateways drop their connection when they see one of these.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CollectionError::Io(_)
                | CollectionError::Protocol(_)
                | CollectionError::ConnectionClosed
                | CollectionError::Timeout(_)
        )
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for CollectionError {
    fn clone(&self) -> Self {
        match self {
            CollectionError::Io(e) => CollectionError::Io(Arc::clone(e)),
            CollectionError::IncompleteData => CollectionError::IncompleteData,
            CollectionError::Protocol(s) => CollectionError::Protocol(s.clone()),
            CollectionError::Server(s) => CollectionError::Server(s.clone()),
            CollectionError::WrongType => CollectionError::WrongType,
            CollectionError::IndexOutOfRange => CollectionError::IndexOutOfRange,
            CollectionError::UnexpectedReply { command, reply } => {
                CollectionError::UnexpectedReply {
                    command: command.clone(),
                    reply: reply.clone(),
                }
            }
            CollectionError::Codec(s) => CollectionError::Codec(s.clone()),
            CollectionError::NoSuchElement => CollectionError::NoSuchElement,
            CollectionError::Timeout(s) => CollectionError::Timeout(s.clone()),
            CollectionError::ConnectionClosed => CollectionError::ConnectionClosed,
            CollectionError::RuntimeShutdown => CollectionError::RuntimeShutdown,
            CollectionError::InvalidRequest(s) => CollectionError::InvalidRequest(s.clone()),
            CollectionError::Internal(s) => CollectionError::Internal(s.clone()),
        }
    }
}

impl PartialEq for CollectionError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CollectionError::Io(e1), CollectionError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CollectionError::Protocol(s1), CollectionError::Protocol(s2)) => s1 == s2,
            (CollectionError::Server(s1), CollectionError::Server(s2)) => s1 == s2,
            (
                CollectionError::UnexpectedReply {
                    command: c1,
                    reply: r1,
                },
                CollectionError::UnexpectedReply {
                    command: c2,
                    reply: r2,
                },
            ) => c1 == c2 && r1 == r2,
            (CollectionError::Codec(s1), CollectionError::Codec(s2)) => s1 == s2,
            (CollectionError::Timeout(s1), CollectionError::Timeout(s2)) => s1 == s2,
            (CollectionError::InvalidRequest(s1), CollectionError::InvalidRequest(s2)) => s1 == s2,
            (CollectionError::Internal(s1), CollectionError::Internal(s2)) => s1 == s2,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for CollectionError {
    fn from(e: std::io::Error) -> Self {
        CollectionError::Io(Arc::new(e))
    }
}

impl From<std::string::FromUtf8Error> for CollectionError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        CollectionError::Codec(format!("invalid UTF-8 payload: {e}"))
    }
}

impl From<serde_json::Error> for CollectionError {
    fn from(e: serde_json::Error) -> Self {
        CollectionError::Codec(format!("JSON serialization/deserialization error: {e}"))
    }
}

impl From<bincode::error::EncodeError> for CollectionError {
    fn from(e: bincode::error::EncodeError) -> Self {
        CollectionError::Codec(format!("bincode encode error: {e}"))
    }
}

impl From<bincode::error::DecodeError> for CollectionError {
    fn from(e: bincode::error::DecodeError) -> Self {
        CollectionError::Codec(format!("bincode decode error: {e}"))
    }
}

impl From<tokio::time::error::Elapsed> for CollectionError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CollectionError::Timeout("reply".to_string())
    }
}
