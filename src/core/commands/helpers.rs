// src/core/commands/helpers.rs

//! Provides helper functions for parsing command arguments from `RespFrame`s.

use crate::core::CollectionError;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Extracts a `String` from a `RespFrame::BulkString`.
pub fn extract_string(frame: &RespFrame) -> Result<String, CollectionError> {
    if let RespFrame::BulkString(bs) = frame {
        String::from_utf8(bs.to_vec())
            .map_err(|_| CollectionError::InvalidRequest("argument is not valid UTF-8".into()))
    } else {
        Err(CollectionError::InvalidRequest(format!(
            "expected a bulk string argument, got {}",
            frame.describe()
        )))
    }
}

/// Extracts `Bytes` from a `RespFrame::BulkString`.
pub fn extract_bytes(frame: &RespFrame) -> Result<Bytes, CollectionError> {
    match frame {
        RespFrame::BulkString(bs) => Ok(bs.clone()),
        other => Err(CollectionError::InvalidRequest(format!(
            "expected a bulk string argument, got {}",
            other.describe()
        ))),
    }
}

/// Extracts a signed integer argument sent as a bulk string.
pub fn extract_i64(frame: &RespFrame) -> Result<i64, CollectionError> {
    extract_string(frame)?
        .parse()
        .map_err(|_| CollectionError::InvalidRequest("value is not an integer".into()))
}

/// Extracts an unsigned integer argument sent as a bulk string.
pub fn extract_u64(frame: &RespFrame) -> Result<u64, CollectionError> {
    extract_string(frame)?
        .parse()
        .map_err(|_| CollectionError::InvalidRequest("value is not an integer".into()))
}

/// Validates that the number of arguments matches an exact expected count.
pub fn validate_arg_count(
    args: &[RespFrame],
    expected: usize,
    cmd: &str,
) -> Result<(), CollectionError> {
    if args.len() != expected {
        Err(CollectionError::InvalidRequest(format!(
            "wrong number of arguments for '{cmd}' command"
        )))
    } else {
        Ok(())
    }
}

/// Validates that at least `min` arguments are present.
pub fn validate_min_args(args: &[RespFrame], min: usize, cmd: &str) -> Result<(), CollectionError> {
    if args.len() < min {
        Err(CollectionError::InvalidRequest(format!(
            "wrong number of arguments for '{cmd}' command"
        )))
    } else {
        Ok(())
    }
}
