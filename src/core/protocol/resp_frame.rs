// src/core/protocol/resp_frame.rs

//! Implements the RESP (REdis Serialization Protocol) frame structure and the
//! corresponding `Encoder` and `Decoder` used on the client side of a connection.

use crate::core::CollectionError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence used to terminate lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits, identical to the ones the server enforces.
const MAX_FRAME_ELEMENTS: usize = 1_024 * 1_024; // Max elements in an array.
const MAX_BULK_STRING_SIZE: usize = 512 * 1024 * 1024; // 512MB max bulk string size.
const MAX_RECURSION_DEPTH: usize = 256;

/// A single frame in the RESP protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// Builds a bulk string frame from anything convertible into `Bytes`.
    pub fn bulk(value: impl Into<Bytes>) -> Self {
        RespFrame::BulkString(value.into())
    }

    /// A convenience method to encode a frame into a `Vec<u8>`.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, CollectionError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }

    /// A short, human readable rendering used in error messages and logs.
    pub fn describe(&self) -> String {
        match self {
            RespFrame::SimpleString(s) => format!("+{s}"),
            RespFrame::Error(s) => format!("-{s}"),
            RespFrame::Integer(i) => format!(":{i}"),
            RespFrame::BulkString(b) => format!("${} bytes", b.len()),
            RespFrame::Null => "(nil)".to_string(),
            RespFrame::NullArray => "(nil array)".to_string(),
            RespFrame::Array(arr) => format!("array of {}", arr.len()),
        }
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = CollectionError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                dst.extend_from_slice(b":");
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => {
                dst.extend_from_slice(b"$-1\r\n");
            }
            RespFrame::NullArray => {
                dst.extend_from_slice(b"*-1\r\n");
            }
            RespFrame::Array(arr) => {
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(arr.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = CollectionError;

    /// Decodes one frame. Returns `Ok(None)` until the buffer holds a complete frame.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut bytes = &src[..];
        match self.decode_recursive(&mut bytes, 0) {
            Ok(frame) => {
                let len = src.len() - bytes.len();
                src.advance(len);
                Ok(Some(frame))
            }
            Err(CollectionError::IncompleteData) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl RespFrameCodec {
    fn decode_recursive(
        &self,
        bytes: &mut &[u8],
        depth: usize,
    ) -> Result<RespFrame, CollectionError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(CollectionError::Protocol(
                "RESP recursion depth limit exceeded".to_string(),
            ));
        }

        if bytes.is_empty() {
            return Err(CollectionError::IncompleteData);
        }

        match bytes[0] {
            b'+' => self.parse_simple_string(bytes),
            b'-' => self.parse_error(bytes),
            b':' => self.parse_integer(bytes),
            b'$' => self.parse_bulk_string(bytes),
            b'*' => self.parse_array(bytes, depth),
            other => Err(CollectionError::Protocol(format!(
                "unexpected frame prefix byte 0x{other:02x}"
            ))),
        }
    }

    fn parse_line<'a>(&self, bytes: &mut &'a [u8]) -> Result<&'a [u8], CollectionError> {
        if let Some(pos) = find_crlf(bytes) {
            let line = &bytes[..pos];
            *bytes = &bytes[pos + CRLF_LEN..];
            Ok(line)
        } else {
            Err(CollectionError::IncompleteData)
        }
    }

    fn parse_length(&self, line: &[u8]) -> Result<isize, CollectionError> {
        String::from_utf8_lossy(line)
            .parse::<isize>()
            .map_err(|_| CollectionError::Protocol("invalid length prefix".to_string()))
    }

    /// Parses a Simple String (e.g., `+OK\r\n`).
    fn parse_simple_string(&self, bytes: &mut &[u8]) -> Result<RespFrame, CollectionError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        Ok(RespFrame::SimpleString(
            String::from_utf8_lossy(line).to_string(),
        ))
    }

    /// Parses an Error (e.g., `-ERR message\r\n`).
    fn parse_error(&self, bytes: &mut &[u8]) -> Result<RespFrame, CollectionError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        Ok(RespFrame::Error(String::from_utf8_lossy(line).to_string()))
    }

    /// Parses an Integer (e.g., `:1000\r\n`).
    fn parse_integer(&self, bytes: &mut &[u8]) -> Result<RespFrame, CollectionError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let i = String::from_utf8_lossy(line)
            .parse::<i64>()
            .map_err(|_| CollectionError::Protocol("invalid integer frame".to_string()))?;
        Ok(RespFrame::Integer(i))
    }

    /// Parses a Bulk String (e.g., `$5\r\nhello\r\n`).
    fn parse_bulk_string(&self, bytes: &mut &[u8]) -> Result<RespFrame, CollectionError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let str_len = self.parse_length(line)?;

        if str_len == -1 {
            return Ok(RespFrame::Null);
        }
        if str_len < 0 {
            return Err(CollectionError::Protocol("negative bulk length".to_string()));
        }

        let str_len = str_len as usize;
        if str_len > MAX_BULK_STRING_SIZE {
            return Err(CollectionError::Protocol(
                "bulk string exceeds maximum size".to_string(),
            ));
        }

        if bytes.len() < str_len + CRLF_LEN {
            return Err(CollectionError::IncompleteData);
        }

        if &bytes[str_len..str_len + CRLF_LEN] != CRLF {
            return Err(CollectionError::Protocol(
                "bulk string is not terminated by CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&bytes[..str_len]);
        *bytes = &bytes[str_len + CRLF_LEN..];
        Ok(RespFrame::BulkString(data))
    }

    /// Parses an Array (e.g., `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`).
    fn parse_array(&self, bytes: &mut &[u8], depth: usize) -> Result<RespFrame, CollectionError> {
        *bytes = &bytes[1..];
        let line = self.parse_line(bytes)?;
        let arr_len = self.parse_length(line)?;

        if arr_len == -1 {
            return Ok(RespFrame::NullArray);
        }
        if arr_len < 0 {
            return Err(CollectionError::Protocol("negative array length".to_string()));
        }

        let arr_len = arr_len as usize;
        if arr_len > MAX_FRAME_ELEMENTS {
            return Err(CollectionError::Protocol(
                "array exceeds maximum element count".to_string(),
            ));
        }

        let mut frames = Vec::with_capacity(arr_len);
        for _ in 0..arr_len {
            frames.push(self.decode_recursive(bytes, depth + 1)?);
        }
        Ok(RespFrame::Array(frames))
    }
}

fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF_LEN).position(|window| window == CRLF)
}
