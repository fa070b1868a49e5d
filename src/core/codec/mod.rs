// src/core/codec/mod.rs

//! The value (de)serialization boundary between local elements and the
//! payloads stored in remote lists.

mod binary;
mod json;

pub use binary::BincodeCodec;
pub use json::JsonCodec;

use crate::core::{CollectionError, CollectionResult};
use bytes::Bytes;

/// Encodes elements into payloads and decodes payloads back into elements.
///
/// Implementations must be deterministic: equal values encode to equal bytes,
/// because `LREM`, `LPOS` and `LINSERT` match elements by payload.
pub trait Codec<V>: Send + Sync + 'static {
    fn encode(&self, value: &V) -> CollectionResult<Bytes>;
    fn decode(&self, payload: Bytes) -> CollectionResult<V>;
}

/// Stores strings as their UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(&self, value: &String) -> CollectionResult<Bytes> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, payload: Bytes) -> CollectionResult<String> {
        Ok(String::from_utf8(payload.to_vec())?)
    }
}

/// Passes raw payloads through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Bytes> for BytesCodec {
    fn encode(&self, value: &Bytes) -> CollectionResult<Bytes> {
        Ok(value.clone())
    }

    fn decode(&self, payload: Bytes) -> CollectionResult<Bytes> {
        Ok(payload)
    }
}

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> CollectionResult<Bytes> {
        Ok(Bytes::copy_from_slice(value))
    }

    fn decode(&self, payload: Bytes) -> CollectionResult<Vec<u8>> {
        Ok(payload.to_vec())
    }
}

/// Decodes an optional payload, keeping "absent" distinct from a decode fault.
pub(crate) fn decode_optional<V, C: Codec<V>>(
    codec: &C,
    payload: Option<Bytes>,
) -> CollectionResult<Option<V>> {
    payload.map(|bytes| codec.decode(bytes)).transpose()
}

/// Decodes every payload, failing on the first bad one.
pub(crate) fn decode_all<V, C: Codec<V>>(
    codec: &C,
    payloads: Vec<Bytes>,
) -> CollectionResult<Vec<V>> {
    payloads
        .into_iter()
        .map(|bytes| codec.decode(bytes))
        .collect()
}

/// Encodes a batch of values for a multi-value command.
pub(crate) fn encode_all<'a, V: 'a, C: Codec<V>>(
    codec: &C,
    values: impl IntoIterator<Item = &'a V>,
) -> CollectionResult<Vec<Bytes>> {
    let encoded = values
        .into_iter()
        .map(|value| codec.encode(value))
        .collect::<CollectionResult<Vec<_>>>()?;
    if encoded.is_empty() {
        return Err(CollectionError::InvalidRequest(
            "at least one value is required".into(),
        ));
    }
    Ok(encoded)
}
