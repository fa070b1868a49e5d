// src/core/codec/json.rs

use super::Codec;
use crate::core::CollectionResult;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Stores elements as JSON documents.
///
/// A JSON `null` payload is a present element: with `V = Option<T>` it decodes
/// to `Some(None)`, which callers see distinctly from an absent element.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> Codec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &V) -> CollectionResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, payload: Bytes) -> CollectionResult<V> {
        Ok(serde_json::from_slice(&payload)?)
    }
}
