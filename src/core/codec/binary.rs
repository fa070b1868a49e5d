// src/core/codec/binary.rs

use super::Codec;
use crate::core::CollectionResult;
use bincode::config;
use bytes::Bytes;

/// Stores elements in bincode's standard encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<V> Codec<V> for BincodeCodec
where
    V: bincode::Encode + bincode::Decode<()>,
{
    fn encode(&self, value: &V) -> CollectionResult<Bytes> {
        let encoded = bincode::encode_to_vec(value, config::standard())?;
        Ok(Bytes::from(encoded))
    }

    fn decode(&self, payload: Bytes) -> CollectionResult<V> {
        let (value, _) = bincode::decode_from_slice::<V, _>(&payload, config::standard())?;
        Ok(value)
    }
}
