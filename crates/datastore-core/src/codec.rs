//! Record encoding for blobs kept in a secure store

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Converts a record to and from its persisted bytes
pub trait RecordCodec<T>: Send + Sync {
    fn encode(&self, record: &T) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// JSON encoding via serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> RecordCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, record: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| StoreError::CodecError(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::CodecError(e.to_string()))
    }
}
