//! Storage engine trait definitions

use super::expiry::{Entry, Expiry};
use crate::error::Result;

/// Callback invoked once a background sweep or wipe has finished
pub type Completion = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Trait for the storage engine underneath a [`TieredCache`](super::TieredCache)
///
/// Engines report every failure, including a missing key
/// ([`StoreError::NotFound`](crate::StoreError::NotFound)). Deciding what a
/// failure means to callers is left to the cache.
pub trait StorageEngine<K, V>: Send + Sync {
    /// Read the entry for a key, including its expiration marker
    fn entry(&self, key: &K) -> Result<Entry<V>>;

    /// Read only the value for a key
    fn object(&self, key: &K) -> Result<V> {
        self.entry(key).map(|entry| entry.value)
    }

    /// Store a value. `None` applies the engine's default expiry.
    fn set(&self, value: V, key: &K, expiry: Option<Expiry>) -> Result<()>;

    /// Delete every entry whose expiry has passed
    fn remove_expired(&self) -> Result<()>;

    /// Delete everything
    fn remove_all(&self) -> Result<()>;
}
