//! In-memory cache tier
//!
//! Backed by a bounded `moka` cache. Expiry is tracked per entry rather than
//! through moka's time-to-live, so expired values stay readable until they
//! are swept.

use moka::sync::Cache;
use std::hash::Hash;
use tracing::debug;

use super::expiry::{Entry, Expiry};
use super::traits::StorageEngine;
use crate::error::{Result, StoreError};

/// Memory tier configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    /// Default expiry for entries written without an explicit one
    pub expiry: Expiry,
    /// Maximum number of entries held in memory (0 = unlimited)
    pub count_limit: u64,
}

/// Memory tier
pub struct MemoryStorage<K, V> {
    cache: Cache<K, Entry<V>>,
    config: MemoryConfig,
}

impl<K, V> MemoryStorage<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new memory tier
    pub fn new(config: MemoryConfig) -> Self {
        let mut builder = Cache::<K, Entry<V>>::builder();
        if config.count_limit > 0 {
            builder = builder.max_capacity(config.count_limit);
        }

        Self {
            cache: builder.build(),
            config,
        }
    }

    /// Get the tier configuration
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of entries held, after pending evictions are applied
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a value with an already resolved deadline
    pub(crate) fn insert_entry(&self, key: K, entry: Entry<V>) {
        self.cache.insert(key, entry);
    }
}

impl<K, V> StorageEngine<K, V> for MemoryStorage<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn entry(&self, key: &K) -> Result<Entry<V>> {
        self.cache.get(key).ok_or(StoreError::NotFound)
    }

    fn set(&self, value: V, key: &K, expiry: Option<Expiry>) -> Result<()> {
        let expires_at = expiry.unwrap_or(self.config.expiry).deadline();
        self.insert_entry(key.clone(), Entry::new(value, expires_at));
        Ok(())
    }

    fn remove_expired(&self) -> Result<()> {
        let expired: Vec<_> = self
            .cache
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            self.cache.invalidate(&**key);
        }

        debug!("Removed {} expired entries from memory", expired.len());
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        self.cache.invalidate_all();
        debug!("Cleared memory tier");
        Ok(())
    }
}
