//! Failure-containing cache facade
//!
//! A cold cache is always a valid state, so nothing below this type is
//! allowed to reach callers: read failures look like misses, write failures
//! are dropped, and both are logged once here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use super::disk::DiskConfig;
use super::expiry::Expiry;
use super::hybrid::HybridStorage;
use super::memory::MemoryConfig;
use super::traits::{Completion, StorageEngine};
use crate::error::Result;

/// Generic key-value cache over a memory tier and a disk tier
pub struct TieredCache<K, V> {
    engine: Arc<dyn StorageEngine<K, V>>,
}

impl<K, V> Clone for TieredCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<K, V> TieredCache<K, V>
where
    K: Serialize + Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open a memory + disk cache
    ///
    /// Construction is the one place an error is reported, since there is no
    /// cache to degrade to yet.
    pub fn open(memory: MemoryConfig, disk: DiskConfig) -> Result<Self> {
        let engine = HybridStorage::open(memory, disk)?;
        debug!("Opened tiered cache at {:?}", engine.disk().path());
        Ok(Self::new(Arc::new(engine)))
    }
}

impl<K, V> TieredCache<K, V>
where
    K: Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Wrap an existing engine
    pub fn new(engine: Arc<dyn StorageEngine<K, V>>) -> Self {
        Self { engine }
    }

    /// Read the value for a key.
    ///
    /// Returns `None` on a miss, on a value that fails to decode, and on any
    /// storage error. Expired values are still returned until swept.
    pub fn read(&self, key: &K) -> Option<V> {
        match self.engine.object(key) {
            Ok(value) => Some(value),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                debug!("Unable to read object for key {:?}. Error {}", key, e);
                None
            }
        }
    }

    /// Write a value for a key, fire-and-forget.
    ///
    /// `expiry` overrides the configured default for this entry only.
    pub fn write(&self, value: V, key: &K, expiry: Option<Expiry>) {
        if let Err(e) = self.engine.set(value, key, expiry) {
            info!("Unable to write object for key {:?}. Error {}", key, e);
        }
    }

    /// Whether the key needs a refresh: missing, unreadable, or past its expiry
    pub fn is_expired(&self, key: &K) -> bool {
        match self.engine.entry(key) {
            Ok(entry) => entry.is_expired(),
            Err(e) if e.is_not_found() => true,
            Err(e) => {
                info!(
                    "Unable to check if object is expired for key {:?}. Error {}",
                    key, e
                );
                true
            }
        }
    }

    /// Delete expired entries in the background
    pub fn remove_expired(&self, on_complete: Option<Completion>) {
        self.dispatch("remove_expired", |engine| engine.remove_expired(), on_complete);
    }

    /// Delete every entry in the background
    pub fn remove_all(&self, on_complete: Option<Completion>) {
        self.dispatch("remove_all", |engine| engine.remove_all(), on_complete);
    }

    /// Run `task` off the caller's thread: on the blocking pool of the
    /// current tokio runtime, or on a dedicated thread outside of one.
    fn dispatch<F>(&self, operation: &'static str, task: F, on_complete: Option<Completion>)
    where
        F: FnOnce(&dyn StorageEngine<K, V>) -> Result<()> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);

        let job = move || {
            let result = task(&*engine);
            match &result {
                Ok(()) => debug!("Cache {} completed", operation),
                Err(e) => warn!("Cache {} failed: {}", operation, e),
            }
            if let Some(on_complete) = on_complete {
                on_complete(result);
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name(format!("cache-{}", operation))
                    .spawn(job);
                if let Err(e) = spawned {
                    error!("Unable to start cache {}: {}", operation, e);
                }
            }
        }
    }
}
