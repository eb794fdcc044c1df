//! Memory tier in front of a disk tier

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;

use super::disk::{DiskConfig, DiskStorage};
use super::expiry::{Entry, Expiry};
use super::memory::{MemoryConfig, MemoryStorage};
use super::traits::StorageEngine;
use crate::error::Result;

/// Two-tier storage engine
///
/// Reads prefer memory and fall back to disk, promoting disk hits into memory
/// with their original deadline. Writes land on disk first; memory is only
/// updated once the disk write succeeded.
pub struct HybridStorage<K, V> {
    memory: MemoryStorage<K, V>,
    disk: DiskStorage<K, V>,
}

impl<K, V> HybridStorage<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(memory: MemoryStorage<K, V>, disk: DiskStorage<K, V>) -> Self {
        Self { memory, disk }
    }

    /// Build both tiers from their configurations
    pub fn open(memory_config: MemoryConfig, disk_config: DiskConfig) -> Result<Self> {
        Ok(Self::new(
            MemoryStorage::new(memory_config),
            DiskStorage::new(disk_config)?,
        ))
    }

    pub fn memory(&self) -> &MemoryStorage<K, V> {
        &self.memory
    }

    pub fn disk(&self) -> &DiskStorage<K, V> {
        &self.disk
    }
}

impl<K, V> StorageEngine<K, V> for HybridStorage<K, V>
where
    K: Serialize + Hash + Eq + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn entry(&self, key: &K) -> Result<Entry<V>> {
        if let Ok(entry) = self.memory.entry(key) {
            return Ok(entry);
        }

        let entry = self.disk.entry(key)?;
        self.memory.insert_entry(key.clone(), entry.clone());
        Ok(entry)
    }

    fn set(&self, value: V, key: &K, expiry: Option<Expiry>) -> Result<()> {
        self.disk.set(value.clone(), key, expiry)?;
        self.memory.set(value, key, expiry)
    }

    fn remove_expired(&self) -> Result<()> {
        self.memory.remove_expired()?;
        self.disk.remove_expired()
    }

    fn remove_all(&self) -> Result<()> {
        self.memory.remove_all()?;
        self.disk.remove_all()
    }
}
