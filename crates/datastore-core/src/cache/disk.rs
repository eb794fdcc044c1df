//! On-disk cache tier
//!
//! Each entry is stored as its own JSON file inside a namespace directory.
//! File names are the hex SHA-256 of the serialized key, so arbitrary keys map
//! to safe, fixed-length names. Writes go through a temp file and a rename.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

use super::expiry::{is_past, Entry, Expiry};
use super::traits::StorageEngine;
use crate::error::{Result, StoreError};

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

/// Disk tier configuration
#[derive(Debug, Clone)]
pub struct DiskConfig {
    /// Namespace directory name, a single path component
    pub name: String,
    /// Default expiry for entries written without an explicit one
    pub expiry: Expiry,
    /// Maximum total size of the namespace in bytes (0 = unlimited)
    pub max_size: u64,
    /// Parent directory of the namespace (defaults to the platform cache dir)
    pub directory: Option<PathBuf>,
}

impl DiskConfig {
    /// Never-expiring, unbounded namespace in the default cache directory
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expiry: Expiry::Never,
            max_size: 0,
            directory: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordRef<'a, V> {
    expires_at: Option<DateTime<Utc>>,
    value: &'a V,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record<V> {
    expires_at: Option<DateTime<Utc>>,
    value: V,
}

/// Only the expiration marker, so sweeps never decode values
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    expires_at: Option<DateTime<Utc>>,
}

struct StoredFile {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Disk tier
pub struct DiskStorage<K, V> {
    /// Namespace directory
    path: PathBuf,
    config: DiskConfig,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DiskStorage<K, V> {
    /// Create the namespace directory if needed and open it
    pub fn new(config: DiskConfig) -> Result<Self> {
        validate_name(&config.name)?;

        let root = match &config.directory {
            Some(directory) => directory.clone(),
            None => default_cache_dir()?,
        };
        let path = root.join(&config.name);
        fs::create_dir_all(&path)?;

        debug!("Disk storage initialized at: {:?}", path);

        Ok(Self {
            path,
            config,
            _marker: PhantomData,
        })
    }

    /// Get the namespace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the tier configuration
    pub fn config(&self) -> &DiskConfig {
        &self.config
    }

    /// Total size in bytes of all entries in the namespace
    pub fn total_size(&self) -> Result<u64> {
        Ok(self.stored_files()?.iter().map(|file| file.size).sum())
    }

    fn stored_files(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();

        for dir_entry in fs::read_dir(&self.path)? {
            let dir_entry = dir_entry?;
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }

            let metadata = dir_entry.metadata()?;
            files.push(StoredFile {
                path,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        Ok(files)
    }

    /// Drop the oldest entries until the namespace is at most half its limit
    fn enforce_size_limit(&self) -> Result<()> {
        let max_size = self.config.max_size;
        let mut files = self.stored_files()?;
        let mut total: u64 = files.iter().map(|file| file.size).sum();

        if total <= max_size {
            return Ok(());
        }

        let target = max_size / 2;
        files.sort_by_key(|file| file.modified);

        let mut removed = 0;
        for file in files {
            if total <= target {
                break;
            }
            remove_file_if_exists(&file.path)?;
            total = total.saturating_sub(file.size);
            removed += 1;
        }

        debug!(
            "Evicted {} entries from {:?} to respect size limit of {} bytes",
            removed, self.path, max_size
        );
        Ok(())
    }
}

impl<K: Serialize, V> DiskStorage<K, V> {
    fn file_path(&self, key: &K) -> Result<PathBuf> {
        let key_bytes = serde_json::to_vec(key)?;
        let digest = Sha256::digest(&key_bytes);
        Ok(self
            .path
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION)))
    }
}

impl<K, V> StorageEngine<K, V> for DiskStorage<K, V>
where
    K: Serialize,
    V: Serialize + DeserializeOwned,
{
    fn entry(&self, key: &K) -> Result<Entry<V>> {
        let path = self.file_path(key)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let record: Record<V> = serde_json::from_slice(&bytes)?;
        Ok(Entry::new(record.value, record.expires_at))
    }

    fn set(&self, value: V, key: &K, expiry: Option<Expiry>) -> Result<()> {
        let expires_at = expiry.unwrap_or(self.config.expiry).deadline();

        // Serialize before touching the file system so a bad value leaves
        // the previous entry in place
        let contents = serde_json::to_vec(&RecordRef {
            expires_at,
            value: &value,
        })?;

        let path = self.file_path(key)?;
        let temp_path = path.with_extension(TEMP_EXTENSION);

        if let Err(e) = fs::write(&temp_path, &contents).and_then(|_| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        // The entry is committed at this point; eviction trouble must not
        // turn the write into a failure
        if self.config.max_size > 0 {
            if let Err(e) = self.enforce_size_limit() {
                warn!("Failed to enforce size limit on {:?}: {}", self.path, e);
            }
        }

        Ok(())
    }

    fn remove_expired(&self) -> Result<()> {
        let mut removed = 0;

        for file in self.stored_files()? {
            let header = fs::read(&file.path)
                .map_err(StoreError::from)
                .and_then(|bytes| Ok(serde_json::from_slice::<RecordHeader>(&bytes)?));

            match header {
                Ok(header) if is_past(header.expires_at) => {
                    remove_file_if_exists(&file.path)?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable cache file {:?}: {}", file.path, e),
            }
        }

        debug!("Removed {} expired entries from {:?}", removed, self.path);
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.path)?;

        debug!("Cleared disk storage at {:?}", self.path);
        Ok(())
    }
}

/// Get the default parent directory for cache namespaces
pub fn default_cache_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "local-datastores", "datastores")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .ok_or_else(|| StoreError::StorageError("Could not determine cache directory".to_string()))
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(&['/', '\\'][..]) {
        return Err(StoreError::ConfigError(format!(
            "Invalid disk storage name: {:?}",
            name
        )));
    }
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
