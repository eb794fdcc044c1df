//! Datastore settings management
//!
//! Stores non-sensitive configuration in a plain JSON file next to the data
//! it configures.

use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cache::default_cache_dir;
use crate::error::{Result, StoreError};
use crate::storage::DEFAULT_SERVICE_NAME;

const SETTINGS_FILE: &str = "settings.json";

/// Watch progress storage limits
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressSettings {
    /// Entries held in memory per store (0 = unlimited)
    pub memory_count_limit: u64,
    /// Bytes on disk per user (0 = unlimited)
    pub disk_max_size_bytes: u64,
}

/// Preferred video playback quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityLevel {
    #[serde(rename = "360p")]
    Ql360p,
    #[serde(rename = "480p")]
    Ql480p,
    #[serde(rename = "720p")]
    Ql720p,
    #[serde(rename = "1080p")]
    Ql1080p,
    #[serde(rename = "2160p")]
    Ql2160p,
}

impl QualityLevel {
    /// Level used when nothing valid has been saved
    pub const fn default_level() -> Self {
        QualityLevel::Ql720p
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        Self::default_level()
    }
}

/// Unknown or mistyped levels fall back to the default instead of failing
/// the whole settings file
fn deserialize_quality_level<'de, D>(deserializer: D) -> std::result::Result<QualityLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(QualityLevel::deserialize(&value).unwrap_or_else(|e| {
        warn!("Invalid quality level {}, using default: {}", value, e);
        QualityLevel::default_level()
    }))
}

/// Datastore settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Keychain service name the user record is stored under
    pub keychain_service: String,
    /// Parent directory for cache namespaces (platform cache dir if unset)
    pub cache_dir: Option<PathBuf>,
    /// Watch progress storage
    pub progress: ProgressSettings,
    /// Preferred playback quality
    #[serde(deserialize_with = "deserialize_quality_level")]
    pub quality_level: QualityLevel,
    /// Creator shown first when the app opens
    pub first_creator_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            keychain_service: DEFAULT_SERVICE_NAME.to_string(),
            cache_dir: None,
            progress: ProgressSettings::default(),
            quality_level: QualityLevel::default_level(),
            first_creator_id: None,
        }
    }
}

impl Settings {
    /// Get the effective parent directory for cache namespaces
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }
}

/// Get the default data directory holding the settings file
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "local-datastores", "datastores")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| StoreError::ConfigError("Could not determine data directory".to_string()))
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a settings manager, loading `settings.json` from `storage_dir`
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join(SETTINGS_FILE);
        let settings = Self::load_from_file(&settings_file).unwrap_or_else(|e| {
            warn!("Unable to load settings from {:?}, using defaults: {}", settings_file, e);
            Settings::default()
        });

        Self {
            settings_file,
            settings,
        }
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        self.settings = settings;
        self.save().await
    }

    pub fn quality_level(&self) -> QualityLevel {
        self.settings.quality_level
    }

    /// Set the preferred quality level and save
    pub async fn set_quality_level(&mut self, level: QualityLevel) -> Result<()> {
        self.settings.quality_level = level;
        self.save().await
    }

    pub fn first_creator_id(&self) -> Option<&str> {
        self.settings.first_creator_id.as_deref()
    }

    /// Set or clear the first creator and save
    pub async fn set_first_creator_id(&mut self, creator_id: Option<String>) -> Result<()> {
        self.settings.first_creator_id = creator_id;
        self.save().await
    }

    /// Reset settings to defaults and delete settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file)
                .await
                .map_err(|e| StoreError::StorageError(e.to_string()))?;
        }

        Ok(())
    }
}
