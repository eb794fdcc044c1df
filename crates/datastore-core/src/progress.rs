//! Watch progress per video, stored on disk with a memory-backed cache

use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use crate::cache::{DiskConfig, Expiry, MemoryConfig, TieredCache};
use crate::error::Result;
use crate::settings::ProgressSettings;

/// How often a playback controller should save progress while a video plays.
/// Advisory only; nothing here schedules saves.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(10);

const NAMESPACE_PREFIX: &str = "progress";

/// Last saved playback position, in seconds, per video
pub struct ProgressStore {
    cache: TieredCache<String, f64>,
}

impl ProgressStore {
    /// Open the progress store for a user under `root`.
    ///
    /// Progress never expires. Stores opened for the same user share one disk
    /// namespace.
    pub(crate) fn for_user(user_id: &str, root: &Path, settings: &ProgressSettings) -> Result<Self> {
        let memory = MemoryConfig {
            expiry: Expiry::Never,
            count_limit: settings.memory_count_limit,
        };
        let disk = DiskConfig {
            name: Self::namespace(user_id),
            expiry: Expiry::Never,
            max_size: settings.disk_max_size_bytes,
            directory: Some(root.to_path_buf()),
        };

        Ok(Self::with_cache(TieredCache::open(memory, disk)?))
    }

    /// Build on top of an existing cache
    pub(crate) fn with_cache(cache: TieredCache<String, f64>) -> Self {
        Self { cache }
    }

    /// Disk namespace for a user id
    pub fn namespace(user_id: &str) -> String {
        format!(
            "{}.{}",
            NAMESPACE_PREFIX,
            hex::encode(Sha256::digest(user_id.as_bytes()))
        )
    }

    /// Last saved progress for a video
    pub fn get_progress(&self, video_id: &str) -> Option<f64> {
        self.cache.read(&video_id.to_string())
    }

    /// Save progress for a video, replacing any previous value.
    /// Values are stored as given, without range checks.
    pub fn set_progress(&self, video_id: &str, progress: f64) {
        self.cache.write(progress, &video_id.to_string(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::RecordingEngine;
    use crate::cache::Entry;
    use std::sync::Arc;
    use tempfile::TempDir;

    const VIDEO_KEY: &str = "VideoKey";
    const PROGRESS_VALUE: f64 = 10.0;

    fn mocked() -> (Arc<RecordingEngine<f64>>, ProgressStore) {
        let engine = Arc::new(RecordingEngine::new());
        let cache: TieredCache<String, f64> = TieredCache::new(engine.clone());
        (engine, ProgressStore::with_cache(cache))
    }

    #[test]
    fn test_get_progress() {
        let (engine, store) = mocked();
        engine.seed(VIDEO_KEY, Entry::new(PROGRESS_VALUE, None));

        let result = store.get_progress(VIDEO_KEY);

        assert_eq!(result, Some(PROGRESS_VALUE));
        assert_eq!(engine.reads(), vec![VIDEO_KEY.to_string()]);
    }

    #[test]
    fn test_get_progress_not_found() {
        let (engine, store) = mocked();

        let result = store.get_progress(VIDEO_KEY);

        assert_eq!(result, None);
        assert_eq!(engine.reads(), vec![VIDEO_KEY.to_string()]);
    }

    #[test]
    fn test_set_progress() {
        let (engine, store) = mocked();

        store.set_progress(VIDEO_KEY, PROGRESS_VALUE);

        assert_eq!(
            engine.writes(),
            vec![(VIDEO_KEY.to_string(), PROGRESS_VALUE, None)]
        );
    }

    #[test]
    fn test_negative_progress_is_stored() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            ProgressStore::for_user("U1", temp_dir.path(), &ProgressSettings::default()).unwrap();

        store.set_progress("abc", -3.0);

        assert_eq!(store.get_progress("abc"), Some(-3.0));
    }

    #[test]
    fn test_progress_is_isolated_per_user() {
        let temp_dir = TempDir::new().unwrap();
        let settings = ProgressSettings::default();

        let first = ProgressStore::for_user("U1", temp_dir.path(), &settings).unwrap();
        first.set_progress("abc", 10.0);
        assert_eq!(first.get_progress("abc"), Some(10.0));

        let second = ProgressStore::for_user("U2", temp_dir.path(), &settings).unwrap();
        assert_eq!(second.get_progress("abc"), None);

        // Same user, fresh instance: shared namespace on disk
        let again = ProgressStore::for_user("U1", temp_dir.path(), &settings).unwrap();
        assert_eq!(again.get_progress("abc"), Some(10.0));
    }

    #[test]
    fn test_latest_save_wins() {
        let temp_dir = TempDir::new().unwrap();
        let store =
            ProgressStore::for_user("U1", temp_dir.path(), &ProgressSettings::default()).unwrap();

        store.set_progress("abc", 10.0);
        store.set_progress("abc", 20.0);

        assert_eq!(store.get_progress("abc"), Some(20.0));
    }

    #[test]
    fn test_namespace_is_path_safe() {
        let namespace = ProgressStore::namespace("../../etc/passwd");

        assert!(namespace.starts_with("progress."));
        assert!(!namespace.contains('/'));
        assert_ne!(namespace, ProgressStore::namespace("other"));
    }
}
