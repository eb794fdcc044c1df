//! Composition root for the datastores

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::settings::{default_data_dir, Settings, SettingsManager};
use crate::storage::SecureStore;
use crate::user::{CredentialStore, UserStore};

/// Owns the one live user store of the process.
///
/// The application builds this once at startup and hands out
/// [`users`](Self::users) to whatever needs the logged-in user.
pub struct DataStores {
    data_dir: PathBuf,
    settings_manager: SettingsManager,
    users: Arc<CredentialStore>,
}

impl DataStores {
    /// Open with the platform data directory and the OS keychain
    pub fn open() -> Result<Self> {
        let data_dir = default_data_dir()?;
        let settings_manager = SettingsManager::new(&data_dir);
        let users = CredentialStore::open(settings_manager.get())?;

        Ok(Self::assemble(data_dir, settings_manager, users))
    }

    /// Open with a custom data directory and secure store (for testing)
    pub fn with_dir(data_dir: &Path, secure: Arc<dyn SecureStore>) -> Result<Self> {
        let settings_manager = SettingsManager::new(data_dir);
        let users = CredentialStore::with_secure_store(secure, settings_manager.get())?;

        Ok(Self::assemble(data_dir.to_path_buf(), settings_manager, users))
    }

    fn assemble(
        data_dir: PathBuf,
        settings_manager: SettingsManager,
        users: CredentialStore,
    ) -> Self {
        let users = Arc::new(users);

        info!(
            "Datastores opened at {:?} using {}",
            data_dir,
            users.backend_name()
        );

        Self {
            data_dir,
            settings_manager,
            users,
        }
    }

    /// The user store
    pub fn users(&self) -> Arc<dyn UserStore> {
        self.users.clone()
    }

    /// Current settings
    pub fn settings(&self) -> &Settings {
        self.settings_manager.get()
    }

    /// Directory holding the settings file
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
