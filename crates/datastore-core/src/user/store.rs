//! Keychain-backed store for the logged-in user

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::types::UserProfile;
use crate::codec::{JsonCodec, RecordCodec};
use crate::error::Result;
use crate::progress::ProgressStore;
use crate::settings::{ProgressSettings, Settings};
use crate::storage::{KeychainStore, SecureStore};

/// Secure store key the user record lives under
pub const USER_STORE_KEY: &str = "UserStoreKey";

/// Access to the logged-in user
pub trait UserStore: Send + Sync {
    /// The saved user, or `None` when nobody is logged in
    fn get_user(&self) -> Option<UserProfile>;

    /// A progress store for the saved user, or `None` when nobody is logged in
    fn get_progress_store(&self) -> Option<ProgressStore>;

    /// Save the user on login
    fn set_user(&self, user: &UserProfile);

    /// Remove the saved user on logout
    fn remove_user(&self);

    fn is_logged_in(&self) -> bool {
        self.get_user().is_some()
    }
}

/// User store over a [`SecureStore`]
///
/// Holds exactly zero or one user under [`USER_STORE_KEY`]. Every failure is
/// logged and reported as "not logged in" or ignored; nothing is returned to
/// the caller as an error.
pub struct CredentialStore {
    secure: Arc<dyn SecureStore>,
    codec: Arc<dyn RecordCodec<UserProfile>>,
    /// Parent directory of per-user progress namespaces
    progress_root: PathBuf,
    progress_settings: ProgressSettings,
}

impl CredentialStore {
    pub fn new(
        secure: Arc<dyn SecureStore>,
        codec: Arc<dyn RecordCodec<UserProfile>>,
        progress_root: PathBuf,
        progress_settings: ProgressSettings,
    ) -> Self {
        Self {
            secure,
            codec,
            progress_root,
            progress_settings,
        }
    }

    /// Wire up the OS keychain and JSON encoding from settings
    pub fn open(settings: &Settings) -> Result<Self> {
        let secure = Arc::new(KeychainStore::new(&settings.keychain_service));
        Self::with_secure_store(secure, settings)
    }

    /// JSON encoding over the given secure store, progress layout from settings
    pub fn with_secure_store(secure: Arc<dyn SecureStore>, settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            secure,
            Arc::new(JsonCodec),
            settings.cache_root()?,
            settings.progress.clone(),
        ))
    }

    /// Name of the secure store backend in use
    pub fn backend_name(&self) -> &'static str {
        self.secure.backend_name()
    }
}

impl UserStore for CredentialStore {
    fn get_user(&self) -> Option<UserProfile> {
        let data = match self.secure.get(USER_STORE_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!("User is not logged in");
                return None;
            }
            Err(e) => {
                error!("Failed to read user from secure store: {}", e);
                return None;
            }
        };

        match self.codec.decode(&data) {
            Ok(user) => Some(user),
            Err(e) => {
                error!("Failed to decode user from secure store: {}", e);
                None
            }
        }
    }

    fn get_progress_store(&self) -> Option<ProgressStore> {
        let user = self.get_user()?;

        match ProgressStore::for_user(&user.id, &self.progress_root, &self.progress_settings) {
            Ok(store) => Some(store),
            Err(e) => {
                error!("Failed to open progress store for user {}: {}", user.id, e);
                None
            }
        }
    }

    fn set_user(&self, user: &UserProfile) {
        // Encode first: a user that cannot be encoded must not replace the
        // one already saved
        let data = match self.codec.encode(user) {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to encode user {}: {}", user.id, e);
                return;
            }
        };

        match self.secure.set(USER_STORE_KEY, Some(&data)) {
            Ok(()) => debug!("Saved user {}", user.id),
            Err(e) => error!("Failed to save user to secure store: {}", e),
        }
    }

    fn remove_user(&self) {
        match self.secure.delete(USER_STORE_KEY) {
            Ok(()) => info!("Removed saved user"),
            Err(e) => error!("Failed to remove user from secure store: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::storage::MemorySecureStore;
    use crate::user::ImageDescriptor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// JSON codec that can be told to fail
    #[derive(Default)]
    struct SwitchableCodec {
        fail_encode: AtomicBool,
        fail_decode: AtomicBool,
    }

    impl RecordCodec<UserProfile> for SwitchableCodec {
        fn encode(&self, record: &UserProfile) -> Result<Vec<u8>> {
            if self.fail_encode.load(Ordering::SeqCst) {
                return Err(StoreError::CodecError("Icon is not encodable".to_string()));
            }
            JsonCodec.encode(record)
        }

        fn decode(&self, bytes: &[u8]) -> Result<UserProfile> {
            if self.fail_decode.load(Ordering::SeqCst) {
                return Err(StoreError::CodecError("Data isn't good".to_string()));
            }
            JsonCodec.decode(bytes)
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        secure: Arc<MemorySecureStore>,
        codec: Arc<SwitchableCodec>,
        subject: CredentialStore,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let secure = Arc::new(MemorySecureStore::new());
        let codec = Arc::new(SwitchableCodec::default());
        let subject = CredentialStore::new(
            secure.clone(),
            codec.clone(),
            temp_dir.path().to_path_buf(),
            ProgressSettings::default(),
        );

        Fixture {
            _temp_dir: temp_dir,
            secure,
            codec,
            subject,
        }
    }

    fn user(id: &str) -> UserProfile {
        let mut image = ImageDescriptor::new(720, 480, "fakeUrl");
        image.child_images.push(ImageDescriptor::new(250, 250, "fakeUrl/250"));
        UserProfile::new(id, "username", image)
    }

    #[test]
    fn test_get_user() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));

        let result = f.subject.get_user();

        assert_eq!(result, Some(user("UserId")));
        assert_eq!(f.secure.get_call_count(), 1);
    }

    #[test]
    fn test_get_user_nil_data() {
        let f = fixture();

        assert_eq!(f.subject.get_user(), None);
        assert!(!f.subject.is_logged_in());
        assert_eq!(f.secure.get_call_count(), 2);
    }

    #[test]
    fn test_get_user_invalid_data() {
        let f = fixture();
        f.secure.set(USER_STORE_KEY, Some(b"not a user")).unwrap();

        assert_eq!(f.subject.get_user(), None);
        assert_eq!(f.secure.get_call_count(), 1);
    }

    #[test]
    fn test_get_user_decode_failure() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));
        f.codec.fail_decode.store(true, Ordering::SeqCst);

        assert_eq!(f.subject.get_user(), None);
    }

    #[test]
    fn test_get_user_secure_store_failure() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));
        f.secure.set_failing(true);

        assert_eq!(f.subject.get_user(), None);
    }

    #[test]
    fn test_get_progress_store() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));

        assert!(f.subject.get_progress_store().is_some());
    }

    #[test]
    fn test_get_progress_store_not_logged_in() {
        let f = fixture();

        assert!(f.subject.get_progress_store().is_none());
    }

    #[test]
    fn test_get_progress_store_invalid_user_data() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));
        f.codec.fail_decode.store(true, Ordering::SeqCst);

        assert!(f.subject.get_progress_store().is_none());
    }

    #[test]
    fn test_set_user() {
        let f = fixture();

        f.subject.set_user(&user("UserId"));

        assert_eq!(f.secure.set_call_count(), 1);
        assert!(f.subject.is_logged_in());
    }

    #[test]
    fn test_set_user_unable_to_encode() {
        let f = fixture();
        f.subject.set_user(&user("First"));
        f.codec.fail_encode.store(true, Ordering::SeqCst);

        f.subject.set_user(&user("Second"));

        assert_eq!(f.secure.set_call_count(), 1);
        assert_eq!(f.subject.get_user(), Some(user("First")));
    }

    #[test]
    fn test_set_user_replaces_previous() {
        let f = fixture();

        f.subject.set_user(&user("First"));
        f.subject.set_user(&user("Second"));

        assert_eq!(f.subject.get_user(), Some(user("Second")));
    }

    #[test]
    fn test_remove_user() {
        let f = fixture();
        f.subject.set_user(&user("UserId"));

        f.subject.remove_user();

        assert_eq!(f.secure.delete_call_count(), 1);
        assert_eq!(f.subject.get_user(), None);
        assert!(f.subject.get_progress_store().is_none());
    }

    #[test]
    fn test_remove_user_when_logged_out() {
        let f = fixture();

        f.subject.remove_user();
        f.subject.remove_user();

        assert_eq!(f.secure.delete_call_count(), 2);
        assert_eq!(f.subject.get_user(), None);
    }

    #[test]
    fn test_progress_follows_logged_in_user() {
        let f = fixture();

        f.subject.set_user(&user("U1"));
        let first = f.subject.get_progress_store().unwrap();
        first.set_progress("abc", 10.0);
        assert_eq!(first.get_progress("abc"), Some(10.0));

        f.subject.set_user(&user("U2"));
        let second = f.subject.get_progress_store().unwrap();
        assert_eq!(second.get_progress("abc"), None);

        f.subject.set_user(&user("U1"));
        let back = f.subject.get_progress_store().unwrap();
        assert_eq!(back.get_progress("abc"), Some(10.0));
    }

    #[test]
    fn test_open_uses_keychain() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Settings::default()
        };

        let subject = CredentialStore::open(&settings).unwrap();

        assert_ne!(subject.backend_name(), "In-Memory Secure Store");
        assert_eq!(subject.progress_root, temp_dir.path());
        assert_eq!(subject.get_user(), None);
    }

    #[test]
    fn test_with_secure_store_uses_settings() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Settings::default()
        };
        settings.progress.memory_count_limit = 50;

        let subject =
            CredentialStore::with_secure_store(Arc::new(MemorySecureStore::new()), &settings)
                .unwrap();
        subject.set_user(&user("UserId"));

        assert_eq!(subject.progress_settings, settings.progress);
        assert_eq!(subject.get_user(), Some(user("UserId")));
    }

    #[test]
    fn test_backend_name() {
        let f = fixture();

        assert_eq!(f.subject.backend_name(), "In-Memory Secure Store");
    }
}
