//! OS Keychain secure store
//!
//! Uses the system keychain for secure storage:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use keyring::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::SecureStore;
use crate::error::{Result, StoreError};

/// Default service name used for keychain entries
pub const DEFAULT_SERVICE_NAME: &str = "com.local-datastores.keychain";

/// OS Keychain secure store
///
/// Keychain entries are opened once per key and reused for the lifetime of
/// the store. All access goes through one lock.
pub struct KeychainStore {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeychainStore {
    /// Create a keychain store for a service name
    pub fn new(service: &str) -> Self {
        debug!("Keychain store using service: {}", service);

        Self {
            service: service.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the service name entries are stored under
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Run `f` against the (cached) keychain entry for a key
    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&Entry) -> Result<T>) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::KeychainError("Keychain handle lock poisoned".to_string()))?;

        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key).map_err(keychain_error)?;
            entries.insert(key.to_string(), entry);
        }

        match entries.get(key) {
            Some(entry) => f(entry),
            None => Err(StoreError::KeychainError(format!("No keychain entry for {}", key))),
        }
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl SecureStore for KeychainStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(encoded) => {
                let decoded = base64_decode(&encoded)?;
                debug!("Retrieved key from keychain: {}", key);
                Ok(Some(decoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(keychain_error(e)),
        })
    }

    fn set(&self, key: &str, value: Option<&[u8]>) -> Result<()> {
        let value = match value {
            Some(value) => value,
            None => return self.delete(key),
        };

        self.with_entry(key, |entry| {
            // Keychain stores strings
            entry
                .set_password(&base64_encode(value))
                .map_err(keychain_error)?;
            debug!("Stored key in keychain: {}", key);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.with_entry(key, |entry| match entry.delete_password() {
            Ok(()) => {
                debug!("Deleted key from keychain: {}", key);
                Ok(())
            }
            // Key doesn't exist, that's fine
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keychain_error(e)),
        })
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

fn keychain_error(e: keyring::Error) -> StoreError {
    StoreError::KeychainError(e.to_string())
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| StoreError::KeychainError(format!("Base64 decode error: {}", e)))
}
