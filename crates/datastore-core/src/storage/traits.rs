//! Secure store trait definitions

use crate::error::Result;

/// Trait for OS-protected secret stores holding opaque blobs
///
/// Implementations are pure pass-through: no caching, no expiry, and no
/// interpretation of the bytes they hold.
pub trait SecureStore: Send + Sync {
    /// Retrieve the blob stored under a key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a blob under a key. `None` removes the key.
    fn set(&self, key: &str, value: Option<&[u8]>) -> Result<()>;

    /// Remove the blob stored under a key. Missing keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Get a human-readable name for this backend
    fn backend_name(&self) -> &'static str;
}
