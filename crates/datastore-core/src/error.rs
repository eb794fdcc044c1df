//! Error types for datastore-core

use thiserror::Error;

/// Result type alias for datastore operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Datastore error types
///
/// These never leave the cache or user store boundaries: those log the error
/// once and report absence instead.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Entry not found")]
    NotFound,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Codec error: {0}")]
    CodecError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error just means the key has no entry
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound => true,
            StoreError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
