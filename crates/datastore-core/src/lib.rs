//! # datastore-core
//!
//! On-device persistence for a client application:
//! - Tiered memory + disk key-value cache with expiry and background sweeps
//! - Keychain-backed store for the logged-in user's profile
//! - Per-user watch progress built on the tiered cache
//!
//! Storage failures never reach callers. The worst case is a cache that
//! behaves as if empty, or a user that appears logged out.

pub mod cache;
pub mod codec;
pub mod error;
pub mod progress;
pub mod settings;
pub mod storage;
pub mod user;
mod datastores;

pub use cache::{Completion, DiskConfig, Entry, Expiry, MemoryConfig, StorageEngine, TieredCache};
pub use codec::{JsonCodec, RecordCodec};
pub use datastores::DataStores;
pub use error::{Result, StoreError};
pub use progress::{ProgressStore, UPDATE_INTERVAL};
pub use settings::{ProgressSettings, QualityLevel, Settings, SettingsManager};
pub use storage::{KeychainStore, MemorySecureStore, SecureStore};
pub use user::{CredentialStore, ImageDescriptor, UserProfile, UserStore, USER_STORE_KEY};
