//! Secure stores for small secret records
//!
//! This module provides two backends behind [`SecureStore`]:
//! 1. OS Keychain
//! 2. In-memory (tests, hosts without a keychain)

mod keychain;
mod memory;
mod traits;

pub use keychain::{KeychainStore, DEFAULT_SERVICE_NAME};
pub use memory::MemorySecureStore;
pub use traits::SecureStore;
