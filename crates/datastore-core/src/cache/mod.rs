//! Tiered key-value cache
//!
//! A memory tier in front of a durable disk tier, with per-store expiry
//! defaults and per-entry overrides. [`TieredCache`] is the boundary: every
//! storage failure below it becomes a cache miss.

mod disk;
mod expiry;
mod hybrid;
mod memory;
mod tiered;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use disk::{default_cache_dir, DiskConfig, DiskStorage};
pub use expiry::{Entry, Expiry};
pub use hybrid::HybridStorage;
pub use memory::{MemoryConfig, MemoryStorage};
pub use tiered::TieredCache;
pub use traits::{Completion, StorageEngine};
