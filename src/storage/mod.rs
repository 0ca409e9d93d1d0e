//! Persisted key-value storage for client-side state.
//!
//! The waitlist keeps two values across runs: the cached count record and the
//! success flag. Both live behind [`KeyValueStore`] so callers can swap the
//! on-disk store for an in-memory one in tests.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// String-keyed storage with per-key atomic reads and writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}
