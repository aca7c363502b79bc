//! Durable key-value storage for session state.
//!
//! Provides the [`KeyValueStorage`] trait and implementations:
//! - [`FileStorage`] - single JSON file with 0600 permissions
//! - [`MemoryStorage`] - in-memory (testing)
//! - [`KeyringStorage`] - system keyring (feature-gated)

mod file;
pub mod keys;
mod memory;

#[cfg(feature = "system-keyring")]
mod keyring;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[cfg(feature = "system-keyring")]
pub use keyring::KeyringStorage;

use crate::error::Result;

/// Trait for key-value storage backends.
///
/// All storage implementations must be thread-safe (`Send + Sync`). Keys come
/// from [`keys`]; values are opaque strings (JSON where structured).
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }
}

// Blanket implementation for Arc<T>
impl<T: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

// Blanket implementation for Box<T>
impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
