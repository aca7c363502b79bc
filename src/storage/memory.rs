//! In-memory key-value storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::KeyValueStorage;
use crate::error::Result;

/// In-memory storage.
///
/// Clones share the same map, so a test can hand one clone to the session
/// store and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;

    #[test]
    fn test_memory_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());

        storage.set(keys::TOKEN, "t1").unwrap();
        assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("t1"));

        storage.remove(keys::TOKEN).unwrap();
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        storage.remove(keys::TOKEN).unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let a = MemoryStorage::with_entries([(keys::LOCALE, "en-US")]);
        let b = a.clone();
        b.set(keys::TOKEN, "t").unwrap();
        assert_eq!(a.len(), 2);
    }
}
