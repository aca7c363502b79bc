//! Keyring-based key-value storage.

use tracing::instrument;

use super::KeyValueStorage;
use crate::error::{Error, Result};

/// Storage backed by the system's native credential store.
///
/// Each key becomes one keyring entry under a shared service name.
/// Feature-gated behind `system-keyring`.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStorage {
    /// Default service name for keyring entries.
    const SERVICE_NAME: &'static str = "daily-gateway";

    /// Create a storage using the default service name.
    pub fn new() -> Self {
        Self::with_service(Self::SERVICE_NAME)
    }

    /// Create a storage using a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| Error::Storage(format!("Failed to create keyring entry: {e}")))
    }
}

impl KeyValueStorage for KeyringStorage {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Storage(format!("Keyring error: {e}"))),
        }
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| Error::Storage(format!("Keyring error: {e}")))
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Storage(format!("Keyring error: {e}"))),
        }
    }

    fn name(&self) -> &str {
        "keyring"
    }
}
