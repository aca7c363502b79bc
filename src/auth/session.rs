//! Credential store backed by durable key-value storage.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::credential::Credential;
use crate::storage::{KeyValueStorage, keys};

/// Source and sink of the access token.
///
/// The gateway reads the credential to stamp outgoing requests, writes it
/// after a successful refresh and clears it on terminal auth failures.
pub trait CredentialStore: Send + Sync {
    /// Current credential, if logged in.
    fn get_credential(&self) -> Option<Credential>;

    /// Replace the credential (login or refresh).
    fn set_credential(&self, credential: Credential) -> Result<()>;

    /// Forget the credential, in memory and in durable storage.
    fn clear_credential(&self) -> Result<()>;
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any other profile fields the server sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct SessionState {
    credential: Option<Credential>,
    user: Option<UserInfo>,
}

/// Session state: credential and user profile, written through to storage
/// under [`keys::TOKEN`] and [`keys::USER_INFO`].
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    /// Create an empty session over `storage` without reading it.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            storage,
        }
    }

    /// Create a session restored from whatever `storage` holds.
    ///
    /// An unreadable user profile is dropped rather than failing the restore.
    pub fn restore(storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        let credential = storage
            .get(keys::TOKEN)?
            .map(Credential::from)
            .filter(|c| !c.is_empty());
        let user = match storage.get(keys::USER_INFO)? {
            Some(raw) => match serde_json::from_str::<Option<UserInfo>>(&raw) {
                Ok(user) => user,
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable stored user profile");
                    None
                }
            },
            None => None,
        };
        debug!(
            source = storage.name(),
            authenticated = credential.is_some(),
            "Session restored"
        );
        Ok(Self {
            state: RwLock::new(SessionState { credential, user }),
            storage,
        })
    }

    /// Whether a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }

    /// The logged-in user's profile.
    pub fn user(&self) -> Option<UserInfo> {
        self.read().user.clone()
    }

    /// Store the user's profile (or `None` to forget it).
    pub fn set_user(&self, user: Option<UserInfo>) -> Result<()> {
        let raw = serde_json::to_string(&user)?;
        self.storage.set(keys::USER_INFO, &raw)?;
        self.write().user = user;
        Ok(())
    }

    /// Stored UI locale.
    pub fn locale(&self) -> Result<Option<String>> {
        self.storage.get(keys::LOCALE)
    }

    /// Persist the UI locale.
    pub fn set_locale(&self, locale: &str) -> Result<()> {
        self.storage.set(keys::LOCALE, locale)
    }

    /// Forget credential and user profile. The locale survives.
    pub fn logout(&self) -> Result<()> {
        {
            let mut state = self.write();
            state.credential = None;
            state.user = None;
        }
        self.storage.remove(keys::TOKEN)?;
        self.storage.remove(keys::USER_INFO)?;
        info!("Session cleared");
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for SessionStore {
    fn get_credential(&self) -> Option<Credential> {
        self.read().credential.clone()
    }

    fn set_credential(&self, credential: Credential) -> Result<()> {
        // Memory is updated even when persisting fails.
        self.write().credential = Some(credential.clone());
        self.storage.set(keys::TOKEN, credential.as_str())
    }

    fn clear_credential(&self) -> Result<()> {
        self.logout()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("storage", &self.storage.name())
            .finish()
    }
}
