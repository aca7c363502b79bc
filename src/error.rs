//! Error types for daily-gateway.

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// The main error type for daily-gateway.
///
/// `Clone` so a single refresh failure can be handed to every caller that was
/// queued behind it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    // ── Authentication ───────────────────────────────────────────────────────
    /// The server reported an invalid or absent session. Terminal: the session
    /// has been cleared and the user sent to the login page.
    #[error("Not authenticated: {message}")]
    Unauthenticated {
        /// Message carried by the business envelope.
        message: String,
    },

    /// A request that was already replayed after a refresh came back expired again.
    #[error("Session expired again after token refresh")]
    SessionExpired,

    /// The refresh call failed. Terminal: the session has been cleared.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// The refresh episode this request was queued behind was abandoned before
    /// it settled (the leading request was dropped).
    #[error("Token refresh was abandoned before it settled")]
    RefreshAborted,

    // ── API ──────────────────────────────────────────────────────────────────
    /// Transport-level HTTP failure (4xx/5xx).
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message shown to the user.
        message: String,
    },

    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),

    /// Any other rejection from the transport.
    #[error("Request failed: {0}")]
    Other(String),

    /// Response or request body could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(String),

    // ── Storage ──────────────────────────────────────────────────────────────
    /// Storage I/O error.
    #[error("Storage I/O error at {path}: {message}")]
    StorageIo {
        /// Path that caused the error.
        path: PathBuf,
        /// Error description.
        message: String,
    },

    /// Generic storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    // ── Infrastructure ───────────────────────────────────────────────────────
    /// The navigation collaborator could not reach the login page.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a refresh call did not produce a new credential.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RefreshFailure {
    /// There was no credential to present to the refresh endpoint.
    #[error("no credential to refresh")]
    NoCredential,

    /// The refresh endpoint could not be reached or answered with an HTTP error.
    #[error("{0}")]
    Transport(TransportError),

    /// The refresh endpoint answered with a non-success business code.
    #[error("refresh rejected with code {code}: {message}")]
    Rejected {
        /// Business code from the envelope.
        code: i64,
        /// Message from the envelope.
        message: String,
    },

    /// The refresh response was not a `{code, message, data: string}` envelope.
    #[error("malformed refresh response: {0}")]
    Malformed(String),
}

impl Error {
    /// Returns true if this error ended the session and the user must log in again.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated { .. } | Error::SessionExpired | Error::RefreshFailed(_)
        )
    }

    /// Creates a storage I/O error.
    #[must_use]
    pub fn storage_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StorageIo {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Convenience type alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
