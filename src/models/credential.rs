//! Bearer credential.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication scheme prefixed to the credential in the auth header.
pub const BEARER_SCHEME: &str = "Bearer";

/// An opaque access token.
///
/// Immutable: a refresh produces a new `Credential`, it never mutates one.
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty token is treated the same as no token at all.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Header value: `Bearer <token>`.
    pub fn bearer(&self) -> String {
        format!("{BEARER_SCHEME} {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_format() {
        assert_eq!(Credential::new("abc").bearer(), "Bearer abc");
    }

    #[test]
    fn test_debug_redacts() {
        let rendered = format!("{:?}", Credential::new("super-secret-token"));
        assert_eq!(rendered, "Credential(***)");
        // Short tokens must not leak either.
        assert_eq!(format!("{:?}", Credential::new("T1")), "Credential(***)");
        assert_eq!(format!("{:?}", Some(Credential::new("abc"))), "Some(Credential(***))");
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(Credential::new("").is_empty());
        assert!(Credential::new("   ").is_empty());
        assert!(!Credential::new("t").is_empty());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Credential::new("t1")).unwrap();
        assert_eq!(json, "\"t1\"");
        let back: Credential = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "t1");
    }
}
