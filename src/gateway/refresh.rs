//! Refresh endpoint client.
//!
//! Talks to the transport directly so the refresh call never passes through
//! the gateway's own interceptors.

use std::sync::Arc;

use reqwest::header::HeaderName;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{DEFAULT_REFRESH_PATH, StatusCodes};
use crate::error::{Error, RefreshFailure, Result};
use crate::gateway::interceptor::apply_credential;
use crate::models::credential::Credential;
use crate::models::envelope::envelope_head;
use crate::models::request::RequestDescriptor;
use crate::transport::Transport;

/// Exchanges the current credential for a new one.
pub struct RefreshClient {
    transport: Arc<dyn Transport>,
    header: HeaderName,
    refresh_path: String,
    codes: StatusCodes,
}

impl RefreshClient {
    /// Create a client posting to [`DEFAULT_REFRESH_PATH`].
    pub fn new(transport: Arc<dyn Transport>, header: HeaderName, codes: StatusCodes) -> Self {
        Self {
            transport,
            header,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            codes,
        }
    }

    /// Override the refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// The refresh endpoint path.
    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    /// Issue one refresh call carrying `current`.
    ///
    /// Succeeds only on the success code with a non-empty string `data`.
    /// Without a credential there is nothing to present, so no call is made.
    pub async fn refresh(&self, current: Option<&Credential>) -> Result<Credential> {
        let Some(current) = current.filter(|c| !c.is_empty()) else {
            return Err(Error::RefreshFailed(RefreshFailure::NoCredential));
        };

        let mut request = RequestDescriptor::post(self.refresh_path.as_str())
            .json(&serde_json::json!({}))?;
        apply_credential(&mut request, Some(current), &self.header);

        debug!(
            request_id = %request.id,
            path = self.refresh_path.as_str(),
            transport = self.transport.name(),
            "Refreshing access token"
        );
        let response = self
            .transport
            .send(&request)
            .await
            .map_err(|e| Error::RefreshFailed(RefreshFailure::Transport(e)))?;

        let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
            Error::RefreshFailed(RefreshFailure::Malformed(format!("invalid JSON: {e}")))
        })?;
        let Some((code, message)) = envelope_head(&body) else {
            return Err(Error::RefreshFailed(RefreshFailure::Malformed(
                "missing code/message".to_string(),
            )));
        };
        if code != self.codes.success {
            return Err(Error::RefreshFailed(RefreshFailure::Rejected { code, message }));
        }

        match body.get("data").and_then(Value::as_str) {
            Some(token) if !token.trim().is_empty() => {
                info!("Token refreshed successfully");
                Ok(Credential::new(token))
            }
            _ => Err(Error::RefreshFailed(RefreshFailure::Malformed(
                "data is not a token string".to_string(),
            ))),
        }
    }
}

impl std::fmt::Debug for RefreshClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshClient")
            .field("transport", &self.transport.name())
            .field("header", &self.header)
            .field("refresh_path", &self.refresh_path)
            .finish()
    }
}
