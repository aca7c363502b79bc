//! HTTP transport abstraction.
//!
//! The gateway never talks to `reqwest` directly: it issues
//! [`RequestDescriptor`]s through a [`Transport`], which lets the refresh call
//! bypass the gateway's interceptors and lets tests script responses.

pub mod http;

use async_trait::async_trait;
use std::fmt;

use crate::models::request::RequestDescriptor;

pub use http::{HttpTransport, HttpTransportBuilder};

/// A response that reached us with a 2xx status.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// `200 OK` with a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            body: value.to_string().into_bytes(),
        }
    }
}

/// A rejected call.
///
/// `network` is set when no response was received at all; otherwise `status`
/// and `body` describe the HTTP failure when there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Response body, when a response was received.
    pub body: Option<String>,
    /// No response was received.
    pub network: bool,
    /// Description of the failure.
    pub message: String,
}

impl TransportError {
    /// A call that never got a response.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            network: true,
            message: message.into(),
        }
    }

    /// A call answered with a non-2xx status.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            network: false,
            message: format!("HTTP status {status}"),
        }
    }

    /// Any other failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            network: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.network {
            write!(f, "network failure: {}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), err.to_string());
        }
        if !err.is_builder() && (err.is_connect() || err.is_timeout() || err.is_request()) {
            Self::network(err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

/// Issues HTTP calls described by a [`RequestDescriptor`].
///
/// Implementations resolve with the response for 2xx statuses and reject with
/// a [`TransportError`] otherwise.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request.
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError>;

    /// Name of this transport, for logs.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &RequestDescriptor) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
