//! `reqwest`-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use url::Url;

use super::{Transport, TransportError, TransportResponse};
use crate::config::{ApiConfig, CONNECT_TIMEOUT, REQUEST_TIMEOUT, USER_AGENT};
use crate::error::{Error, Result};
use crate::models::request::{RequestBody, RequestDescriptor, ResponseType};

/// HTTP transport for the Daily API.
///
/// Paths in request descriptors are resolved against the base URL; the base
/// URL's own path prefix is preserved.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport with default timeouts.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a transport from the `[api]` config section.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::builder()
            .base_url(&config.base_url)
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .request_timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
    }

    /// Create a new builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<TransportResponse, TransportError> {
        let url = self.url_for(&request.path);
        debug!(
            request_id = %request.id,
            method = %request.method,
            url = url.as_str(),
            "Sending request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.response_type == ResponseType::Json && !request.headers.contains_key(ACCEPT) {
            builder = builder.header(ACCEPT, HeaderValue::from_static("application/json"));
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes { content_type, data } => {
                builder.header(CONTENT_TYPE, content_type.as_str()).body(data.clone())
            }
        };

        let response = builder.send().await.map_err(|e| {
            warn!(request_id = %request.id, error = %e, "Request failed before a response");
            TransportError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

        if !status.is_success() {
            debug!(request_id = %request.id, status = status.as_u16(), "Non-success status");
            return Err(TransportError::status(
                status.as_u16(),
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Builder for [`HttpTransport`].
pub struct HttpTransportBuilder {
    builder: ClientBuilder,
    client: Option<Client>,
    base_url: Option<String>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            builder: Client::builder()
                .user_agent(USER_AGENT)
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT),
            client: None,
            base_url: None,
        }
    }
}

impl HttpTransportBuilder {
    /// Set the API base URL, e.g. `https://daily.example.com`.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.builder = self.builder.user_agent(ua);
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.connect_timeout(timeout);
        self
    }

    /// Set request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.timeout(timeout);
        self
    }

    /// Use a pre-built `reqwest` client (useful for testing or custom TLS config).
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::Config("API base URL is required".into()))?;
        let base_url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("Invalid API base URL '{raw}': {e}")))?;

        let client = match self.client {
            Some(client) => client,
            None => match self.builder.build() {
                Ok(c) => c,
                Err(e) => {
                    warn!("Failed to build HTTP client with custom config: {}; using defaults", e);
                    Client::default()
                }
            },
        };
        Ok(HttpTransport { client, base_url })
    }
}
