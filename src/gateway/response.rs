//! Successful gateway responses.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::models::envelope::ApiResponse;
use crate::models::request::ResponseType;
use crate::transport::TransportResponse;

/// A response that made it through classification.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
    /// How the request asked for the body to be read.
    pub response_type: ResponseType,
}

impl GatewayResponse {
    pub(crate) fn from_transport(response: TransportResponse, response_type: ResponseType) -> Self {
        Self {
            status: response.status,
            body: response.body,
            response_type,
        }
    }

    /// Decode the body as a `{code, message, data}` envelope.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<ApiResponse<T>> {
        self.json()
    }

    /// Decode the body as arbitrary JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone())
            .map_err(|e| Error::Other(format!("response body is not UTF-8: {e}")))
    }

    /// The raw body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning the raw body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}
