//! Typed calls to the Daily journal API.
//!
//! Thin wrappers over [`Gateway::execute`]: each builds a request, sends it
//! through the gateway (so credentials and refresh are handled there) and
//! interprets the `{code, message, data}` envelope.

mod docs;
mod items;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::gateway::{Gateway, GatewayResponse};
use crate::models::envelope::ApiResponse;
use crate::models::request::RequestDescriptor;

/// Client for the journal endpoints.
#[derive(Debug, Clone)]
pub struct DailyApi {
    gateway: Arc<Gateway>,
}

impl DailyApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let request = RequestDescriptor::post(path).json(body)?;
        self.envelope(request).await
    }

    async fn envelope(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let response: GatewayResponse = self.gateway.execute(request).await?;
        response.envelope()
    }

    /// `data` as a list, or empty when it is not an array.
    fn list<T: DeserializeOwned>(path: &str, envelope: ApiResponse) -> Result<Vec<T>> {
        match envelope.data {
            Some(data @ Value::Array(_)) => Ok(serde_json::from_value(data)?),
            other => {
                debug!(path, data = ?other, "Expected a list; returning empty");
                Ok(Vec::new())
            }
        }
    }

    /// Whether the envelope carries the success code.
    fn succeeded(&self, envelope: &ApiResponse) -> bool {
        envelope.is_success(self.gateway.status_codes().success)
    }

    /// Whether `data` is literally `true`.
    fn confirmed(envelope: &ApiResponse) -> bool {
        matches!(envelope.data, Some(Value::Bool(true)))
    }
}
