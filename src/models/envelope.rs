//! The business envelope wrapping every JSON response body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{code, message, data}` wrapper returned by the Daily API.
///
/// `code` is an application status distinct from the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    /// Application status code.
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Payload; absent or `null` for many mutations.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Whether `code` equals the deployment's success code.
    pub fn is_success(&self, success_code: i64) -> bool {
        self.code == success_code
    }
}

/// The code and message of an envelope, if `value` looks like one.
///
/// A body counts as an envelope when it is an object carrying an integer `code`
/// and a `message` key.
pub fn envelope_head(value: &Value) -> Option<(i64, String)> {
    let obj = value.as_object()?;
    let code = obj.get("code")?.as_i64()?;
    let message = obj.get("message")?;
    let message = match message {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Some((code, message))
}
