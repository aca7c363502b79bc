//! Response classification.

use crate::config::StatusCodes;
use crate::models::envelope::envelope_head;
use crate::models::request::ResponseType;
use crate::transport::{TransportError, TransportResponse};

/// What the gateway should do with a transport result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Hand the response to the caller.
    Ok,
    /// Invalid or absent session: clear it and send the user to log in.
    Unauthenticated { message: String },
    /// Stale access token: refresh and replay.
    SessionExpired,
    /// 4xx/5xx from the transport.
    Http { status: u16, message: String },
    /// No response received.
    Network { message: String },
    /// Any other rejection.
    Other { message: String },
}

/// Classify a transport result.
///
/// Successful responses are inspected for the `{code, message, data}`
/// envelope; only the unauthenticated and session-expired codes change the
/// outcome. Byte responses are never inspected. Rejections are split into
/// HTTP, network and other failures.
pub fn classify(
    result: &Result<TransportResponse, TransportError>,
    response_type: ResponseType,
    codes: &StatusCodes,
) -> Outcome {
    match result {
        Ok(response) => classify_response(response, response_type, codes),
        Err(err) => classify_error(err),
    }
}

fn classify_response(
    response: &TransportResponse,
    response_type: ResponseType,
    codes: &StatusCodes,
) -> Outcome {
    if response_type == ResponseType::Bytes {
        return Outcome::Ok;
    }
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(&response.body) else {
        return Outcome::Ok;
    };
    match envelope_head(&body) {
        Some((code, message)) if code == codes.unauthenticated => Outcome::Unauthenticated {
            message: non_empty(message, "Not logged in"),
        },
        Some((code, _)) if code == codes.session_expired => Outcome::SessionExpired,
        _ => Outcome::Ok,
    }
}

fn classify_error(err: &TransportError) -> Outcome {
    if err.network {
        return Outcome::Network {
            message: non_empty(err.message.clone(), "Network error"),
        };
    }
    match err.status {
        Some(status) if (400..600).contains(&status) => Outcome::Http {
            status,
            message: http_message(status, err.body.as_deref()),
        },
        _ => Outcome::Other {
            message: non_empty(err.message.clone(), "Request failed"),
        },
    }
}

/// Prefer the envelope's message when the error body carries one.
fn http_message(status: u16, body: Option<&str>) -> String {
    body.and_then(|b| serde_json::from_str::<serde_json::Value>(b).ok())
        .and_then(|v| envelope_head(&v))
        .map(|(_, message)| message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("HTTP error");
            format!("Request failed ({status} {reason})")
        })
}

fn non_empty(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
