//! The relay step shared by every gateway: one outbound call, error
//! normalization, no retry.
//!
//! A non-success answer becomes [`GatewayError::Upstream`] carrying the
//! upstream status unchanged and the best message we can find:
//!
//! 1. JSON body → first non-empty string at one of the API's message pointers
//! 2. otherwise the raw body text, when non-empty
//! 3. otherwise `"<feature> failed (<status>)"`

use super::error::GatewayError;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{error, warn};

/// Where an external API puts its error message.
#[derive(Debug, Clone, Copy)]
pub struct ErrorShape {
    /// Human name used in the fallback message and in logs.
    pub feature: &'static str,
    /// JSON pointers tried in order.
    pub message_pointers: &'static [&'static str],
}

pub const GENERATION: ErrorShape = ErrorShape {
    feature: "image generation",
    message_pointers: &["/message", "/error", "/error/message"],
};

pub const RECOGNITION: ErrorShape = ErrorShape {
    feature: "recognition",
    message_pointers: &["/message", "/error", "/error/message"],
};

pub const REMOVE_BG: ErrorShape = ErrorShape {
    feature: "remove.bg",
    message_pointers: &["/errors/0/title", "/message", "/error", "/error/message"],
};

impl ErrorShape {
    /// Best-effort message for a failed upstream response.
    pub fn extract_message(&self, status: StatusCode, body: &[u8]) -> String {
        if let Ok(json) = serde_json::from_slice::<Value>(body) {
            let found = self
                .message_pointers
                .iter()
                .filter_map(|pointer| json.pointer(pointer).and_then(Value::as_str))
                .find(|message| !message.trim().is_empty());
            if let Some(message) = found {
                return message.to_string();
            }
        }

        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }

        format!("{} failed ({})", self.feature, status.as_u16())
    }
}

/// Issue `request` exactly once.
///
/// Success responses are returned untouched for the caller to decode.
pub async fn send(request: RequestBuilder, shape: &ErrorShape) -> Result<Response, GatewayError> {
    let response = request.send().await.map_err(|e| {
        error!(feature = shape.feature, error = %e, "upstream request failed to complete");
        GatewayError::from(e)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = shape.extract_message(status, &body);
    warn!(
        feature = shape.feature,
        status = status.as_u16(),
        %message,
        "upstream returned an error"
    );
    Err(GatewayError::Upstream { status, message })
}
