//! Gateway error taxonomy.
//!
//! Every failure leaves the gateway as `{"error": "<message>"}` with a status
//! code that depends on the variant:
//!
//! | Variant | Status |
//! |---|---|
//! | [`GatewayError::MissingCredential`] | 500 |
//! | [`GatewayError::ClientInput`] | 400 (or the extractor's own 4xx) |
//! | [`GatewayError::Upstream`] | upstream status, unchanged |
//! | [`GatewayError::Transport`] | 500 |

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// A server-held credential is not configured. Checked before anything else.
    #[error("Server missing {0}")]
    MissingCredential(&'static str),
    /// The caller must correct the request.
    #[error("{message}")]
    ClientInput { status: StatusCode, message: String },
    /// The external API answered with a non-success status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    /// The external call could not complete, or its success body was unusable.
    #[error("{0}")]
    Transport(String),
}

impl GatewayError {
    pub fn missing_field(field: &str) -> Self {
        Self::ClientInput {
            status: StatusCode::BAD_REQUEST,
            message: format!("{field} is required"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential(_) | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ClientInput { status, .. } | Self::Upstream { status, .. } => *status,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<MultipartError> for GatewayError {
    fn from(err: MultipartError) -> Self {
        Self::ClientInput {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<MultipartRejection> for GatewayError {
    fn from(err: MultipartRejection) -> Self {
        Self::ClientInput {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<BytesRejection> for GatewayError {
    fn from(err: BytesRejection) -> Self {
        Self::ClientInput {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_500() {
        let err = GatewayError::MissingCredential("ARK_API_KEY");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Server missing ARK_API_KEY");
    }

    #[test]
    fn missing_field_is_400() {
        let err = GatewayError::missing_field("prompt");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "prompt is required");
    }

    #[test]
    fn upstream_status_is_forwarded() {
        let err = GatewayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "rate limited".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn transport_is_500() {
        let err = GatewayError::Transport("connection refused".into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
