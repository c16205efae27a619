//! Error types for the relay's HTTP surface.
//!
//! Only caller mistakes become errors. Upstream failures are absorbed by the
//! relay and answered with a canned reply, so they never appear here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Relay errors returned to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Message is required")]
    MissingMessage,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingMessage | RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(RelayError::MissingMessage.to_string(), "Message is required");
        assert_eq!(
            RelayError::InvalidRequest("bad json".into()).to_string(),
            "Invalid request: bad json"
        );
    }

    #[test]
    fn test_error_into_response() {
        let response = RelayError::MissingMessage.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
