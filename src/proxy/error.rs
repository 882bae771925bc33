//! Relay error types and response handling
//!
//! Every locally generated failure becomes a small JSON envelope with a
//! stable `error` key, so browser clients can branch without sniffing
//! status text. Upstream responses pass through untouched whatever their
//! status; these errors cover only what the gateway decides itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body shape for locally generated errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

/// Errors that can occur while relaying
#[derive(Debug)]
pub enum RelayError {
    /// Missing or wrong X-Proxy-Secret header
    Unauthorized,
    /// Inbound path matches no gateway route
    InvalidPath,
    /// Resolved target escapes the /web_services/ namespace
    PrefixViolation,
    /// Inbound body could not be read from the client
    BodyRead(String),
    /// Upstream unreachable (DNS, connect, TLS, reset)
    Connect(String),
    /// Upstream did not answer within the outbound budget
    Timeout,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            RelayError::Unauthorized => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    error: "Unauthorized",
                    detail: None,
                    hint: None,
                },
            ),
            RelayError::InvalidPath => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid path",
                    detail: None,
                    hint: None,
                },
            ),
            RelayError::PrefixViolation => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Path must start with /web_services/",
                    detail: None,
                    hint: None,
                },
            ),
            RelayError::BodyRead(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Failed to read request body",
                    detail: Some(detail),
                    hint: None,
                },
            ),
            RelayError::Connect(detail) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: "Proxy connection failed",
                    detail: Some(detail),
                    hint: Some("Ensure Render IP is whitelisted in IMwalleT"),
                },
            ),
            RelayError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorBody {
                    error: "Proxy timeout",
                    detail: None,
                    hint: None,
                },
            ),
        };

        tracing::error!("Relay error: {} - {}", status, body.error);

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_omits_absent_fields() {
        let body = ErrorBody {
            error: "Unauthorized",
            detail: None,
            hint: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Unauthorized"}));
    }

    #[test]
    fn test_error_body_carries_detail_and_hint() {
        let body = ErrorBody {
            error: "Proxy connection failed",
            detail: Some("connection refused".to_string()),
            hint: Some("Ensure Render IP is whitelisted in IMwalleT"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Proxy connection failed");
        assert_eq!(json["detail"], "connection refused");
        assert_eq!(json["hint"], "Ensure Render IP is whitelisted in IMwalleT");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RelayError::Unauthorized, StatusCode::FORBIDDEN),
            (RelayError::InvalidPath, StatusCode::BAD_REQUEST),
            (RelayError::PrefixViolation, StatusCode::BAD_REQUEST),
            (
                RelayError::BodyRead("aborted".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                RelayError::Connect("refused".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (RelayError::Timeout, StatusCode::GATEWAY_TIMEOUT),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
