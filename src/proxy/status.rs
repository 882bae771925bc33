//! Unauthenticated status endpoints
//!
//! `/` and `/health` answer liveness probes (and the keep-alive self-ping);
//! `/ip` reports the gateway's outbound public IP so operators know what to
//! allow-list in the partner panel.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::ErrorBody;
use super::server::ProxyState;

/// Public JSON echo used to discover the outbound IP
const IP_ECHO_URL: &str = "https://api.ipify.org?format=json";

/// Response for GET / and GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// RFC 3339 UTC with millisecond precision
    pub timestamp: String,
}

/// GET / and GET /health - liveness check, no auth
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[derive(Debug, Deserialize)]
struct IpEcho {
    ip: String,
}

/// Response for GET /ip
#[derive(Debug, Serialize)]
pub struct OutboundIpResponse {
    pub outbound_ip: String,
    pub note: &'static str,
}

/// GET /ip - report the outbound public IP, no auth
pub async fn outbound_ip(State(state): State<ProxyState>) -> Response {
    let echo: Result<IpEcho, reqwest::Error> = match state.client.get(IP_ECHO_URL).send().await {
        Ok(response) => response.json().await,
        Err(e) => Err(e),
    };

    match echo {
        Ok(echo) => Json(OutboundIpResponse {
            outbound_ip: echo.ip,
            note: "Whitelist this IP in IMwalleT panel",
        })
        .into_response(),
        Err(e) => {
            tracing::warn!("Outbound IP lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Could not detect IP",
                    detail: None,
                    hint: None,
                }),
            )
                .into_response()
        }
    }
}
