//! The relay path: authorize, resolve the target, dispatch upstream,
//! pass the response back untouched
//!
//! The gateway adds nothing to upstream traffic beyond a fixed User-Agent
//! and Accept header; status, content type, and body bytes come back to
//! the caller exactly as the upstream sent them.

use std::collections::BTreeMap;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use super::error::RelayError;
use super::server::ProxyState;
use super::target::{TargetRoute, GATEWAY_ROUTE};

/// User-Agent sent on every outbound request
const OUTBOUND_USER_AGENT: &str = "BudgetIQ-Proxy/1.0";

/// Name of the shared-secret header (matched case-insensitively)
pub const SECRET_HEADER: &str = "x-proxy-secret";

/// Exact string compare of the shared-secret header.
///
/// Runs before path resolution, so unknown paths also answer 403 to
/// callers without the secret.
pub(super) fn authorize(headers: &HeaderMap, state: &ProxyState) -> Result<(), RelayError> {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if presented != Some(state.config.secret.as_str()) {
        return Err(RelayError::Unauthorized);
    }
    Ok(())
}

/// GET /api/proxy?path=/web_services/...&rest - query-encoded shape
pub async fn relay_query(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, RelayError> {
    authorize(&headers, &state)?;
    let target = TargetRoute::resolve(GATEWAY_ROUTE, params)?;
    relay(&state, Method::GET, &headers, target, None).await
}

/// GET/POST /web_services/... - direct shape, body forwarded on POST
pub async fn relay_direct(
    State(state): State<ProxyState>,
    Query(params): Query<BTreeMap<String, String>>,
    req: Request<Body>,
) -> Result<Response, RelayError> {
    authorize(req.headers(), &state)?;
    let method = req.method().clone();
    let headers = req.headers().clone();
    let target = TargetRoute::resolve(req.uri().path(), params)?;

    // Read the request body without a size cap
    let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|e| RelayError::BodyRead(e.to_string()))?;
    let body = (method == Method::POST).then_some(bytes);

    relay(&state, method, &headers, target, body).await
}

/// Fallback for paths the router doesn't know. Auth still runs first,
/// matching the dispatch order of the relay routes.
pub async fn invalid_path(State(state): State<ProxyState>, headers: HeaderMap) -> RelayError {
    match authorize(&headers, &state) {
        Err(e) => e,
        Ok(()) => RelayError::InvalidPath,
    }
}

/// Build the outbound request, send it, and relay the response.
async fn relay(
    state: &ProxyState,
    method: Method,
    headers: &HeaderMap,
    target: TargetRoute,
    body: Option<Bytes>,
) -> Result<Response, RelayError> {
    let url = target.url(&state.upstream);

    tracing::info!("Relaying {} {}", method, target.path());

    let mut outbound = state
        .client
        .request(method, url)
        .header(header::USER_AGENT, OUTBOUND_USER_AGENT)
        .header(header::ACCEPT, "application/json");

    if let Some(bytes) = body {
        // A forwarded body keeps its inbound content type
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            outbound = outbound.header(header::CONTENT_TYPE, content_type.clone());
        }
        outbound = outbound.body(bytes);
    }

    let response = outbound.send().await.map_err(map_outbound_error)?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    let bytes = response.bytes().await.map_err(map_outbound_error)?;

    tracing::info!("Upstream answered {} ({} bytes)", status.as_u16(), bytes.len());

    Ok((status, [(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// reqwest folds timeouts and transport failures into one error type;
/// split them back apart for the caller-facing taxonomy. Dropping the
/// timed-out future tears down the outbound connection.
fn map_outbound_error(err: reqwest::Error) -> RelayError {
    if err.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Connect(err.to_string())
    }
}
