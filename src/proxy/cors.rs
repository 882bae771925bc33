//! CORS middleware for browser clients
//!
//! The partner API sends no CORS headers, so the browser client can only
//! reach it through this gateway. Every response (including errors and
//! health checks) gets the permissive header set, and OPTIONS preflights
//! are answered 204 before routing or auth ever run.

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderValue, Method, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
};

use super::server::ProxyState;

/// Methods advertised to preflighting browsers
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Headers the client is allowed to send cross-origin
const ALLOW_HEADERS: &str = "Content-Type, X-Proxy-Secret";

/// Middleware stamping CORS headers on every response.
///
/// Preflights short-circuit here with 204 No Content; everything else
/// passes through the router and gets the headers added afterwards.
pub async fn apply(
    State(state): State<ProxyState>,
    request: Request<Body>,
    next: middleware::Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        stamp(&mut response, &state.cors_origin);
        return response;
    }

    let mut response = next.run(request).await;
    stamp(&mut response, &state.cors_origin);
    response
}

fn stamp(response: &mut Response, origin: &HeaderValue) {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", origin.clone());
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}
