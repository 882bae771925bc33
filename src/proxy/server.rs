//! Gateway server setup and initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::header::HeaderValue, middleware, routing::get, Router};
use reqwest::Url;
use tokio::net::TcpListener;

use crate::config::Config;

use super::cors;
use super::relay;
use super::status;

/// Shared handler state: the outbound client plus read-only configuration
#[derive(Clone)]
pub struct ProxyState {
    /// Outbound HTTP client, shared across requests for connection pooling
    pub client: reqwest::Client,
    /// Immutable runtime configuration
    pub config: Arc<Config>,
    /// Parsed upstream origin
    pub upstream: Url,
    /// Pre-validated Access-Control-Allow-Origin value
    pub cors_origin: HeaderValue,
}

impl ProxyState {
    /// Validate config-derived values once, at startup
    pub fn new(config: Arc<Config>) -> Result<Self> {
        // Build the HTTP client with timeout and connection pooling
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .pool_max_idle_per_host(10)
            // Force HTTP/1.1 to avoid HTTP/2 connection reset issues
            .http1_only()
            .build()
            .context("Failed to create HTTP client")?;

        let upstream = Url::parse(&config.upstream_base).context("Invalid upstream origin")?;
        let cors_origin =
            HeaderValue::from_str(&config.cors_origin).context("Invalid CORS origin")?;

        Ok(Self {
            client,
            config,
            upstream,
            cors_origin,
        })
    }
}

/// Build the router: status endpoints, the two relay shapes, and a
/// catch-all rejecting everything else
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/", get(status::health))
        .route("/health", get(status::health))
        .route("/ip", get(status::outbound_ip))
        .route("/api/proxy", get(relay::relay_query))
        // The wildcard below never matches an empty remainder, so the
        // namespace root gets its own entry
        .route(
            "/web_services/",
            get(relay::relay_direct).post(relay::relay_direct),
        )
        .route(
            "/web_services/*rest",
            get(relay::relay_direct).post(relay::relay_direct),
        )
        .fallback(relay::invalid_path)
        .layer(middleware::from_fn_with_state(state.clone(), cors::apply))
        .with_state(state)
}

/// Start the gateway server
pub async fn start_proxy(
    config: Arc<Config>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let state = ProxyState::new(config.clone())?;
    let app = router(state);

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Bind and serve
    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Gateway listening on {}", bind_addr);

    // Start serving requests with graceful shutdown
    // When shutdown_rx receives a signal, the server will stop accepting new
    // connections and gracefully finish processing existing requests
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Gateway shut down gracefully");
    Ok(())
}
