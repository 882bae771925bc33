// IMwalleT Proxy - Forwarding gateway for the IMwalleT partner API
//
// Browser clients cannot call the partner API directly: it sits behind an
// IP whitelist and rejects cross-origin callers. This binary runs on a
// host whose egress IP is whitelisted, checks a shared secret on every
// request, and forwards anything under /web_services/ upstream.
//
// Architecture:
// - Gateway server (axum): authenticates and relays HTTP traffic
// - Keep-alive (reqwest): pings our own /health so free hosting tiers
//   do not idle the instance out
// - Config: env vars > config file > defaults

use anyhow::Result;
use std::sync::Arc;

use imwallet_proxy::cli;
use imwallet_proxy::config::{self, Config, LogRotation};
use imwallet_proxy::{proxy, KeepAlive};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --edit, --update)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Arc::new(Config::from_env());

    // Initialize tracing/logging
    // Stdout always; optionally also rotating log files
    //
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("imwallet_proxy={}", config.logging.level);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Set up file logging if enabled (non-blocking writer with rotation)
    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            // Create log directory if it doesn't exist
            if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    config.logging.file_dir, e
                );
                // Fall back to stdout-only logging
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .init();
                None
            } else {
                // Create rolling file appender based on configured rotation
                let file_appender = match config.logging.file_rotation {
                    LogRotation::Hourly => tracing_appender::rolling::hourly(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Daily => tracing_appender::rolling::daily(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                    LogRotation::Never => tracing_appender::rolling::never(
                        &config.logging.file_dir,
                        &config.logging.file_prefix,
                    ),
                };

                // Wrap in non-blocking writer (writes happen in background thread)
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // File layer uses JSON format for structured log parsing
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer())
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .init();

                Some(guard)
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();

            None
        };

    tracing::info!("IMwalleT proxy v{}", config::VERSION);
    tracing::info!("Upstream: {}", config.upstream_base);
    tracing::info!("Secret fingerprint: {}", config.secret_fingerprint());

    // Create shutdown channels for graceful shutdown, one per background task
    // These are oneshot channels - each can only send one signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn the gateway server task
    // This runs in the background, handling HTTP requests
    let server_config = config.clone();
    let server_handle = tokio::spawn(async move {
        proxy::start_proxy(server_config, shutdown_rx)
            .await
            .expect("Gateway server failed");
    });

    // Spawn the keep-alive task (if enabled)
    // This pings our own /health URL on an interval so the hosting
    // platform sees traffic and keeps the instance warm
    let (keepalive_tx, keepalive_handle) = if config.keep_alive {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let task = KeepAlive::new(&config)?;
        (Some(tx), Some(tokio::spawn(task.run(rx))))
    } else {
        tracing::info!("Keep-alive disabled in config");
        (None, None)
    };

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");

    // Signal the background tasks to shut down gracefully
    // If a send fails, that task has already stopped (which is fine)
    let _ = shutdown_tx.send(());
    if let Some(tx) = keepalive_tx {
        let _ = tx.send(());
    }

    // Wait for background tasks to finish
    let _ = server_handle.await;
    if let Some(handle) = keepalive_handle {
        let _ = handle.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
