//! Periodic self-ping to keep the host process warm
//!
//! Free hosting tiers suspend idle processes; pinging our own /health
//! endpoint on a timer keeps the gateway responsive. Ping failures are
//! logged and discarded, never surfaced to request handling.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::time;

use crate::config::Config;

pub struct KeepAlive {
    client: reqwest::Client,
    ping_url: String,
    interval: Duration,
}

impl KeepAlive {
    /// Ten minutes, matching the idle window of free-tier hosts
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10 * 60);

    /// Self-ping task for the deployment described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_interval(config, Self::DEFAULT_INTERVAL)
    }

    /// Same task with a caller-chosen interval
    pub fn with_interval(config: &Config, interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create keep-alive HTTP client")?;

        Ok(Self {
            client,
            ping_url: format!("{}/health", config.external_url),
            interval,
        })
    }

    /// Loop until shutdown. The first ping fires one full interval after
    /// start, not immediately.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        tracing::info!(
            "Keep-alive pinging {} every {}s",
            self.ping_url,
            self.interval.as_secs()
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.ping().await;
                }
                _ = &mut shutdown => {
                    tracing::info!("Keep-alive received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn ping(&self) {
        match self.client.get(&self.ping_url).send().await {
            Ok(response) => {
                tracing::info!("Keep-alive ping: {}", response.status().as_u16());
            }
            Err(e) => {
                tracing::warn!("Keep-alive ping failed: {}", e);
            }
        }
    }
}
