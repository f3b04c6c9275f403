//! Binary runner utilities
//!
//! Provides a standardized way to run binaries with proper
//! logging, periodic stats and graceful shutdown.

use eventsockets::EventClient;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Interval between client stats lines, seconds
    pub stats_interval_secs: u64,
}

impl RunConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats_interval_secs: 300, // 5 minutes default
        }
    }

    pub fn with_stats_interval(mut self, secs: u64) -> Self {
        self.stats_interval_secs = secs;
        self
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs.max(1))
    }
}

/// Trait for binary applications
pub trait BinaryRunner {
    /// Run the application until it stops
    async fn run(&mut self) -> anyhow::Result<()>;

    fn config(&self) -> &RunConfig;

    fn print_banner(&self) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("Starting {}", config.name);
        info!("Press Ctrl+C to stop");
        info!("========================================");
        info!("");
    }

    fn print_shutdown(&self, stats: Option<&str>) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("{} stopped gracefully", config.name);
        if let Some(stats) = stats {
            info!("{}", stats);
        }
        info!("========================================");
    }

    /// Execute the binary with proper initialization and cleanup
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown(None);
        result
    }
}

/// Block until the client stops on its own or Ctrl+C arrives
///
/// Ctrl+C shuts the client down. Client stats are logged every
/// `stats_interval` meanwhile.
pub async fn wait_for_shutdown(client: &EventClient, stats_interval: Duration) {
    let mut stats = tokio::time::interval(stats_interval);
    stats.tick().await;

    loop {
        tokio::select! {
            _ = client.wait() => {
                info!("Client stopped");
                return;
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                info!("");
                info!("Received shutdown signal (Ctrl+C)");
                info!("Shutting down gracefully...");
                if let Err(e) = client.shutdown().await {
                    warn!(error = %e, "Shutdown reported an error");
                }
                return;
            }
            _ = stats.tick() => {
                let metrics = client.metrics();
                info!(
                    state = %metrics.connection_state,
                    frames = metrics.frames_received,
                    emits = metrics.emits_sent,
                    reconnects = metrics.reconnect_count,
                    listener_failures = metrics.listener_failures,
                    queued = metrics.frames_queued,
                    "Client stats"
                );
            }
        }
    }
}
