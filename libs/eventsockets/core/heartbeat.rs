//! Application-level heartbeat
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │  (Tokio spawn)      │
//! │                     │
//! │  Every X interval:  │
//! │  1. Wait for tick   │
//! │  2. client.emit() ──┼──> Middleware chain ──> Transport
//! │  3. Repeat          │
//! └─────────────────────┘
//! ```
//!
//! One task per connected session. It is started by the session task once
//! the handshake completes and stopped when the session ends, so it never
//! emits while the client is not connected.

use crate::core::client::EventClient;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Event emitted periodically while connected
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub event: String,
    pub payload: Option<Value>,
}

impl HeartbeatConfig {
    pub fn new(interval: Duration, event: impl Into<String>) -> Self {
        Self {
            interval,
            event: event.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

pub(crate) struct HeartbeatHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub(crate) async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            warn!(error = %e, "Heartbeat task ended abnormally");
        }
    }
}

pub(crate) fn spawn_heartbeat(client: EventClient, config: HeartbeatConfig) -> HeartbeatHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(heartbeat_task(client, config, stop_rx));
    HeartbeatHandle { stop_tx, task }
}

async fn heartbeat_task(client: EventClient, config: HeartbeatConfig, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(config.interval);
    // Skip the first immediate tick - wait for the first interval
    ticker.tick().await;
    // If we miss ticks due to slow processing, skip them rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!(event = %config.event, interval = ?config.interval, "Heartbeat task started");

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                if let Err(e) = client.emit(config.event.as_str(), config.payload.clone(), None).await {
                    warn!(event = %config.event, error = %e, "Heartbeat emit failed");
                }
            }
        }
    }

    debug!("Heartbeat task exiting");
}
