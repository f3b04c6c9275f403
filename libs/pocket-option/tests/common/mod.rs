//! Shared helpers for the client binding tests

#![allow(dead_code)]

use eventsockets::{ConnectOptions, MemoryTransport};
use pocket_option::{ClientSettings, PocketOptionClient};
use std::time::Duration;

/// Settings for tests: no heartbeat, quick reconnects
pub fn test_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    settings.url = "ws://memory.test".to_string();
    settings.heartbeat.enabled = false;
    settings.connection.reconnection_delay_secs = 0.01;
    settings.connection.reconnection_delay_max_secs = 0.05;
    settings
}

/// Client over a memory transport, plus the transport handle
pub fn memory_client(settings: &ClientSettings) -> (PocketOptionClient, MemoryTransport) {
    let transport = MemoryTransport::new();
    let client = PocketOptionClient::with_transport(settings, transport.clone()).unwrap();
    (client, transport)
}

pub async fn connected_client() -> (PocketOptionClient, MemoryTransport) {
    let settings = test_settings();
    let (client, transport) = memory_client(&settings);
    client
        .connect(ConnectOptions::new(settings.url.clone()))
        .await
        .unwrap();
    (client, transport)
}

pub async fn wait_until<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
