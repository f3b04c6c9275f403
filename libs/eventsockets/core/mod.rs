//! # EventSockets core
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventsockets::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = eventsockets::builder()
//!         .transport(SocketIoTransport::new())
//!         .default_header("Origin", "https://example.com")
//!         .heartbeat(Duration::from_secs(60), "ps")
//!         .build()?;
//!
//!     client.on("updateStream", |payload: Value| async move {
//!         println!("{payload}");
//!         anyhow::Ok(())
//!     });
//!
//!     client.connect(ConnectOptions::new("wss://api.example.com")).await?;
//!     client.emit("subscribeSymbol", Some(json!("EURUSD")), None).await?;
//!     client.wait().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod dispatch;
pub mod handshake;
pub mod heartbeat;
pub mod memory;
pub mod pipeline;
pub mod registry;

// Re-export main types
pub use builder::{states, EventClientBuilder};
pub use client::{ClientEvent, EventClient, Metrics, Registrar};
pub use config::{ClientConfig, ConnectOptions};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use handshake::{extract_auth_from_handshake_frame, AuthHandshake};
pub use memory::MemoryTransport;

/// Create a new client builder
///
/// Convenience entry point for the builder pattern.
pub fn builder() -> EventClientBuilder<builder::states::NoTransport> {
    EventClientBuilder::new()
}
