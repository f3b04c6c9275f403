//! # EventSockets
//!
//! An event-named pub/sub client for Socket.IO style services.
//!
//! ## Features
//!
//! - **Atomic state machine**: `Disconnected`, `Connecting`, `Connected`, `Reconnecting`
//! - **Type-state builder**: a transport must be supplied before `build()` compiles
//! - **Per-event dispatch**: each wire name gets its own worker, listeners run in order
//! - **Emit middleware**: ordered stages that can rewrite or suppress outbound events
//! - **Pluggable transport**: `SocketIoTransport` for the wire, `MemoryTransport` for tests and replay

pub mod traits;
pub mod core;
pub mod socketio;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use crate::core::{
    builder, client, config, connection_state, dispatch, handshake, heartbeat, memory, pipeline,
    registry,
    builder::{states, EventClientBuilder},
    client::{ClientEvent, EventClient, Metrics, Registrar},
    config::{ClientConfig, ConnectOptions},
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState},
    handshake::{extract_auth_from_handshake_frame, AuthHandshake},
    heartbeat::HeartbeatConfig,
    memory::MemoryTransport,
};

pub use socketio::{Packet, SocketIoTransport};

// Generated bindings name these through the crate root
pub use serde_json::{json, Value};

// Convenience function
pub use crate::core::builder as client_builder;
