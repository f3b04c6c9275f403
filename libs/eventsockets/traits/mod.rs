//! # EventSockets Traits
//!
//! Core traits and types shared by the client, the transports and generated
//! bindings:
//!
//! - **Transport**: open a session, send emits, close
//! - **Listener**: async callback receiving a decoded payload
//! - **EmitMiddleware**: outbound stage that forwards, rewrites or suppresses an emit
//! - **ReconnectionStrategy**: control reconnection behavior
//! - **HeaderProvider**: headers for every connection attempt
//! - **JsonCodec**: text <-> `serde_json::Value`
//! - **ConnectInterceptor**: observe connection attempts
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventsockets::*;
//!
//! struct Stamp;
//!
//! #[async_trait]
//! impl EmitMiddleware for Stamp {
//!     async fn process(&self, mut emit: Emit) -> Result<Flow> {
//!         emit.payload = Some(json!({ "inner": emit.payload, "ts": 1 }));
//!         Ok(Flow::Forward(emit))
//!     }
//! }
//! ```

pub mod ack;
pub mod codec;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod listener;
pub mod middleware;
pub mod reconnect;
pub mod transport;

// Re-export commonly used types
pub use ack::{Ack, TypedAck};
pub use async_trait::async_trait;
pub use codec::{collapse_args, decode_payload, to_payload, JsonCodec, SerdeJsonCodec};
pub use error::{EventSocketError, Result};
pub use headers::{apply_default_headers, HeaderFn, HeaderProvider, Headers, NoHeaders, StaticHeaders};
pub use interceptor::{ConnectInterceptor, LoggingInterceptor};
pub use listener::{sync_listener, Listener, ListenerResult, SyncListener};
pub use middleware::{Emit, EmitMiddleware, FailurePolicy, Flow};
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use transport::{ConnectRequest, InboundFrame, Transport, TransportSession};
