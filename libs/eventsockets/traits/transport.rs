use crate::traits::codec::JsonCodec;
use crate::traits::error::Result;
use crate::traits::headers::Headers;
use crate::traits::middleware::Emit;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A decoded inbound event: wire name plus its raw payload
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub event: String,
    pub payload: Value,
}

impl InboundFrame {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Everything a transport needs to open one session
#[derive(Clone)]
pub struct ConnectRequest {
    pub url: String,
    pub headers: Headers,
    /// Sent with the namespace connect packet
    pub auth: Option<Value>,
    /// Bound on each handshake step
    pub timeout: Duration,
    pub codec: Arc<dyn JsonCodec>,
}

impl fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("auth", &self.auth.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// An established session
///
/// `handshake` is the raw first frame the server sent for this session
/// (for Socket.IO, the namespace connect reply such as `40{"sid":"..."}`).
/// The session ends when `inbound` yields `None`.
pub struct TransportSession {
    pub handshake: String,
    pub inbound: mpsc::UnboundedReceiver<InboundFrame>,
}

/// Capability the client core drives
///
/// One transport instance serves consecutive sessions: `open` is called
/// again for every reconnection.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn open(&self, request: &ConnectRequest) -> Result<TransportSession>;

    async fn send(&self, emit: Emit) -> Result<()>;

    /// Close the current session, if any
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn open(&self, request: &ConnectRequest) -> Result<TransportSession> {
        (**self).open(request).await
    }

    async fn send(&self, emit: Emit) -> Result<()> {
        (**self).send(emit).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}
