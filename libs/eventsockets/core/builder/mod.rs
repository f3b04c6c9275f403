pub mod states;

use crate::core::client::{ClientParts, EventClient};
use crate::core::config::ClientConfig;
use crate::core::heartbeat::HeartbeatConfig;
use crate::traits::*;
use serde_json::Value;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for `EventClient`
///
/// The transport is the only required part; `build()` is not available
/// until it has been set.
pub struct EventClientBuilder<T>
where
    T: TransportState,
{
    _state: TypeState<T>,
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    codec: Option<Arc<dyn JsonCodec>>,
    default_headers: Headers,
    interceptors: Vec<Arc<dyn ConnectInterceptor>>,
    middlewares: Vec<Arc<dyn EmitMiddleware>>,
    heartbeat: Option<HeartbeatConfig>,
}

impl EventClientBuilder<NoTransport> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            transport: None,
            config: ClientConfig::default(),
            reconnect_strategy: None,
            codec: None,
            default_headers: Headers::new(),
            interceptors: Vec::new(),
            middlewares: Vec::new(),
            heartbeat: None,
        }
    }

    pub fn transport(self, transport: impl Transport) -> EventClientBuilder<HasTransport> {
        EventClientBuilder {
            _state: TypeState::new(),
            transport: Some(Arc::new(transport)),
            config: self.config,
            reconnect_strategy: self.reconnect_strategy,
            codec: self.codec,
            default_headers: self.default_headers,
            interceptors: self.interceptors,
            middlewares: self.middlewares,
            heartbeat: self.heartbeat,
        }
    }
}

impl Default for EventClientBuilder<NoTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventClientBuilder<T>
where
    T: TransportState,
{
    /// Runtime options; also the source of the default reconnection strategy
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the strategy derived from `config`
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    pub fn codec(mut self, codec: impl JsonCodec + 'static) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    /// Header added to every connection attempt unless the caller sets it
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn interceptor(mut self, interceptor: impl ConnectInterceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn middleware(mut self, stage: impl EmitMiddleware + 'static) -> Self {
        self.middlewares.push(Arc::new(stage));
        self
    }

    /// Emit `event` (without payload) every `interval` while connected
    pub fn heartbeat(mut self, interval: Duration, event: impl Into<String>) -> Self {
        self.heartbeat = Some(HeartbeatConfig::new(interval, event));
        self
    }

    pub fn heartbeat_with_payload(mut self, interval: Duration, event: impl Into<String>, payload: Value) -> Self {
        self.heartbeat = Some(HeartbeatConfig::new(interval, event).with_payload(payload));
        self
    }
}

// Build method - only available once a transport is set
impl EventClientBuilder<HasTransport> {
    pub fn build(self) -> Result<EventClient> {
        let transport = self
            .transport
            .ok_or_else(|| EventSocketError::Configuration("transport must be set".to_string()))?;

        self.config.validate()?;
        if let Some(heartbeat) = &self.heartbeat {
            if heartbeat.interval.is_zero() {
                return Err(EventSocketError::Configuration(
                    "heartbeat interval must be greater than zero".to_string(),
                ));
            }
        }

        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| self.config.reconnect_strategy());
        let codec = self.codec.unwrap_or_else(|| Arc::new(SerdeJsonCodec));

        Ok(EventClient::from_parts(ClientParts {
            transport,
            config: self.config,
            strategy,
            codec,
            default_headers: self.default_headers,
            interceptors: self.interceptors,
            middlewares: self.middlewares,
            heartbeat: self.heartbeat,
        }))
    }
}
