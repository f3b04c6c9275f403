//! Typed Pocket Option client
//!
//! `PocketOptionClient` wraps an `EventClient` and derefs to it, so the raw
//! `on`/`emit`/`connect` surface stays available next to the generated
//! `on_<event>`, `<event>_registrar` and `emit_<event>` methods.

use crate::config::{ClientSettings, Credentials};
use eventsockets::{
    ConnectOptions, EventClient, LoggingInterceptor, Result, SocketIoTransport, Transport,
};
use serde::Deserialize;
use std::ops::Deref;
use tracing::info;

/// Demo trading endpoint
pub const DEFAULT_URL: &str = "wss://demo-api-eu.po.market";
pub const DEFAULT_ORIGIN: &str = "https://m.pocketoption.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:143.0) Gecko/20100101 Firefox/143.0";

#[derive(Clone)]
pub struct PocketOptionClient {
    inner: EventClient,
}

include!(concat!(env!("OUT_DIR"), "/pocket_option_bindings.rs"));

#[derive(Debug, Deserialize)]
struct ConnectReply {
    sid: String,
}

impl PocketOptionClient {
    /// Client over the Socket.IO WebSocket transport
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        Self::with_transport(settings, SocketIoTransport::new())
    }

    /// Client over any transport, configured from `settings`
    ///
    /// Default `Origin`/`User-Agent` headers, the heartbeat and the
    /// reconnection options all come from `settings`.
    pub fn with_transport(settings: &ClientSettings, transport: impl Transport) -> Result<Self> {
        let mut builder = EventClient::builder()
            .transport(transport)
            .config(settings.connection.clone())
            .interceptor(LoggingInterceptor);

        for (name, value) in settings.handshake_headers() {
            builder = builder.default_header(name, value);
        }
        if settings.heartbeat.enabled {
            builder = builder.heartbeat(settings.heartbeat.interval(), settings.heartbeat.event.clone());
        }

        Ok(Self::from_client(builder.build()?))
    }

    pub fn from_client(inner: EventClient) -> Self {
        Self { inner }
    }

    pub fn client(&self) -> &EventClient {
        &self.inner
    }

    /// Connect options for `settings.url`
    pub fn connect_options(settings: &ClientSettings) -> ConnectOptions {
        ConnectOptions::new(settings.url.clone())
            .wait_timeout(settings.wait_timeout())
            .retry(settings.retry_initial_connect)
    }

    /// Connect, then authorize the session with `credentials`
    pub async fn connect_and_authorize(&self, options: ConnectOptions, credentials: &Credentials) -> Result<()> {
        self.inner.connect(options).await?;
        self.emit_auth(credentials.authorization()).await?;
        info!(uid = credentials.uid, demo = credentials.is_demo, "Authorization sent");
        Ok(())
    }

    /// Socket.IO session id of the current session
    ///
    /// Consumes the session's handshake, see `EventClient::take_handshake`.
    pub fn take_session_id(&self) -> Option<String> {
        let handshake = self.inner.take_handshake()?;
        handshake.decode::<ConnectReply>().ok().map(|reply| reply.sid)
    }
}

impl Deref for PocketOptionClient {
    type Target = EventClient;

    fn deref(&self) -> &EventClient {
        &self.inner
    }
}

impl From<EventClient> for PocketOptionClient {
    fn from(inner: EventClient) -> Self {
        Self::from_client(inner)
    }
}
