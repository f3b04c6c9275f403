use crate::core::builder::{states::NoTransport, EventClientBuilder};
use crate::core::config::{ClientConfig, ConnectOptions};
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::dispatch::Dispatcher;
use crate::core::handshake::{extract_auth_from_handshake_frame, AuthHandshake};
use crate::core::heartbeat::{spawn_heartbeat, HeartbeatConfig};
use crate::core::pipeline::MiddlewarePipeline;
use crate::core::registry::ListenerRegistry;
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle events published by the client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Handshake completed, the client is connected
    Connected,
    /// A connected session ended
    Disconnected,
    /// Waiting before reconnection attempt `n` (1-indexed)
    Reconnecting(usize),
    /// A connection attempt failed or reconnection gave up
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub emits_sent: u64,
    pub frames_received: u64,
    pub reconnect_count: u64,
    pub listener_failures: u64,
    /// Frames waiting in dispatch queues for their listeners
    pub frames_queued: u64,
    pub connection_state: ConnectionState,
}

/// Everything the builder resolved for a new client
pub(crate) struct ClientParts {
    pub transport: Arc<dyn Transport>,
    pub config: ClientConfig,
    pub strategy: Box<dyn ReconnectionStrategy>,
    pub codec: Arc<dyn JsonCodec>,
    pub default_headers: Headers,
    pub interceptors: Vec<Arc<dyn ConnectInterceptor>>,
    pub middlewares: Vec<Arc<dyn EmitMiddleware>>,
    pub heartbeat: Option<HeartbeatConfig>,
}

struct SessionControl {
    shutdown_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    strategy: Box<dyn ReconnectionStrategy>,
    codec: Arc<dyn JsonCodec>,
    default_headers: Headers,
    interceptors: Vec<Arc<dyn ConnectInterceptor>>,
    heartbeat: Option<HeartbeatConfig>,
    state: AtomicConnectionState,
    metrics: Arc<AtomicMetrics>,
    registry: Arc<ListenerRegistry>,
    dispatcher: Dispatcher,
    pipeline: MiddlewarePipeline,
    handshake: Mutex<Option<AuthHandshake>>,
    session: Mutex<Option<SessionControl>>,
    /// `None` once the client is shut down, which ends `recv_event`
    event_tx: Mutex<Option<Sender<ClientEvent>>>,
    event_rx: Receiver<ClientEvent>,
}

impl ClientInner {
    fn publish(&self, event: ClientEvent) {
        if let Some(tx) = self.event_tx.lock().as_ref() {
            let _ = tx.send(event);
        }
    }
}

/// Event-named pub/sub client
///
/// A cheap handle: clones share the same connection, listeners and
/// middleware chain.
///
/// - `on` / `listener` / `on_any` register inbound listeners
/// - `emit` runs the middleware chain and hands the result to the transport
/// - `connect` / `disconnect` / `shutdown` / `wait` drive the session
#[derive(Clone)]
pub struct EventClient {
    inner: Arc<ClientInner>,
}

impl EventClient {
    /// Start building a client
    pub fn builder() -> EventClientBuilder<NoTransport> {
        EventClientBuilder::new()
    }

    pub(crate) fn from_parts(parts: ClientParts) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let metrics = Arc::new(AtomicMetrics::new());
        let pipeline = MiddlewarePipeline::new();
        for stage in parts.middlewares {
            pipeline.push(stage);
        }
        let (event_tx, event_rx) = unbounded();

        let inner = ClientInner {
            transport: parts.transport,
            config: parts.config,
            strategy: parts.strategy,
            codec: parts.codec,
            default_headers: parts.default_headers,
            interceptors: parts.interceptors,
            heartbeat: parts.heartbeat,
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            dispatcher: Dispatcher::new(Arc::clone(&registry), Arc::clone(&metrics)),
            metrics,
            registry,
            pipeline,
            handshake: Mutex::new(None),
            session: Mutex::new(None),
            event_tx: Mutex::new(Some(event_tx)),
            event_rx,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Open a session
    ///
    /// Moves `Disconnected -> Connecting` and starts the session task.
    /// With `options.wait`, resolves when the first attempt finished, bounded
    /// by `options.wait_timeout`. A failed first attempt leaves the client
    /// `Disconnected` unless `options.retry` is set, in which case the
    /// reconnection strategy keeps trying in the background.
    /// Every failure of that attempt surfaces as `EventSocketError::Connection`.
    pub async fn connect(&self, options: ConnectOptions) -> Result<()> {
        self.inner.state.transition(ConnectionState::Connecting)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        let (first_tx, first_rx) = oneshot::channel();

        info!(url = %options.url, "Connecting");
        let task = tokio::spawn(run_session(
            Arc::clone(&self.inner),
            options.clone(),
            shutdown_rx,
            done_tx,
            first_tx,
        ));
        *self.inner.session.lock() = Some(SessionControl {
            shutdown_tx,
            done_rx,
            task,
        });

        if !options.wait {
            return Ok(());
        }

        match tokio::time::timeout(options.wait_timeout, first_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(EventSocketError::Connection(
                "session ended before the first attempt completed".to_string(),
            )),
            Err(_) if options.retry => Err(EventSocketError::Timeout(format!(
                "not connected after {:?}, still retrying",
                options.wait_timeout
            ))),
            Err(_) => {
                self.disconnect().await?;
                Err(EventSocketError::Connection(format!(
                    "no handshake within {:?}",
                    options.wait_timeout
                )))
            }
        }
    }

    /// Close the session and stop reconnecting
    ///
    /// The state becomes `Disconnected` before this returns, even when a
    /// connection attempt is still in flight.
    pub async fn disconnect(&self) -> Result<()> {
        let session = self.inner.session.lock().take();
        let previous = self.inner.state.transition(ConnectionState::Disconnected)?;

        let Some(session) = session else {
            debug!("Disconnect requested without an active session");
            return Ok(());
        };

        let _ = session.shutdown_tx.send(true);
        if let Err(e) = session.task.await {
            error!(error = %e, "Session task ended abnormally");
        }
        self.inner.transport.close().await?;

        info!(previous = %previous, "Disconnected");
        Ok(())
    }

    /// Disconnect, stop every dispatch worker and close the lifecycle event
    /// stream
    pub async fn shutdown(&self) -> Result<()> {
        self.disconnect().await?;
        self.inner.dispatcher.stop();
        self.inner.event_tx.lock().take();
        info!("Client shut down");
        Ok(())
    }

    /// Resolve when the current session task ends
    ///
    /// Returns immediately when there is no session.
    pub async fn wait(&self) {
        let done = self
            .inner
            .session
            .lock()
            .as_ref()
            .map(|session| session.done_rx.clone());

        if let Some(mut done) = done {
            signalled(&mut done).await;
        }
    }

    /// Register a raw listener for `event`
    ///
    /// Listeners of one event run in registration order.
    pub fn on<L>(&self, event: impl Into<String>, listener: L)
    where
        L: Listener<Value>,
    {
        let event = event.into();
        self.inner.registry.register(&event, Arc::new(listener));
        debug!(event = %event, "Registered listener");
    }

    /// Register a listener receiving every inbound frame
    pub fn on_any<L>(&self, listener: L)
    where
        L: Listener<(String, Value)>,
    {
        self.inner.registry.register_catch_all(Arc::new(listener));
        debug!("Registered catch-all listener");
    }

    /// Deferred registration of a raw listener for `event`
    pub fn listener(&self, event: impl Into<String>) -> Registrar<Value> {
        self.registrar(event, |raw| Ok(raw))
    }

    /// Deferred registration of a typed listener for `event`
    ///
    /// `decoder` turns the raw payload into `T` before the listener runs; a
    /// decoder error is reported like a failing listener.
    pub fn registrar<T, D>(&self, event: impl Into<String>, decoder: D) -> Registrar<T>
    where
        D: Fn(Value) -> Result<T> + Send + Sync + 'static,
    {
        Registrar {
            client: self.clone(),
            event: event.into(),
            decoder: Arc::new(decoder),
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.registry.listener_count(event)
    }

    /// Append a stage to the emit middleware chain
    pub fn add_middleware(&self, stage: impl EmitMiddleware + 'static) {
        self.inner.pipeline.push(Arc::new(stage));
    }

    /// Send `event` to the server
    ///
    /// The emit runs through the middleware chain first; a suppressed emit
    /// returns `Ok` without touching the transport. Requires `Connected`.
    pub async fn emit(&self, event: impl Into<String>, payload: Option<Value>, ack: Option<Ack>) -> Result<()> {
        let emit = Emit {
            event: event.into(),
            payload,
            ack,
        };

        let Some(emit) = self.inner.pipeline.run(emit).await? else {
            return Ok(());
        };

        let state = self.inner.state.get();
        if state != ConnectionState::Connected {
            return Err(EventSocketError::ConnectionClosed(format!(
                "cannot emit `{}` while {state}",
                emit.event
            )));
        }

        debug!(event = %emit.event, "Emitting");
        self.inner.transport.send(emit).await?;
        self.inner.metrics.increment_sent();
        Ok(())
    }

    /// Parse a handshake frame with this client's codec
    pub fn extract_auth_from_handshake_frame(&self, frame: &str) -> Result<AuthHandshake> {
        extract_auth_from_handshake_frame(frame, self.inner.codec.as_ref())
    }

    /// Handshake of the current session; `Some` at most once per session
    pub fn take_handshake(&self) -> Option<AuthHandshake> {
        self.inner.handshake.lock().take()
    }

    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.inner.state.is_connected()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            emits_sent: self.inner.metrics.emits_sent(),
            frames_received: self.inner.metrics.frames_received(),
            reconnect_count: self.inner.metrics.reconnects(),
            listener_failures: self.inner.metrics.listener_failures(),
            frames_queued: self.inner.metrics.frames_queued(),
            connection_state: self.inner.state.get(),
        }
    }

    pub fn codec(&self) -> Arc<dyn JsonCodec> {
        Arc::clone(&self.inner.codec)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Try to receive a lifecycle event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.inner.event_rx.try_recv().ok()
    }

    /// Receive a lifecycle event (blocking)
    ///
    /// After `shutdown`, returns the events still queued and then
    /// `Err(ChannelSend)`.
    pub fn recv_event(&self) -> Result<ClientEvent> {
        self.inner
            .event_rx
            .recv()
            .map_err(|e| EventSocketError::ChannelSend(e.to_string()))
    }
}

/// Deferred registration of a listener for one wire name
///
/// Generated bindings return one of these from `<name>_registrar()`; the
/// listener is attached when `register` is called.
pub struct Registrar<T> {
    client: EventClient,
    event: String,
    decoder: Arc<dyn Fn(Value) -> Result<T> + Send + Sync>,
}

impl<T: Send + 'static> Registrar<T> {
    /// Wire name this registrar attaches to
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn register<L>(self, listener: L)
    where
        L: Listener<T>,
    {
        let Registrar {
            client,
            event,
            decoder,
        } = self;
        let listener = Arc::new(listener);

        client.on(event, move |raw: Value| {
            let decoded = decoder(raw);
            let listener = Arc::clone(&listener);
            async move {
                match decoded {
                    Ok(payload) => listener.call(payload).await,
                    Err(e) => Err(e.into()),
                }
            }
        });
    }
}

enum SessionEnd {
    Shutdown,
    Dropped,
}

/// Connection loop for one `connect` call
///
/// Owns the transitions out of `Connecting` and `Reconnecting`. An explicit
/// disconnect flips the state to `Disconnected` first, so every promotion
/// here is a compare-exchange that loses to it.
async fn run_session(
    inner: Arc<ClientInner>,
    options: ConnectOptions,
    mut shutdown_rx: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
    first_tx: oneshot::Sender<Result<()>>,
) {
    let mut first = Some(first_tx);
    let mut attempt = 0usize;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let request = connect_request(&inner, &options).await;

        for interceptor in &inner.interceptors {
            interceptor.before_connect(&request);
        }

        let opened = tokio::select! {
            opened = inner.transport.open(&request) => opened,
            _ = signalled(&mut shutdown_rx) => {
                debug!("Shutdown requested during connection attempt");
                break;
            }
        };

        for interceptor in &inner.interceptors {
            interceptor.after_connect(&request, opened.as_ref().map(|_| ()));
        }

        let failure = match opened {
            Ok(session) => {
                let promoted = inner
                    .state
                    .compare_exchange(ConnectionState::Connecting, ConnectionState::Connected)
                    .or_else(|_| {
                        inner
                            .state
                            .compare_exchange(ConnectionState::Reconnecting, ConnectionState::Connected)
                    });
                if promoted.is_err() {
                    debug!("Disconnected while the handshake completed, closing session");
                    if let Err(e) = inner.transport.close().await {
                        warn!(error = %e, "Failed to close abandoned session");
                    }
                    break;
                }

                attempt = 0;
                match extract_auth_from_handshake_frame(&session.handshake, inner.codec.as_ref()) {
                    Ok(handshake) => *inner.handshake.lock() = Some(handshake),
                    Err(e) => warn!(error = %e, "Handshake frame carried no auth data"),
                }

                info!(url = %request.url, "Connected");
                inner.publish(ClientEvent::Connected);
                if let Some(tx) = first.take() {
                    let _ = tx.send(Ok(()));
                }

                let heartbeat = inner.heartbeat.clone().map(|config| {
                    spawn_heartbeat(
                        EventClient {
                            inner: Arc::clone(&inner),
                        },
                        config,
                    )
                });

                let end = pump(&inner, session.inbound, &mut shutdown_rx).await;

                if let Some(heartbeat) = heartbeat {
                    heartbeat.stop().await;
                }
                inner.publish(ClientEvent::Disconnected);

                if matches!(end, SessionEnd::Shutdown) {
                    break;
                }
                if inner
                    .state
                    .compare_exchange(ConnectionState::Connected, ConnectionState::Reconnecting)
                    .is_err()
                {
                    break;
                }
                warn!(url = %request.url, "Session dropped");
                EventSocketError::ConnectionClosed("session dropped".to_string())
            }
            Err(e) => {
                warn!(url = %request.url, attempt, error = %e, "Connection attempt failed");
                inner.publish(ClientEvent::Error(e.to_string()));

                if first.is_some() && !options.retry {
                    let _ = inner.state.transition(ConnectionState::Disconnected);
                    if let Some(tx) = first.take() {
                        let _ = tx.send(Err(connect_failure(e)));
                    }
                    break;
                }
                if inner
                    .state
                    .compare_exchange(ConnectionState::Connecting, ConnectionState::Reconnecting)
                    .is_err()
                    && inner.state.get() != ConnectionState::Reconnecting
                {
                    break;
                }
                e
            }
        };

        let Some(delay) = inner.strategy.next_delay(attempt) else {
            let gave_up = EventSocketError::ReconnectionFailed {
                attempts: attempt,
                reason: failure.to_string(),
            };
            error!(error = %gave_up, "Giving up");
            inner.publish(ClientEvent::Error(gave_up.to_string()));
            let _ = inner.state.transition(ConnectionState::Disconnected);
            if let Some(tx) = first.take() {
                let _ = tx.send(Err(EventSocketError::Connection(gave_up.to_string())));
            }
            break;
        };

        attempt += 1;
        inner.metrics.increment_reconnects();
        inner.publish(ClientEvent::Reconnecting(attempt));
        info!(attempt, delay = ?delay, "Reconnecting");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = signalled(&mut shutdown_rx) => {
                debug!("Shutdown requested during backoff");
                break;
            }
        }
    }

    let _ = done_tx.send(true);
}

/// Failure of the first attempt as reported by `connect`
fn connect_failure(e: EventSocketError) -> EventSocketError {
    match e {
        EventSocketError::Connection(_) => e,
        other => EventSocketError::Connection(other.to_string()),
    }
}

/// Build the request for one attempt; headers are regenerated every time
async fn connect_request(inner: &ClientInner, options: &ConnectOptions) -> ConnectRequest {
    let mut headers = match &options.headers {
        Some(provider) => provider.get_headers().await,
        None => Headers::new(),
    };
    apply_default_headers(&mut headers, &inner.default_headers);

    ConnectRequest {
        url: options.url.clone(),
        headers,
        auth: options.auth.clone(),
        timeout: inner.config.request_timeout(),
        codec: Arc::clone(&inner.codec),
    }
}

/// Forward inbound frames to the dispatcher until the session ends
async fn pump(
    inner: &ClientInner,
    mut inbound: mpsc::UnboundedReceiver<InboundFrame>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> SessionEnd {
    loop {
        tokio::select! {
            frame = inbound.recv() => match frame {
                Some(frame) => {
                    debug!(event = %frame.event, "Inbound frame");
                    inner.dispatcher.dispatch(frame);
                }
                None => return SessionEnd::Dropped,
            },
            _ = signalled(shutdown_rx) => return SessionEnd::Shutdown,
        }
    }
}

/// Resolve once the flag is `true` or its sender is gone
async fn signalled(flag: &mut watch::Receiver<bool>) {
    while !*flag.borrow_and_update() {
        if flag.changed().await.is_err() {
            return;
        }
    }
}
