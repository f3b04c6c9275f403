use crate::socketio::packet::{Packet, PONG};
use crate::traits::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{http, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type AckMap = Arc<Mutex<HashMap<u64, Ack>>>;

/// Default Socket.IO mount path
pub const DEFAULT_PATH: &str = "socket.io";

enum Outbound {
    Text(String),
    Close,
}

struct ActiveSession {
    outbound: mpsc::UnboundedSender<Outbound>,
    acks: AckMap,
    codec: Arc<dyn JsonCodec>,
}

/// Socket.IO v5 client transport over a WebSocket (Engine.IO v4)
///
/// `open` performs the upgrade, waits for the Engine.IO open packet, sends
/// the namespace connect with the auth payload and returns the server's
/// connect reply as the handshake frame. A spawned connection task then
/// answers pings, resolves acks and forwards events.
pub struct SocketIoTransport {
    path: String,
    active: Mutex<Option<ActiveSession>>,
    next_ack_id: AtomicU64,
}

impl SocketIoTransport {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PATH)
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            active: Mutex::new(None),
            next_ack_id: AtomicU64::new(0),
        }
    }

    /// WebSocket endpoint for a service base URL
    ///
    /// `http(s)://` bases are mapped to `ws(s)://`.
    pub fn endpoint(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!(
            "{base}/{}/?EIO=4&transport=websocket",
            self.path.trim_matches('/')
        )
    }

    async fn upgrade(&self, request: &ConnectRequest) -> Result<WsStream> {
        let url = self.endpoint(&request.url);
        let mut ws_request = url
            .as_str()
            .into_client_request()
            .map_err(|e| EventSocketError::Connection(format!("invalid url {url}: {e}")))?;

        // Apply headers to request
        for (key, value) in &request.headers {
            match key.parse::<http::header::HeaderName>() {
                Ok(header_name) => match value.parse::<http::header::HeaderValue>() {
                    Ok(header_value) => {
                        ws_request.headers_mut().insert(header_name, header_value);
                    }
                    Err(_) => warn!("Invalid header value for key '{}': {}", key, value),
                },
                Err(_) => warn!("Invalid header name: {}", key),
            }
        }

        debug!(url = %url, "Opening WebSocket");
        let (stream, response) = within(request.timeout, "WebSocket upgrade", connect_async(ws_request))
            .await?
            .map_err(|e| EventSocketError::Connection(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket upgrade complete");
        Ok(stream)
    }
}

impl Default for SocketIoTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn open(&self, request: &ConnectRequest) -> Result<TransportSession> {
        let stream = self.upgrade(request).await?;
        let (mut sink, mut source) = stream.split();
        let codec = Arc::clone(&request.codec);

        let open = within(request.timeout, "Engine.IO open packet", next_text(&mut source)).await??;
        match Packet::decode(&open, codec.as_ref())? {
            Packet::Open(info) => debug!(info = %info, "Engine.IO session opened"),
            other => {
                return Err(EventSocketError::Connection(format!(
                    "expected Engine.IO open packet, got {other:?}"
                )))
            }
        }

        let connect = Packet::Connect(request.auth.clone()).encode(codec.as_ref())?;
        sink.send(Message::Text(connect)).await?;

        let handshake = within(
            request.timeout,
            "namespace connect reply",
            await_connect_reply(&mut sink, &mut source, codec.as_ref()),
        )
        .await??;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let acks: AckMap = Arc::new(Mutex::new(HashMap::new()));

        let previous = self.active.lock().replace(ActiveSession {
            outbound: outbound_tx,
            acks: Arc::clone(&acks),
            codec: Arc::clone(&codec),
        });
        if let Some(previous) = previous {
            let _ = previous.outbound.send(Outbound::Close);
        }

        tokio::spawn(connection_task(sink, source, outbound_rx, inbound_tx, acks, codec));
        info!(url = %request.url, "Socket.IO session established");

        Ok(TransportSession {
            handshake,
            inbound: inbound_rx,
        })
    }

    async fn send(&self, emit: Emit) -> Result<()> {
        let active = self.active.lock();
        let Some(session) = active.as_ref() else {
            return Err(EventSocketError::ConnectionClosed(format!(
                "no Socket.IO session to send `{}` on",
                emit.event
            )));
        };

        let id = emit.ack.map(|ack| {
            let id = self.next_ack_id.fetch_add(1, Ordering::Relaxed);
            session.acks.lock().insert(id, ack);
            id
        });
        let text = Packet::event(emit.event, emit.payload, id).encode(session.codec.as_ref())?;

        session
            .outbound
            .send(Outbound::Text(text))
            .map_err(|_| EventSocketError::ConnectionClosed("Socket.IO connection task stopped".to_string()))
    }

    async fn close(&self) -> Result<()> {
        let session = self.active.lock().take();
        if let Some(session) = session {
            let _ = session.outbound.send(Outbound::Close);
        }
        Ok(())
    }
}

async fn within<F: std::future::Future>(limit: Duration, step: &str, fut: F) -> Result<F::Output> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| EventSocketError::Timeout(format!("{step} after {limit:?}")))
}

/// Next text frame; control frames are handled by tungstenite
async fn next_text(source: &mut WsSource) -> Result<String> {
    while let Some(message) = source.next().await {
        match message? {
            Message::Text(text) => return Ok(text),
            Message::Close(frame) => {
                return Err(EventSocketError::ConnectionClosed(format!(
                    "closed during handshake: {frame:?}"
                )))
            }
            _ => {}
        }
    }
    Err(EventSocketError::ConnectionClosed(
        "stream ended during handshake".to_string(),
    ))
}

async fn await_connect_reply(sink: &mut WsSink, source: &mut WsSource, codec: &dyn JsonCodec) -> Result<String> {
    loop {
        let text = next_text(source).await?;
        match Packet::decode(&text, codec)? {
            Packet::Connect(_) => return Ok(text),
            Packet::ConnectError(err) => {
                return Err(EventSocketError::Connection(format!(
                    "server refused namespace connect: {err}"
                )))
            }
            Packet::Ping => sink.send(Message::Text(PONG.to_string())).await?,
            other => debug!(packet = ?other, "Ignoring packet before connect reply"),
        }
    }
}

async fn connection_task(
    mut sink: WsSink,
    mut source: WsSource,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: mpsc::UnboundedSender<InboundFrame>,
    acks: AckMap,
    codec: Arc<dyn JsonCodec>,
) {
    loop {
        tokio::select! {
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let packet = match Packet::decode(&text, codec.as_ref()) {
                        Ok(packet) => packet,
                        Err(e) => {
                            warn!(error = %e, "Dropping undecodable frame");
                            continue;
                        }
                    };
                    match packet {
                        Packet::Ping => {
                            if let Err(e) = sink.send(Message::Text(PONG.to_string())).await {
                                error!(error = %e, "Failed to answer ping");
                                break;
                            }
                        }
                        Packet::Event { id, event, args } => {
                            if id.is_some() {
                                debug!(event = %event, "Server requested an ack, not supported");
                            }
                            if inbound.send(InboundFrame::new(event, collapse_args(args))).is_err() {
                                debug!("Session receiver dropped");
                                break;
                            }
                        }
                        Packet::Ack { id, args } => {
                            let ack = acks.lock().remove(&id);
                            match ack {
                                Some(ack) => ack.call(collapse_args(args)),
                                None => warn!(id, "Ack for unknown id"),
                            }
                        }
                        Packet::Disconnect | Packet::Close => {
                            info!("Server closed the session");
                            break;
                        }
                        other => debug!(packet = ?other, "Ignoring packet"),
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "WebSocket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }
                None => {
                    warn!("WebSocket stream ended");
                    break;
                }
            },
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        error!(error = %e, "Failed to send frame");
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Text("41".to_string())).await;
                    let _ = sink.close().await;
                    debug!("Socket.IO session closed by client");
                    break;
                }
            },
        }
    }
    // Dropping `inbound` ends the session stream for the client
}
