//! Common test utilities for EventSockets integration tests
//!
//! Provides a scripted Socket.IO server on a local port and helpers for
//! waiting on asynchronous listener output.

#![allow(dead_code)]

use eventsockets::{Packet, SerdeJsonCodec, Value};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// What the mock server observed
#[derive(Debug, Default, Clone)]
pub struct ServerLog {
    pub paths: Vec<String>,
    pub headers: Vec<HashMap<String, String>>,
    pub auths: Vec<Option<Value>>,
    pub events: Vec<(String, Vec<Value>)>,
    pub pongs: usize,
    pub disconnects: usize,
}

/// Minimal Socket.IO v5 server
///
/// Per connection: sends the Engine.IO open packet, answers the namespace
/// connect (or refuses it), pings once, echoes `echo` events and
/// acknowledges every event that asks for it with `["ack", args...]`.
pub struct MockSocketIoServer {
    pub addr: SocketAddr,
    log: Arc<Mutex<ServerLog>>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>,
    shutdown: Arc<Notify>,
}

impl MockSocketIoServer {
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Server that answers every namespace connect with `44{...}`
    pub async fn start_refusing() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(refuse: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(ServerLog::default()));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(Notify::new());

        let accept_log = Arc::clone(&log);
        let accept_connections = Arc::clone(&connections);
        let accept_shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => match result {
                        Ok((stream, _)) => {
                            let log = Arc::clone(&accept_log);
                            let connections = Arc::clone(&accept_connections);
                            tokio::spawn(handle_connection(stream, log, connections, refuse));
                        }
                        Err(e) => {
                            eprintln!("Accept error: {}", e);
                            break;
                        }
                    },
                    _ = accept_shutdown.notified() => break,
                }
            }
        });

        Self {
            addr,
            log,
            connections,
            shutdown,
        }
    }

    /// Base URL for this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn log(&self) -> ServerLog {
        self.log.lock().clone()
    }

    /// Send a raw text frame to every live connection
    pub fn push(&self, text: &str) {
        self.connections
            .lock()
            .retain(|tx| tx.send(Message::Text(text.to_string())).is_ok());
    }

    /// Close every live connection from the server side
    pub fn kick(&self) {
        for tx in self.connections.lock().drain(..) {
            let _ = tx.send(Message::Close(None));
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

impl Drop for MockSocketIoServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_connection(
    stream: TcpStream,
    log: Arc<Mutex<ServerLog>>,
    connections: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>,
    refuse: bool,
) {
    let handshake_log = Arc::clone(&log);
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let headers = request
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let mut log = handshake_log.lock();
        log.paths.push(request.uri().to_string());
        log.headers.push(headers);
        Ok(response)
    };

    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };
    let (mut write, mut read) = ws.split();
    let codec = SerdeJsonCodec;

    let open = r#"0{"sid":"engine-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
    if write.send(Message::Text(open.to_string())).await.is_err() {
        return;
    }

    let (push_tx, mut push_rx) = mpsc::unbounded_channel();
    let mut namespace_open = false;

    loop {
        tokio::select! {
            message = read.next() => {
                let text = match message {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };

                let packet = match Packet::decode(&text, &codec) {
                    Ok(packet) => packet,
                    Err(_) => continue,
                };

                let mut replies = Vec::new();
                match packet {
                    Packet::Connect(auth) => {
                        log.lock().auths.push(auth);
                        if refuse {
                            replies.push(r#"44{"message":"not authorized"}"#.to_string());
                        } else {
                            namespace_open = true;
                            connections.lock().push(push_tx.clone());
                            replies.push(r#"40{"sid":"socket-1"}"#.to_string());
                            replies.push("2".to_string());
                        }
                    }
                    Packet::Pong => log.lock().pongs += 1,
                    Packet::Disconnect => {
                        log.lock().disconnects += 1;
                        break;
                    }
                    Packet::Event { id, event, args } if namespace_open => {
                        log.lock().events.push((event.clone(), args.clone()));
                        if event == "echo" {
                            replies.push(Packet::Event { id: None, event, args: args.clone() }.encode(&codec).unwrap());
                        }
                        if let Some(id) = id {
                            let mut ack_args = vec![Value::String("ack".to_string())];
                            ack_args.extend(args);
                            replies.push(Packet::Ack { id, args: ack_args }.encode(&codec).unwrap());
                        }
                    }
                    _ => {}
                }

                for reply in replies {
                    if write.send(Message::Text(reply)).await.is_err() {
                        return;
                    }
                }
            }
            pushed = push_rx.recv() => match pushed {
                Some(Message::Close(frame)) => {
                    let _ = write.send(Message::Close(frame)).await;
                    break;
                }
                Some(message) => {
                    if write.send(message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

/// Poll `condition` until it holds or `limit` passes
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
