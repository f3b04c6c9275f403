//! In-process transport
//!
//! Records every emit and lets the owner inject inbound frames, refuse
//! connection attempts, hold attempts open, or drop the session. Clones
//! share state, so one clone can go into the builder while another drives
//! the session from the outside.

use crate::traits::*;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Handshake frame used unless `with_handshake` sets another one
pub const DEFAULT_MEMORY_HANDSHAKE: &str = r#"40{"sid":"memory"}"#;

#[derive(Clone)]
pub struct MemoryTransport {
    shared: Arc<Shared>,
}

struct Shared {
    handshake: Mutex<String>,
    inbound: Mutex<Option<mpsc::UnboundedSender<InboundFrame>>>,
    sent: Mutex<Vec<Emit>>,
    replies: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<ConnectRequest>>,
    pending_failures: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                handshake: Mutex::new(DEFAULT_MEMORY_HANDSHAKE.to_string()),
                inbound: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
                replies: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                pending_failures: AtomicUsize::new(0),
                opens: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                gate,
            }),
        }
    }

    /// Handshake frame handed out by every subsequent `open`
    pub fn with_handshake(self, frame: impl Into<String>) -> Self {
        *self.shared.handshake.lock() = frame.into();
        self
    }

    /// Refuse the next `count` connection attempts
    pub fn fail_next_opens(&self, count: usize) {
        self.shared.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Block connection attempts until `release_opens`
    pub fn hold_opens(&self) {
        self.shared.gate.send_replace(false);
    }

    pub fn release_opens(&self) {
        self.shared.gate.send_replace(true);
    }

    /// Acknowledge emits of `event` with `payload`
    pub fn reply(&self, event: impl Into<String>, payload: Value) {
        self.shared.replies.lock().insert(event.into(), payload);
    }

    /// Deliver an inbound frame; `false` when no session is open
    pub fn push(&self, event: impl Into<String>, payload: Value) -> bool {
        match self.shared.inbound.lock().as_ref() {
            Some(tx) => tx.send(InboundFrame::new(event, payload)).is_ok(),
            None => false,
        }
    }

    /// End the current session as if the server went away
    pub fn drop_connection(&self) {
        if self.shared.inbound.lock().take().is_some() {
            debug!("Memory transport dropped its session");
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.inbound.lock().is_some()
    }

    pub fn sent(&self) -> Vec<Emit> {
        self.shared.sent.lock().clone()
    }

    /// `(event, payload)` of every emit so far
    pub fn sent_events(&self) -> Vec<(String, Option<Value>)> {
        self.shared
            .sent
            .lock()
            .iter()
            .map(|emit| (emit.event.clone(), emit.payload.clone()))
            .collect()
    }

    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ConnectRequest> {
        self.shared.requests.lock().last().cloned()
    }

    async fn gate_open(&self) {
        let mut gate = self.shared.gate.subscribe();
        while !*gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, request: &ConnectRequest) -> Result<TransportSession> {
        self.gate_open().await;
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        self.shared.requests.lock().push(request.clone());

        let refused = self
            .shared
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(EventSocketError::Connection(format!(
                "{} refused the connection",
                request.url
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.inbound.lock() = Some(tx);
        let handshake = self.shared.handshake.lock().clone();

        Ok(TransportSession {
            handshake,
            inbound: rx,
        })
    }

    async fn send(&self, emit: Emit) -> Result<()> {
        if !self.is_open() {
            return Err(EventSocketError::ConnectionClosed(format!(
                "no session to send `{}` on",
                emit.event
            )));
        }

        let reply = self.shared.replies.lock().get(&emit.event).cloned();
        if let (Some(ack), Some(reply)) = (emit.ack.clone(), reply) {
            ack.call(reply);
        }
        self.shared.sent.lock().push(emit);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        self.shared.inbound.lock().take();
        Ok(())
    }
}
