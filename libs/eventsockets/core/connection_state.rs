use crate::traits::{EventSocketError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle state of an `EventClient`
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Reconnecting = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Any state may fall back to `Disconnected`. `Connected` is only
    /// reachable through a connection attempt.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connected, Reconnecting)
                | (Reconnecting, Connected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Lock-free holder of the current `ConnectionState`
#[derive(Debug)]
pub struct AtomicConnectionState {
    state: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(initial as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move to `next` if the transition is legal from the current state
    ///
    /// Returns the previous state.
    pub fn transition(&self, next: ConnectionState) -> Result<ConnectionState> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let from = ConnectionState::from_u8(current);
            if !from.can_transition_to(next) {
                return Err(EventSocketError::InvalidState(format!(
                    "cannot move from {from} to {next}"
                )));
            }
            match self.state.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(from),
                Err(actual) => current = actual,
            }
        }
    }

    /// Atomically move from `current` to `next`
    ///
    /// Fails with the actual state when it is not `current`.
    pub fn compare_exchange(
        &self,
        current: ConnectionState,
        next: ConnectionState,
    ) -> std::result::Result<ConnectionState, ConnectionState> {
        self.state
            .compare_exchange(current as u8, next as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(ConnectionState::from_u8)
            .map_err(ConnectionState::from_u8)
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.get() == ConnectionState::Disconnected
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

/// Counters shared between the client handle and its tasks
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    emits_sent: AtomicU64,
    frames_received: AtomicU64,
    reconnects: AtomicU64,
    listener_failures: AtomicU64,
    frames_queued: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.emits_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_listener_failures(&self) {
        self.listener_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame entered a dispatch queue
    #[inline]
    pub fn increment_queued(&self) {
        self.frames_queued.fetch_add(1, Ordering::Relaxed);
    }

    /// A frame left a dispatch queue, taken by its worker or dropped
    #[inline]
    pub fn decrement_queued(&self) {
        let _ = self
            .frames_queued
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn emits_sent(&self) -> u64 {
        self.emits_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }

    pub fn listener_failures(&self) -> u64 {
        self.listener_failures.load(Ordering::Relaxed)
    }

    pub fn frames_queued(&self) -> u64 {
        self.frames_queued.load(Ordering::Relaxed)
    }
}
