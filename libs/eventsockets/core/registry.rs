use crate::traits::Listener;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Listener receiving the raw payload of one wire name
pub type RawListener = Arc<dyn Listener<Value>>;

/// Listener receiving `(wire_name, payload)` for every inbound frame
pub type CatchAllListener = Arc<dyn Listener<(String, Value)>>;

/// Wire name -> ordered listeners
///
/// Registration is append-only and survives disconnects. Readers take a
/// snapshot so registering never waits on an in-flight dispatch.
#[derive(Default)]
pub struct ListenerRegistry {
    by_event: RwLock<HashMap<String, Vec<RawListener>>>,
    catch_all: RwLock<Vec<CatchAllListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, event: &str, listener: RawListener) {
        self.by_event
            .write()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    pub fn register_catch_all(&self, listener: CatchAllListener) {
        self.catch_all.write().push(listener);
    }

    /// Listeners for `event` in registration order
    pub fn listeners(&self, event: &str) -> Vec<RawListener> {
        self.by_event.read().get(event).cloned().unwrap_or_default()
    }

    pub fn catch_all(&self) -> Vec<CatchAllListener> {
        self.catch_all.read().clone()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.by_event.read().get(event).map_or(0, Vec::len)
    }

    pub fn has_catch_all(&self) -> bool {
        !self.catch_all.read().is_empty()
    }

    /// Wire names with at least one listener
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.by_event.read().keys().cloned().collect();
        events.sort();
        events
    }
}
