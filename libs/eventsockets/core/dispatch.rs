//! Inbound frame dispatch
//!
//! Every wire name gets its own worker task, created on the first frame
//! that has listeners. A worker runs the listeners of one frame in
//! registration order and awaits all of them before taking the next frame
//! of that wire name. Workers of different wire names run concurrently.
//! Catch-all listeners share one additional worker.
//!
//! Worker queues are unbounded so a slow listener never stalls delivery of
//! other events; its own backlog grows instead. The backlog across all
//! queues is reported as `Metrics::frames_queued`.

use crate::core::connection_state::AtomicMetrics;
use crate::core::registry::ListenerRegistry;
use crate::traits::{InboundFrame, Listener, ListenerResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, warn};

pub struct Dispatcher {
    registry: Arc<ListenerRegistry>,
    metrics: Arc<AtomicMetrics>,
    workers: Mutex<HashMap<String, UnboundedSender<Value>>>,
    catch_all_worker: Mutex<Option<UnboundedSender<(String, Value)>>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ListenerRegistry>, metrics: Arc<AtomicMetrics>) -> Self {
        Self {
            registry,
            metrics,
            workers: Mutex::new(HashMap::new()),
            catch_all_worker: Mutex::new(None),
        }
    }

    /// Queue `frame` for its listeners
    ///
    /// Must be called from within a tokio runtime. Never blocks on listeners.
    pub fn dispatch(&self, frame: InboundFrame) {
        self.metrics.increment_received();

        let has_catch_all = self.registry.has_catch_all();
        if has_catch_all {
            let tx = self.catch_all_sender();
            self.metrics.increment_queued();
            if tx.send((frame.event.clone(), frame.payload.clone())).is_err() {
                self.metrics.decrement_queued();
                warn!(event = %frame.event, "Catch-all worker is gone, frame dropped");
            }
        }

        if self.registry.listener_count(&frame.event) == 0 {
            if !has_catch_all {
                debug!(event = %frame.event, "No listener for event");
            }
            return;
        }

        let tx = self.worker_for(&frame.event);
        self.metrics.increment_queued();
        if tx.send(frame.payload).is_err() {
            self.metrics.decrement_queued();
            warn!(event = %frame.event, "Dispatch worker is gone, frame dropped");
        }
    }

    /// Number of per-event workers started so far
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Stop all workers once they drain their queues
    pub fn stop(&self) {
        self.workers.lock().clear();
        self.catch_all_worker.lock().take();
    }

    fn worker_for(&self, event: &str) -> UnboundedSender<Value> {
        let mut workers = self.workers.lock();
        if let Some(tx) = workers.get(event) {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let (tx, rx) = unbounded_channel();
        let registry = Arc::clone(&self.registry);
        let name = event.to_string();
        tokio::spawn(run_worker(
            event.to_string(),
            rx,
            move || registry.listeners(&name),
            Arc::clone(&self.metrics),
        ));
        debug!(event = %event, "Started dispatch worker");
        workers.insert(event.to_string(), tx.clone());
        tx
    }

    fn catch_all_sender(&self) -> UnboundedSender<(String, Value)> {
        let mut slot = self.catch_all_worker.lock();
        if let Some(tx) = slot.as_ref() {
            if !tx.is_closed() {
                return tx.clone();
            }
        }

        let (tx, rx) = unbounded_channel();
        let registry = Arc::clone(&self.registry);
        tokio::spawn(run_worker(
            "*".to_string(),
            rx,
            move || registry.catch_all(),
            Arc::clone(&self.metrics),
        ));
        *slot = Some(tx.clone());
        tx
    }
}

async fn run_worker<T, S>(
    label: String,
    mut rx: UnboundedReceiver<T>,
    snapshot: S,
    metrics: Arc<AtomicMetrics>,
) where
    T: Clone + Send + 'static,
    S: Fn() -> Vec<Arc<dyn Listener<T>>> + Send + 'static,
{
    while let Some(payload) = rx.recv().await {
        metrics.decrement_queued();
        for (index, listener) in snapshot().into_iter().enumerate() {
            let started = std::panic::catch_unwind(AssertUnwindSafe(|| listener.call(payload.clone())));
            let outcome = match started {
                Ok(future) => invoke(future).await,
                Err(panic) => Err(ListenerFailure::Panicked(panic_message(&*panic))),
            };

            if let Err(failure) = outcome {
                metrics.increment_listener_failures();
                match failure {
                    ListenerFailure::Failed(e) => {
                        warn!(event = %label, listener = index, error = %e, "Listener failed")
                    }
                    ListenerFailure::Panicked(msg) => {
                        error!(event = %label, listener = index, panic = %msg, "Listener panicked")
                    }
                }
            }
        }
    }
    debug!(event = %label, "Dispatch worker exiting");
}

enum ListenerFailure {
    Failed(anyhow::Error),
    Panicked(String),
}

async fn invoke(future: BoxFuture<'static, ListenerResult>) -> Result<(), ListenerFailure> {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ListenerFailure::Failed(e)),
        Err(panic) => Err(ListenerFailure::Panicked(panic_message(&*panic))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
