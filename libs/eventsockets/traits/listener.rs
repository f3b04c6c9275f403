use futures::future::{self, BoxFuture};
use std::future::Future;
use std::sync::Arc;

/// Outcome of a single listener invocation
pub type ListenerResult = anyhow::Result<()>;

/// Async callback invoked for every frame of the event it is registered on
///
/// Implemented for any `Fn(T) -> impl Future<Output = ListenerResult>`.
/// Synchronous closures can be wrapped with [`sync_listener`].
pub trait Listener<T>: Send + Sync + 'static {
    fn call(&self, payload: T) -> BoxFuture<'static, ListenerResult>;
}

impl<T, F, Fut> Listener<T> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ListenerResult> + Send + 'static,
    T: Send + 'static,
{
    fn call(&self, payload: T) -> BoxFuture<'static, ListenerResult> {
        Box::pin((self)(payload))
    }
}

/// Adapter running a synchronous closure as a listener
pub struct SyncListener<F> {
    f: Arc<F>,
}

/// Wrap a synchronous closure so it can be registered as a listener
pub fn sync_listener<T, F>(f: F) -> SyncListener<F>
where
    F: Fn(T) -> ListenerResult + Send + Sync + 'static,
{
    SyncListener { f: Arc::new(f) }
}

impl<T, F> Listener<T> for SyncListener<F>
where
    F: Fn(T) -> ListenerResult + Send + Sync + 'static,
    T: Send + 'static,
{
    fn call(&self, payload: T) -> BoxFuture<'static, ListenerResult> {
        let f = Arc::clone(&self.f);
        // Deferred so the closure runs inside the dispatch worker's unwind guard
        Box::pin(future::lazy(move |_| f(payload)))
    }
}
