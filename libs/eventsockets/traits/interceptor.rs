use crate::traits::error::EventSocketError;
use crate::traits::transport::ConnectRequest;
use tracing::debug;

/// Observer for connection attempts
///
/// Registered on the builder; called around every `Transport::open`.
pub trait ConnectInterceptor: Send + Sync {
    fn before_connect(&self, request: &ConnectRequest);

    fn after_connect(&self, _request: &ConnectRequest, _outcome: Result<(), &EventSocketError>) {}
}

/// Logs each attempt's URL and headers at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl ConnectInterceptor for LoggingInterceptor {
    fn before_connect(&self, request: &ConnectRequest) {
        debug!(url = %request.url, headers = ?request.headers, "=== CONNECT ===");
    }

    fn after_connect(&self, request: &ConnectRequest, outcome: Result<(), &EventSocketError>) {
        match outcome {
            Ok(()) => debug!(url = %request.url, "=== CONNECTED ==="),
            Err(e) => debug!(url = %request.url, error = %e, "=== CONNECT FAILED ==="),
        }
    }
}
