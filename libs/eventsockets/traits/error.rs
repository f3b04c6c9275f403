use thiserror::Error;

/// Main error type for eventsockets
#[derive(Error, Debug)]
pub enum EventSocketError {
    /// The transport could not establish a session
    #[error("Connection error: {0}")]
    Connection(String),

    /// The session is gone (or never existed) when an operation needed it
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// A frame or payload did not have the expected shape
    #[error("Protocol decode error: {0}")]
    ProtocolDecode(String),

    /// An emit middleware stage failed with the `Abort` policy
    #[error("Middleware `{stage}` failed: {reason}")]
    Middleware { stage: String, reason: String },

    #[error("Reconnection failed after {attempts} attempts: {reason}")]
    ReconnectionFailed { attempts: usize, reason: String },

    /// A state transition the state machine does not allow
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Serializing an outbound value failed
    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for EventSocketError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        EventSocketError::WebSocket(err.to_string())
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for EventSocketError {
    fn from(err: crossbeam_channel::SendError<T>) -> Self {
        EventSocketError::ChannelSend(err.to_string())
    }
}

/// Result type alias for eventsockets operations
pub type Result<T> = std::result::Result<T, EventSocketError>;
