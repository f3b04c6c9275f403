//! Socket.IO wire transport
//!
//! Engine.IO v4 over a single WebSocket; no long-polling, no binary
//! attachments, default namespace only.

pub mod packet;
pub mod transport;

pub use packet::Packet;
pub use transport::{SocketIoTransport, DEFAULT_PATH};
