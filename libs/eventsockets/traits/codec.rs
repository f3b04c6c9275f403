use crate::traits::error::{EventSocketError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Converts between frame text and the generic payload type
///
/// Resolved once when the client is built and shared by the transport,
/// handshake extraction and generated bindings.
pub trait JsonCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<String>;

    fn decode(&self, text: &str) -> Result<Value>;
}

/// `serde_json` backed codec (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn encode(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| EventSocketError::Codec(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<Value> {
        serde_json::from_str(text).map_err(|e| EventSocketError::ProtocolDecode(e.to_string()))
    }
}

/// Decode a raw payload into a typed value
///
/// Shape mismatches surface as `ProtocolDecode`.
pub fn decode_payload<T: DeserializeOwned>(raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| EventSocketError::ProtocolDecode(e.to_string()))
}

/// Coerce a typed value into the generic payload type
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| EventSocketError::Codec(e.to_string()))
}

/// Collapse event arguments into a single payload
///
/// No arguments become `null`, a single argument is passed through and
/// several arguments stay an array in wire order.
pub fn collapse_args(mut args: Vec<Value>) -> Value {
    match args.len() {
        0 => Value::Null,
        1 => args.pop().unwrap_or(Value::Null),
        _ => Value::Array(args),
    }
}
