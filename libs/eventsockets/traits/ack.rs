use crate::traits::codec::decode_payload;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Callback invoked with the server's acknowledgement of an emit
#[derive(Clone)]
pub struct Ack {
    callback: Arc<dyn Fn(Value) + Send + Sync>,
}

impl Ack {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn call(&self, payload: Value) {
        (self.callback)(payload)
    }
}

impl fmt::Debug for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ack(..)")
    }
}

/// Acknowledgement callback that receives a decoded value
///
/// Acknowledgements that do not decode into `T` are logged and dropped.
pub struct TypedAck<T> {
    callback: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> TypedAck<T>
where
    T: DeserializeOwned + 'static,
{
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl<T> From<TypedAck<T>> for Ack
where
    T: DeserializeOwned + 'static,
{
    fn from(typed: TypedAck<T>) -> Self {
        let callback = typed.callback;
        Ack::new(move |raw| match decode_payload::<T>(raw) {
            Ok(value) => callback(value),
            Err(e) => warn!(error = %e, "Dropping acknowledgement with unexpected shape"),
        })
    }
}
