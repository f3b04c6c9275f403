//! Event catalog document
//!
//! ```json
//! {
//!   "on":   [{ "name": "update_stream", "event": "updateStream",
//!              "type": {"list": {"record": "UpdateStreamItem"}},
//!              "transform": { "function": "update_stream",
//!                             "input": {"list": {"tuple": ["string", "float", "float"]}},
//!                             "output": {"list": {"record": "UpdateStreamItem"}} } }],
//!   "emit": [{ "name": "subscribe_symbol", "event": "subscribeSymbol",
//!              "args": [{ "name": "asset", "type": "string" }] }]
//! }
//! ```
//!
//! Unknown fields are rejected at every level.

use crate::error::{CompileError, Result};
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("on"),
            Direction::Outbound => f.write_str("emit"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub on: Vec<InboundEntry>,
    #[serde(default)]
    pub emit: Vec<OutboundEntry>,
}

/// Event the client subscribes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundEntry {
    /// Accessor name, `on_<name>` and `<name>_registrar`
    pub name: String,
    /// Wire name
    pub event: String,
    /// Type listeners receive
    #[serde(rename = "type")]
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Pure function reshaping the wire payload into the listener type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transform {
    /// Function name inside the transforms module
    pub function: String,
    /// Wire shape the function takes
    pub input: Shape,
    pub output: Shape,
}

/// Event the client publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutboundEntry {
    /// Accessor name, `emit_<name>`
    pub name: String,
    pub event: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    /// Expected wire shape, checked against `args`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Shape>,
    /// Shape of the server's acknowledgement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub shape: Shape,
    /// Literal used when the caller passes `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Serialize the argument with serde instead of `Value::from`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cast: bool,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn inbound_events(&self) -> impl Iterator<Item = &str> {
        self.on.iter().map(|entry| entry.event.as_str())
    }

    pub fn outbound_events(&self) -> impl Iterator<Item = &str> {
        self.emit.iter().map(|entry| entry.event.as_str())
    }
}

impl OutboundEntry {
    /// Positional argument count: 0 sends no payload, 1 the bare value,
    /// more an array
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}
