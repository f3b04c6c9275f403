//! Engine.IO v4 / Socket.IO v5 text packets
//!
//! ```text
//! 0{"sid":..}      engine open            2 / 3     engine ping / pong
//! 40{auth}         namespace connect      41        namespace disconnect
//! 42["ev",a..]     event                  42<id>[..] event expecting an ack
//! 43<id>[..]       ack                    44{err}   connect error
//! ```
//!
//! Only the default namespace is spoken; a `/nsp,` prefix on inbound
//! packets is skipped. Binary packets are rejected.

use crate::traits::*;
use serde_json::Value;

/// Engine.IO pong, the reply to a server ping
pub const PONG: &str = "3";

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    Connect(Option<Value>),
    Disconnect,
    Event {
        id: Option<u64>,
        event: String,
        args: Vec<Value>,
    },
    Ack {
        id: u64,
        args: Vec<Value>,
    },
    ConnectError(Value),
}

impl Packet {
    /// Event packet carrying `payload` as its single argument
    pub fn event(event: impl Into<String>, payload: Option<Value>, id: Option<u64>) -> Self {
        Packet::Event {
            id,
            event: event.into(),
            args: payload.into_iter().collect(),
        }
    }

    pub fn encode(&self, codec: &dyn JsonCodec) -> Result<String> {
        let text = match self {
            Packet::Open(info) => format!("0{}", codec.encode(info)?),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => PONG.to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(auth)) => format!("40{}", codec.encode(auth)?),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { id, event, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(event.clone()));
                items.extend(args.iter().cloned());
                format!("42{}{}", ack_id(*id), codec.encode(&Value::Array(items))?)
            }
            Packet::Ack { id, args } => {
                format!("43{}{}", id, codec.encode(&Value::Array(args.clone()))?)
            }
            Packet::ConnectError(err) => format!("44{}", codec.encode(err)?),
        };
        Ok(text)
    }

    pub fn decode(text: &str, codec: &dyn JsonCodec) -> Result<Packet> {
        let mut chars = text.chars();
        let kind = chars
            .next()
            .ok_or_else(|| EventSocketError::ProtocolDecode("empty frame".to_string()))?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(Packet::Open(codec.decode(body)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => decode_message(body, codec),
            '5' | '6' => Ok(Packet::Noop),
            other => Err(EventSocketError::ProtocolDecode(format!(
                "unknown Engine.IO packet type `{other}`"
            ))),
        }
    }
}

fn ack_id(id: Option<u64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn decode_message(text: &str, codec: &dyn JsonCodec) -> Result<Packet> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| EventSocketError::ProtocolDecode("empty Socket.IO packet".to_string()))?;
    let body = skip_namespace(chars.as_str());

    match kind {
        '0' if body.is_empty() => Ok(Packet::Connect(None)),
        '0' => Ok(Packet::Connect(Some(codec.decode(body)?))),
        '1' => Ok(Packet::Disconnect),
        '2' => {
            let (id, json) = split_ack_id(body)?;
            let mut args = decode_array(json, codec)?;
            if args.is_empty() {
                return Err(EventSocketError::ProtocolDecode(
                    "event packet without an event name".to_string(),
                ));
            }
            match args.remove(0) {
                Value::String(event) => Ok(Packet::Event { id, event, args }),
                other => Err(EventSocketError::ProtocolDecode(format!(
                    "event name must be a string, found {other}"
                ))),
            }
        }
        '3' => {
            let (id, json) = split_ack_id(body)?;
            let id = id.ok_or_else(|| {
                EventSocketError::ProtocolDecode("ack packet without an id".to_string())
            })?;
            Ok(Packet::Ack {
                id,
                args: decode_array(json, codec)?,
            })
        }
        '4' => Ok(Packet::ConnectError(codec.decode(body)?)),
        '5' | '6' => Err(EventSocketError::ProtocolDecode(
            "binary packets are not supported".to_string(),
        )),
        other => Err(EventSocketError::ProtocolDecode(format!(
            "unknown Socket.IO packet type `{other}`"
        ))),
    }
}

fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(comma) => &body[comma + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn split_ack_id(body: &str) -> Result<(Option<u64>, &str)> {
    let digits = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
    if digits == 0 {
        return Ok((None, body));
    }
    let id = body[..digits]
        .parse()
        .map_err(|e| EventSocketError::ProtocolDecode(format!("bad ack id: {e}")))?;
    Ok((Some(id), &body[digits..]))
}

fn decode_array(json: &str, codec: &dyn JsonCodec) -> Result<Vec<Value>> {
    match codec.decode(json)? {
        Value::Array(items) => Ok(items),
        other => Err(EventSocketError::ProtocolDecode(format!(
            "expected a JSON array, found {other}"
        ))),
    }
}
