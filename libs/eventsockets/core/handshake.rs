use crate::traits::*;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Socket.IO namespace connect frame prefix (`40{...}`)
pub const CONNECT_FRAME_PREFIX: &str = "40";

/// Socket.IO event frame prefix (`42[...]`)
pub const EVENT_FRAME_PREFIX: &str = "42";

/// Auth data carried by the first frame of a session
#[derive(Debug, Clone, PartialEq)]
pub struct AuthHandshake {
    /// Event name when the frame was an event frame like `42["auth",{...}]`
    pub event: Option<String>,
    pub payload: Value,
}

impl AuthHandshake {
    /// Decode the payload into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_payload(self.payload.clone())
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Parse the auth payload out of a handshake frame
///
/// The frame must start with a `42` (event) or `40` (connect) packet
/// prefix and the remainder must decode with `codec`. Event frames
/// holding `["name", data...]` are split into the event name and its data;
/// bare objects are returned as they are.
pub fn extract_auth_from_handshake_frame(frame: &str, codec: &dyn JsonCodec) -> Result<AuthHandshake> {
    let (is_event, body) = if let Some(body) = frame.strip_prefix(EVENT_FRAME_PREFIX) {
        (true, body)
    } else if let Some(body) = frame.strip_prefix(CONNECT_FRAME_PREFIX) {
        (false, body)
    } else {
        return Err(EventSocketError::ProtocolDecode(format!(
            "handshake frame does not start with `{EVENT_FRAME_PREFIX}` or `{CONNECT_FRAME_PREFIX}`: {}",
            preview(frame)
        )));
    };

    let value = codec.decode(body).map_err(|e| {
        EventSocketError::ProtocolDecode(format!("handshake frame body is not valid JSON: {e}"))
    })?;

    match value {
        Value::Array(mut items) if is_event => {
            if items.is_empty() {
                return Err(EventSocketError::ProtocolDecode(
                    "handshake event frame has no event name".to_string(),
                ));
            }
            let event = match items.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(EventSocketError::ProtocolDecode(format!(
                        "handshake event name must be a string, found {other}"
                    )))
                }
            };
            Ok(AuthHandshake {
                event: Some(event),
                payload: collapse_args(items),
            })
        }
        object @ Value::Object(_) => Ok(AuthHandshake {
            event: None,
            payload: object,
        }),
        other => Err(EventSocketError::ProtocolDecode(format!(
            "handshake frame must carry an object or an event array, found {}",
            preview(&other.to_string())
        ))),
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 64;
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Auth {
        session: String,
        is_demo: u8,
    }

    #[test]
    fn test_event_frame_is_split() {
        let frame = r#"42["auth",{"session":"abc","isDemo":1}]"#;
        let handshake = extract_auth_from_handshake_frame(frame, &SerdeJsonCodec).unwrap();

        assert_eq!(handshake.event.as_deref(), Some("auth"));
        assert_eq!(
            handshake.decode::<Auth>().unwrap(),
            Auth {
                session: "abc".into(),
                is_demo: 1
            }
        );
    }

    #[test]
    fn test_bare_object_after_event_prefix() {
        let frame = r#"42{"session":"abc","isDemo":0}"#;
        let handshake = extract_auth_from_handshake_frame(frame, &SerdeJsonCodec).unwrap();
        assert_eq!(handshake.event, None);
        assert_eq!(handshake.payload, json!({"session": "abc", "isDemo": 0}));
    }

    #[test]
    fn test_connect_frame() {
        let handshake = extract_auth_from_handshake_frame(r#"40{"sid":"x1"}"#, &SerdeJsonCodec).unwrap();
        assert_eq!(handshake.payload, json!({"sid": "x1"}));
    }

    #[test]
    fn test_missing_prefix_is_protocol_error() {
        let err = extract_auth_from_handshake_frame(r#"{"sid":"x1"}"#, &SerdeJsonCodec).unwrap_err();
        assert!(matches!(err, EventSocketError::ProtocolDecode(_)));
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        let err = extract_auth_from_handshake_frame("42[\"auth\",{", &SerdeJsonCodec).unwrap_err();
        assert!(matches!(err, EventSocketError::ProtocolDecode(_)));

        let err = extract_auth_from_handshake_frame("42[]", &SerdeJsonCodec).unwrap_err();
        assert!(matches!(err, EventSocketError::ProtocolDecode(_)));
    }

    #[test]
    fn test_decode_mismatch_is_protocol_error() {
        let handshake = extract_auth_from_handshake_frame(r#"40{"sid":"x1"}"#, &SerdeJsonCodec).unwrap();
        assert!(matches!(
            handshake.decode::<Auth>(),
            Err(EventSocketError::ProtocolDecode(_))
        ));
    }
}
