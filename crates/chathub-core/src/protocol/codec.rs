//! Codec for turning an [`Event`] into a wire payload and back.
//!
//! One payload carries exactly one event.  Framing is the transport's job
//! (WebSocket already delimits messages), so the codec works on complete
//! byte slices.
//!
//! Two encodings are supported:
//!
//! | Format              | Payload                         | WebSocket frame |
//! |---------------------|---------------------------------|-----------------|
//! | [`WireFormat::Json`]    | UTF-8 JSON object           | text            |
//! | [`WireFormat::Bincode`] | bincode 1.x, fields in order | binary          |
//!
//! JSON is the default because browsers speak it natively.  Bincode is the
//! compact choice for native peers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::event::Event;

/// Errors that can occur during event encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload is not a valid JSON event.
    #[error("malformed JSON event: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is not a valid bincode event.
    #[error("malformed bincode event: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Selects the encoding used for every payload on a hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Human-readable JSON, sent as WebSocket text frames.
    #[default]
    Json,
    /// Compact bincode, sent as WebSocket binary frames.
    Bincode,
}

impl WireFormat {
    /// `true` when payloads in this format are valid UTF-8 text.
    pub fn is_text(self) -> bool {
        matches!(self, WireFormat::Json)
    }
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(WireFormat::Json),
            "bincode" => Ok(WireFormat::Bincode),
            other => Err(format!("unknown wire format '{other}' (expected json or bincode)")),
        }
    }
}

impl std::fmt::Display for WireFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireFormat::Json => f.write_str("json"),
            WireFormat::Bincode => f.write_str("bincode"),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes one [`Event`] into a payload.
///
/// # Errors
///
/// Returns [`ProtocolError`] if serialization fails.  With the current event
/// shape (strings only) neither encoder can fail in practice.
///
/// # Examples
///
/// ```rust
/// use chathub_core::{decode_event, encode_event, Event, EventKind, WireFormat};
///
/// let event = Event { kind: EventKind::Login, body: "alice".into(), ..Event::default() };
/// let bytes = encode_event(&event, WireFormat::Json).unwrap();
/// assert_eq!(decode_event(&bytes, WireFormat::Json).unwrap(), event);
/// ```
pub fn encode_event(event: &Event, format: WireFormat) -> Result<Vec<u8>, ProtocolError> {
    match format {
        WireFormat::Json => Ok(serde_json::to_vec(event)?),
        WireFormat::Bincode => Ok(bincode::serialize(event)?),
    }
}

/// Decodes one [`Event`] from a complete payload.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are not a valid event in `format`.
/// The session treats this as fatal for the connection.
pub fn decode_event(bytes: &[u8], format: WireFormat) -> Result<Event, ProtocolError> {
    match format {
        WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
        WireFormat::Bincode => Ok(bincode::deserialize(bytes)?),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::event::EventKind;

    fn login_event() -> Event {
        Event {
            peer_address: "127.0.0.1:5000".to_string(),
            user: "alice".to_string(),
            origin: "alice".to_string(),
            kind: EventKind::Login,
            body: "alice".to_string(),
            roster: vec!["alice".to_string()],
        }
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        // Arrange
        let event = login_event();

        // Act
        let bytes = encode_event(&event, WireFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        // Assert: exact keys the browser client reads
        assert_eq!(value["ip"], "127.0.0.1:5000");
        assert_eq!(value["user"], "alice");
        assert_eq!(value["from"], "alice");
        assert_eq!(value["type"], "login");
        assert_eq!(value["content"], "alice");
        assert_eq!(value["user_list"], serde_json::json!(["alice"]));
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn test_json_decode_minimal_login() {
        let event = decode_event(br#"{"type":"login","content":"bob"}"#, WireFormat::Json).unwrap();
        assert_eq!(event.kind, EventKind::Login);
        assert_eq!(event.body, "bob");
        assert!(event.user.is_empty());
        assert!(event.roster.is_empty());
    }

    #[test]
    fn test_json_decode_null_user_list_is_empty() {
        let event = decode_event(
            br#"{"type":"user","content":"hi","user_list":null}"#,
            WireFormat::Json,
        )
        .unwrap();
        assert!(event.roster.is_empty());
    }

    #[test]
    fn test_json_decode_unknown_type_is_accepted() {
        let event = decode_event(br#"{"type":"typing"}"#, WireFormat::Json).unwrap();
        assert_eq!(event.kind, EventKind::Other("typing".to_string()));
    }

    #[test]
    fn test_json_decode_garbage_is_error() {
        let result = decode_event(b"not json at all", WireFormat::Json);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_json_decode_wrong_field_type_is_error() {
        // `content` must be a string
        let result = decode_event(br#"{"type":"user","content":42}"#, WireFormat::Json);
        assert!(result.is_err());
    }

    #[test]
    fn test_bincode_preserves_every_field() {
        let event = login_event();
        let bytes = encode_event(&event, WireFormat::Bincode).unwrap();
        assert_eq!(decode_event(&bytes, WireFormat::Bincode).unwrap(), event);
    }

    #[test]
    fn test_bincode_is_smaller_than_json() {
        let event = login_event();
        let json = encode_event(&event, WireFormat::Json).unwrap();
        let compact = encode_event(&event, WireFormat::Bincode).unwrap();
        assert!(compact.len() < json.len());
    }

    #[test]
    fn test_bincode_decode_truncated_is_error() {
        let bytes = encode_event(&login_event(), WireFormat::Bincode).unwrap();
        let result = decode_event(&bytes[..bytes.len() / 2], WireFormat::Bincode);
        assert!(matches!(result, Err(ProtocolError::Bincode(_))));
    }

    #[test]
    fn test_wire_format_from_str() {
        assert_eq!("json".parse::<WireFormat>(), Ok(WireFormat::Json));
        assert_eq!("BINCODE".parse::<WireFormat>(), Ok(WireFormat::Bincode));
        assert!("xml".parse::<WireFormat>().is_err());
    }

    #[test]
    fn test_wire_format_is_text() {
        assert!(WireFormat::Json.is_text());
        assert!(!WireFormat::Bincode.is_text());
    }
}
