//! Integration tests for the chathub-core wire format.
//!
//! These tests pin the JSON shape that existing browser clients depend on,
//! using payloads written out by hand rather than produced by the encoder.
//! If one of these fails, a deployed client just broke.

use chathub_core::{decode_event, encode_event, Event, EventKind, Roster, WireFormat};

/// A login exactly as the reference browser client sends it: every field
/// present, most of them empty, `user_list` as `null`.
const BROWSER_LOGIN: &str =
    r#"{"ip":"","user":"","from":"","type":"login","content":"alice","user_list":null}"#;

#[test]
fn test_browser_login_payload_decodes() {
    let event = decode_event(BROWSER_LOGIN.as_bytes(), WireFormat::Json).expect("decode");

    assert_eq!(event.kind, EventKind::Login);
    assert_eq!(event.body, "alice");
    assert!(event.roster.is_empty());
}

#[test]
fn test_browser_chat_payload_decodes() {
    let payload = r#"{"user":"alice","from":"alice","type":"user","content":"hello there"}"#;

    let event = decode_event(payload.as_bytes(), WireFormat::Json).expect("decode");

    assert_eq!(event.kind, EventKind::Message);
    assert_eq!(event.body, "hello there");
}

#[test]
fn test_extra_fields_are_ignored() {
    // Newer clients may add fields; the hub must keep accepting their messages.
    let payload = r#"{"type":"user","content":"hi","color":"red","ts":1700000000}"#;

    let event = decode_event(payload.as_bytes(), WireFormat::Json).expect("decode");

    assert_eq!(event.kind, EventKind::Message);
}

#[test]
fn test_empty_object_decodes_to_unknown_kind() {
    let event = decode_event(b"{}", WireFormat::Json).expect("decode");
    assert_eq!(event.kind, EventKind::Other(String::new()));
}

#[test]
fn test_json_array_payload_is_rejected() {
    assert!(decode_event(b"[1,2,3]", WireFormat::Json).is_err());
}

#[test]
fn test_hub_login_broadcast_matches_expected_json() {
    // Arrange: the event the hub emits after alice logs in as the first user
    let mut roster = Roster::new();
    roster.add("alice");
    let event = Event {
        peer_address: "127.0.0.1:40000".to_string(),
        user: "alice".to_string(),
        origin: "alice".to_string(),
        kind: EventKind::Login,
        body: "alice".to_string(),
        roster: roster.snapshot(),
    };

    // Act
    let bytes = encode_event(&event, WireFormat::Json).expect("encode");
    let actual: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");

    // Assert
    let expected = serde_json::json!({
        "ip": "127.0.0.1:40000",
        "user": "alice",
        "from": "alice",
        "type": "login",
        "content": "alice",
        "user_list": ["alice"],
    });
    assert_eq!(actual, expected);
}

#[test]
fn test_handshake_encodes_empty_roster_as_array_not_null() {
    let bytes = encode_event(&Event::handshake("127.0.0.1:1", Vec::new()), WireFormat::Json)
        .expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");

    assert_eq!(value["type"], "handshake");
    assert_eq!(value["user_list"], serde_json::json!([]));
}

#[test]
fn test_unknown_kind_survives_reencode() {
    let event = decode_event(br#"{"type":"typing","content":"..."}"#, WireFormat::Json)
        .expect("decode");

    let bytes = encode_event(&event, WireFormat::Json).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("valid JSON");

    assert_eq!(value["type"], "typing");
}

#[test]
fn test_bincode_carries_unknown_kind() {
    let event = Event {
        kind: EventKind::Other("typing".to_string()),
        ..Event::default()
    };

    let bytes = encode_event(&event, WireFormat::Bincode).expect("encode");
    let decoded = decode_event(&bytes, WireFormat::Bincode).expect("decode");

    assert_eq!(decoded.kind, EventKind::Other("typing".to_string()));
}

#[test]
fn test_json_payload_is_not_valid_bincode_event() {
    // A peer speaking the wrong format must be rejected, not misread.
    let result = decode_event(BROWSER_LOGIN.as_bytes(), WireFormat::Bincode);
    assert!(result.is_err());
}
