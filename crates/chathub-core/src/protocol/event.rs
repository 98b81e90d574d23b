//! The ChatHub event envelope.
//!
//! Every message exchanged between a client and the hub is one [`Event`]: a
//! flat record whose `type` field decides how the hub reacts.
//!
//! # Wire shape
//!
//! ```json
//! {"ip":"127.0.0.1:50312","user":"alice","from":"alice","type":"user","content":"hi","user_list":[]}
//! ```
//!
//! The Rust field names differ from the wire names; the mapping is fixed by
//! the `#[serde(rename = ...)]` attributes below and must not change, because
//! existing browser clients read these exact keys.
//!
//! # Trust boundary
//!
//! The same record travels in both directions, so nothing in the type stops a
//! client from filling in `ip` or `user_list`.  [`Event::sanitize_inbound`]
//! wipes those fields and the session then stamps its own values.

use serde::{Deserialize, Deserializer, Serialize};

// ── Event kind ────────────────────────────────────────────────────────────────

/// Discriminator carried in the `type` field.
///
/// The four known kinds have fixed wire literals.  Anything else is kept as
/// [`EventKind::Other`] so a client sending a newer or misspelled type is not
/// disconnected; the session just logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Sent by the hub to one session right after it registers.
    Handshake,
    /// Client announces its username; the hub adds it to the roster.
    Login,
    /// A chat line.  The wire literal is `"user"`.
    Message,
    /// Client (or the hub, on disconnect) announces a departure.
    Logout,
    /// Unrecognized discriminator, kept verbatim for logging.
    Other(String),
}

impl EventKind {
    /// Returns the literal used for this kind in the `type` field.
    pub fn as_wire_str(&self) -> &str {
        match self {
            EventKind::Handshake => "handshake",
            EventKind::Login => "login",
            EventKind::Message => "user",
            EventKind::Logout => "logout",
            EventKind::Other(raw) => raw,
        }
    }
}

impl Default for EventKind {
    /// An absent `type` field behaves like an unknown one.
    fn default() -> Self {
        EventKind::Other(String::new())
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "handshake" => EventKind::Handshake,
            "login" => EventKind::Login,
            "user" => EventKind::Message,
            "logout" => EventKind::Logout,
            _ => EventKind::Other(raw),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(raw) => raw,
            known => known.as_wire_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// One message exchanged between a client and the hub.
///
/// Missing fields decode to their empty defaults, so a minimal login is just
/// `{"type":"login","content":"alice"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    /// Remote address of the originating peer.  Set server-side only.
    #[serde(rename = "ip")]
    pub peer_address: String,

    /// Identifier of the originating session, assigned at login.
    pub user: String,

    /// Echo of `user`, used by receivers for attribution.
    #[serde(rename = "from")]
    pub origin: String,

    /// Drives every branching decision in the session and the hub.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Login: proposed username.  Message: chat text.  Logout: departing user.
    #[serde(rename = "content")]
    pub body: String,

    /// Snapshot of logged-in usernames.  Only meaningful on events the hub
    /// itself emits (handshake, login, logout).
    #[serde(rename = "user_list", deserialize_with = "nullable_roster")]
    pub roster: Vec<String>,
}

impl Event {
    /// Builds the event the hub sends to a freshly registered session.
    pub fn handshake(peer_address: impl Into<String>, roster: Vec<String>) -> Self {
        Self {
            peer_address: peer_address.into(),
            kind: EventKind::Handshake,
            roster,
            ..Self::default()
        }
    }

    /// Builds the logout a session emits on behalf of `user` when its peer
    /// goes away without saying goodbye.
    pub fn departure(peer_address: impl Into<String>, user: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            peer_address: peer_address.into(),
            origin: user.clone(),
            body: user.clone(),
            user,
            kind: EventKind::Logout,
            roster: Vec::new(),
        }
    }

    /// Clears every field a client is not allowed to set.
    ///
    /// `ip`, `user` and `from` are identity fields owned by the session;
    /// `user_list` is owned by the hub.  The session re-stamps identity after
    /// calling this, and the hub fills `user_list` when the roster changes.
    pub fn sanitize_inbound(&mut self) {
        self.peer_address.clear();
        self.user.clear();
        self.origin.clear();
        self.roster.clear();
    }
}

/// Accepts `"user_list": null` from JSON clients, which commonly send an
/// unset list that way.  Non-self-describing formats such as bincode always
/// carry a plain sequence, so they take the direct path.
fn nullable_roster<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    if deserializer.is_human_readable() {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    } else {
        Vec::<String>::deserialize(deserializer)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
