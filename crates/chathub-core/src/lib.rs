//! # chathub-core
//!
//! Shared library for ChatHub containing the event envelope, the wire codec,
//! and the roster of logged-in users.
//!
//! This crate is used by the server and by anything that wants to speak the
//! ChatHub protocol (test clients, benchmarks).  It has zero dependencies on
//! async runtimes, sockets, or WebSocket frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! ChatHub is a broadcast chat server: every connected client sends small
//! JSON records called *events* ("I am logging in as alice", "here is a chat
//! line", "I am leaving"), and the server relays each state change to every
//! other connected client.
//!
//! This crate (`chathub-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – What one message looks like ([`Event`]) and how it is
//!   turned into bytes and back (JSON for browsers, bincode for compact
//!   native peers).
//!
//! - **`domain`** – Pure state with no I/O.  The [`Roster`] is the ordered
//!   list of currently logged-in usernames; [`SessionId`] names one client
//!   connection.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `chathub_core::Event` instead of `chathub_core::protocol::event::Event`.
pub use domain::roster::Roster;
pub use domain::session_id::SessionId;
pub use protocol::codec::{decode_event, encode_event, ProtocolError, WireFormat};
pub use protocol::event::{Event, EventKind};
