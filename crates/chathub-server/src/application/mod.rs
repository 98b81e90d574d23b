//! Application layer for chathub-server.
//!
//! The application layer holds the chat semantics: who is connected, who is
//! logged in, and which events go where.  It talks to peers only through the
//! [`peer`] ports, so every rule here can be exercised with in-memory
//! channels instead of sockets.
//!
//! # Responsibilities
//!
//! - The hub coordination loop: registry, roster, and fan-out
//! - Per-session inbound and outbound drains, including cleanup on exit
//! - The `HubError`, `SessionError` and `PeerError` types
//!
//! # What does NOT belong here?
//!
//! - Binding sockets or performing the WebSocket upgrade (infrastructure)
//! - Reading config files or CLI arguments (infrastructure / `main.rs`)

pub mod hub;
pub mod peer;
pub mod session;

pub use hub::{Broadcast, Hub, HubError, HubHandle, Mailbox, Payload, Registration, RosterUpdate};
pub use peer::{PeerError, PeerReader, PeerWriter};
pub use session::{Session, SessionContext, SessionError};
