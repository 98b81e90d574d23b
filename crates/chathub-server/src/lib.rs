//! chathub-server library crate.
//!
//! A real-time broadcast hub: many WebSocket clients connect, log in under a
//! username, and every chat line, login and logout is fanned out to every
//! connected client together with the current roster.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser / client (JSON or bincode over WebSocket)
//!         ↕
//! [chathub-server]
//!   ├── domain/           HubConfig, BackpressurePolicy
//!   ├── application/
//!   │     ├── hub/        Single coordination loop: registry, roster, fan-out
//!   │     ├── session/    Per-peer inbound/outbound drains and cleanup
//!   │     └── peer/       PeerReader / PeerWriter ports
//!   └── infrastructure/
//!         ├── ws_server/  Accept loop and /ws routing (tokio-tungstenite)
//!         ├── ws_peer/    Peer ports over a WebSocket stream
//!         └── config_file/ TOML loading
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `chathub-core`, and reaches peers
//!   only through the `peer` traits.
//! - `infrastructure` depends on all other layers plus `tokio-tungstenite`.
//!
//! # For beginners: why a hub loop instead of a lock?
//!
//! The set of connected sessions and the roster are touched by every
//! connection.  Rather than guard them with a `Mutex`, one task owns them
//! and everyone else sends it commands over a channel.  Each command runs to
//! completion before the next starts, so there is no interleaving to reason
//! about, and a slow client can never hold a lock that others need.

/// Domain layer: configuration and policy types (no I/O).
pub mod domain;

/// Application layer: hub, sessions, and peer ports.
pub mod application;

/// Infrastructure layer: WebSocket gateway and config file loading.
pub mod infrastructure;
