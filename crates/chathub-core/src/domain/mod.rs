//! Domain entities for ChatHub.
//!
//! This module contains pure state with no infrastructure dependencies: no
//! sockets, no async runtime, no serialization formats.  Everything here can
//! be unit-tested in isolation.

/// Ordered list of logged-in usernames.
pub mod roster;

/// Identity of one client connection.
pub mod session_id;
