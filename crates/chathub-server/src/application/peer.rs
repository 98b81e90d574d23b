//! Peer channel ports.
//!
//! A session needs exactly three things from its transport: receive the next
//! message, send a message, and close.  These traits describe that contract
//! so the session logic never touches WebSocket types directly.
//!
//! The two halves are separate traits because a session reads and writes on
//! different tasks: the inbound loop owns the [`PeerReader`], the outbound
//! loop owns the [`PeerWriter`].
//!
//! The production implementation lives in
//! `infrastructure::ws_peer`; tests implement the traits over in-memory
//! channels.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a peer transport.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The underlying transport failed (socket reset, protocol violation, ...).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The peer is already closed; nothing more can be written.
    #[error("peer connection closed")]
    Closed,

    /// A text payload was requested but the bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8 text")]
    NotText,
}

/// Receiving half of a duplex message channel with one peer.
#[async_trait]
pub trait PeerReader: Send {
    /// Waits for the next complete message from the peer.
    ///
    /// Returns `None` once the peer has closed the connection cleanly, and
    /// `Some(Err(_))` on a read fault.  Transport-level control traffic
    /// (pings, pongs) is handled internally and never surfaces here.
    async fn recv(&mut self) -> Option<Result<Vec<u8>, PeerError>>;
}

/// Sending half of a duplex message channel with one peer.
#[async_trait]
pub trait PeerWriter: Send + 'static {
    /// Writes one complete message to the peer.
    async fn send(&mut self, payload: &[u8]) -> Result<(), PeerError>;

    /// Closes the connection.  Errors are swallowed: the peer is going away
    /// either way.
    async fn close(&mut self);
}
