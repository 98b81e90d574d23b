//! One connected peer: inbound drain, outbound drain, guaranteed cleanup.
//!
//! A [`Session`] is created by the gateway for every accepted connection and
//! consumed by [`Session::run`], which returns only once the peer is gone and
//! the hub has forgotten about it.
//!
//! ```text
//!   peer ──► PeerReader ──► inbound drain ──► HubHandle::broadcast
//!                                                     │
//!   peer ◄── PeerWriter ◄── outbound drain ◄── mailbox ◄┘  (hub fan-out)
//! ```
//!
//! # Lifecycle
//!
//! 1. Create the mailbox and register with the hub.  `register` returns once
//!    the handshake is queued, so it is always the first thing written.
//! 2. Spawn the outbound drain on its own task.
//! 3. Run the inbound drain on the calling task until the peer closes, a
//!    read fails, a payload fails to decode, or the client logs out.  The
//!    drain is abandoned as soon as the hub drops the session or the
//!    outbound drain ends, so a dropped session can no longer broadcast.
//! 4. Cleanup, whatever ended step 3: broadcast a departure for the
//!    session's user (unless the client already logged out), then
//!    unregister.  Unregistering closes the mailbox, which ends the outbound
//!    drain.
//!
//! # Trusted fields
//!
//! Clients never decide `ip`, `user`, `from` or `user_list`.  Every inbound
//! event is sanitised and re-stamped from the [`SessionContext`] before it is
//! handed to the hub.

use std::net::SocketAddr;

use chathub_core::{decode_event, Event, EventKind, ProtocolError, SessionId, WireFormat};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::application::hub::{Broadcast, HubError, HubHandle, Payload, Registration};
use crate::application::peer::{PeerError, PeerReader, PeerWriter};
use crate::domain::config::HubConfig;

/// Why a session ended abnormally.  Cleanup has already run when this is
/// returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("hub unavailable: {0}")]
    Hub(#[from] HubError),

    #[error("peer transport failed: {0}")]
    Peer(#[from] PeerError),

    #[error("malformed event from peer: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Per-session scratch state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Transport address of the peer, as written into `ip`.
    pub peer_address: String,
    /// Username; empty until login, fixed afterwards.  A login may carry
    /// an empty name.
    pub user: String,
    /// Set by the first login.
    pub logged_in: bool,
    /// Set once the client has logged out explicitly.
    pub departed: bool,
}

impl SessionContext {
    pub fn new(peer_address: impl Into<String>) -> Self {
        Self {
            peer_address: peer_address.into(),
            ..Self::default()
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Overwrites every client-controlled identity field with ours.
    fn stamp(&self, event: &mut Event) {
        event.sanitize_inbound();
        event.peer_address.clone_from(&self.peer_address);
        event.user.clone_from(&self.user);
        event.origin.clone_from(&self.user);
    }
}

/// Whether the inbound drain keeps reading after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// A single peer connection bound to a hub.
pub struct Session<R, W> {
    id: SessionId,
    reader: R,
    writer: W,
    peer_addr: SocketAddr,
    hub: HubHandle,
    format: WireFormat,
    mailbox_capacity: usize,
}

impl<R, W> Session<R, W>
where
    R: PeerReader,
    W: PeerWriter,
{
    pub fn new(
        reader: R,
        writer: W,
        peer_addr: SocketAddr,
        hub: HubHandle,
        config: &HubConfig,
    ) -> Self {
        Self {
            id: SessionId::new(),
            reader,
            writer,
            peer_addr,
            hub,
            format: config.wire_format,
            mailbox_capacity: config.mailbox_capacity,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Drives the session to completion.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Hub`] if the hub loop has stopped.
    /// - [`SessionError::Peer`] if reading from the peer failed.
    /// - [`SessionError::Protocol`] if the peer sent an undecodable payload.
    ///
    /// A clean close or an explicit logout returns `Ok(())`.
    pub async fn run(self) -> Result<(), SessionError> {
        let Session {
            id,
            mut reader,
            mut writer,
            peer_addr,
            hub,
            format,
            mailbox_capacity,
        } = self;

        let (mailbox, outbox) = mpsc::channel(mailbox_capacity);
        let (membership, mut evicted) = oneshot::channel::<()>();
        let registration = Registration {
            id,
            peer_addr,
            mailbox,
            membership,
        };
        if let Err(e) = hub.register(registration).await {
            writer.close().await;
            return Err(e.into());
        }
        info!("session {id}: open for {peer_addr}");

        let mut outbound = tokio::spawn(drain_outbound(id, outbox, writer));
        let mut outbound_done = None;

        let mut context = SessionContext::new(peer_addr.to_string());
        let inbound = tokio::select! {
            result = drain_inbound(id, &mut reader, &hub, format, &mut context) => result,
            _ = &mut evicted => {
                info!("session {id}: dropped by hub; no longer reading");
                Ok(())
            }
            joined = &mut outbound => {
                debug!("session {id}: outbound drain ended first; no longer reading");
                outbound_done = Some(joined);
                Ok(())
            }
        };
        let cleanup = cleanup(id, &hub, &context).await;

        let joined = match outbound_done {
            Some(joined) => joined,
            None => outbound.await,
        };
        if let Err(e) = joined {
            warn!("session {id}: outbound task failed: {e}");
        }

        match &inbound {
            Ok(()) => info!("session {id}: closed"),
            Err(e) => warn!("session {id}: ended: {e}"),
        }
        inbound.and(cleanup.map_err(SessionError::from))
    }
}

// ── Inbound ───────────────────────────────────────────────────────────────────

async fn drain_inbound<R: PeerReader>(
    id: SessionId,
    reader: &mut R,
    hub: &HubHandle,
    format: WireFormat,
    context: &mut SessionContext,
) -> Result<(), SessionError> {
    while let Some(frame) = reader.recv().await {
        let bytes = frame?;
        let event = decode_event(&bytes, format)?;
        if handle_event(id, hub, context, event).await? == Flow::Stop {
            break;
        }
    }
    Ok(())
}

/// Applies one inbound event.  Only `Login`, `Message` and `Logout` produce
/// a broadcast; anything else is logged and dropped.
async fn handle_event(
    id: SessionId,
    hub: &HubHandle,
    context: &mut SessionContext,
    mut event: Event,
) -> Result<Flow, HubError> {
    context.stamp(&mut event);

    match event.kind {
        EventKind::Login => {
            if context.is_logged_in() {
                warn!(
                    "session {id}: already logged in as '{}'; login ignored",
                    context.user
                );
                return Ok(Flow::Continue);
            }
            context.logged_in = true;
            context.user.clone_from(&event.body);
            event.user.clone_from(&context.user);
            event.origin.clone_from(&context.user);
            info!("session {id}: logged in as '{}'", context.user);
            hub.broadcast(Broadcast::join(context.user.clone(), event))
                .await?;
        }
        EventKind::Message => {
            debug!("session {id}: message ({} bytes)", event.body.len());
            hub.broadcast(Broadcast::relay(event)).await?;
        }
        EventKind::Logout => {
            context.departed = true;
            info!("session {id}: '{}' logged out", context.user);
            event.body.clone_from(&context.user);
            hub.broadcast(Broadcast::leave(context.user.clone(), event))
                .await?;
            hub.unregister(id).await?;
            return Ok(Flow::Stop);
        }
        EventKind::Handshake | EventKind::Other(_) => {
            debug!("session {id}: ignoring client event of type '{}'", event.kind);
        }
    }
    Ok(Flow::Continue)
}

/// Runs on every exit path of the inbound drain.
async fn cleanup(id: SessionId, hub: &HubHandle, context: &SessionContext) -> Result<(), HubError> {
    if !context.departed {
        debug!("session {id}: announcing departure of '{}'", context.user);
        let departure = Event::departure(context.peer_address.clone(), context.user.clone());
        hub.broadcast(Broadcast::leave(context.user.clone(), departure))
            .await?;
    }
    hub.unregister(id).await
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Copies the mailbox to the peer until the hub closes the mailbox or a write
/// fails.  On a write fault the mailbox is closed from this side so the
/// hub's next delivery sees it as dead.
async fn drain_outbound<W: PeerWriter>(
    id: SessionId,
    mut outbox: mpsc::Receiver<Payload>,
    mut writer: W,
) {
    while let Some(payload) = outbox.recv().await {
        if let Err(e) = writer.send(&payload).await {
            warn!("session {id}: write failed: {e}");
            break;
        }
    }
    outbox.close();
    writer.close().await;
    debug!("session {id}: outbound drain finished");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
