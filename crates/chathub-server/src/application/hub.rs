//! The hub: single coordination point for registry, roster, and fan-out.
//!
//! Every decision that touches shared state is made inside one task, the hub
//! loop ([`Hub::run`]).  Sessions never lock anything; they hand intake
//! commands to the loop through a [`HubHandle`] and the loop processes them
//! one at a time:
//!
//! ```text
//!   Session A ──┐                         ┌──► mailbox A ──► outbound loop A
//!   Session B ──┼─► intake (FIFO) ─► Hub ─┼──► mailbox B ──► outbound loop B
//!   Session C ──┘   register                └──► mailbox C ──► outbound loop C
//!                   unregister
//!                   broadcast
//! ```
//!
//! # Why a single loop?
//!
//! The live-session set and the roster are mutated only here, so a race
//! between two logins, or between a broadcast and a disconnect, is ruled out
//! by construction rather than by locking discipline.
//!
//! # Ordering
//!
//! The three intake operations share one FIFO channel, so commands issued by
//! one session are processed in the order it issued them (its logout
//! broadcast is always handled before its unregister).  A broadcast is
//! attempted on every live session before the next intake is looked at.
//!
//! # Backpressure
//!
//! The loop never awaits a session's I/O.  Delivery is a `try_send` into the
//! session's bounded mailbox; what happens when that mailbox is full is
//! decided by the configured [`BackpressurePolicy`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chathub_core::{encode_event, Event, Roster, SessionId, WireFormat};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::policy::BackpressurePolicy;

/// Capacity of the intake channel shared by all sessions.
const INTAKE_CAPACITY: usize = 1024;

/// One encoded event.  Shared between mailboxes so a broadcast is encoded
/// once no matter how many sessions receive it.
pub type Payload = Arc<[u8]>;

/// Sending side of a session's bounded outbound queue.
///
/// The hub holds the only sender.  Dropping it closes the mailbox, which is
/// how the hub tells a session's outbound loop to finish.
pub type Mailbox = mpsc::Sender<Payload>;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors returned by [`HubHandle`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// The hub loop is no longer running, so the intake was not accepted.
    #[error("hub coordination loop has stopped")]
    Stopped,
}

// ── Intake types ──────────────────────────────────────────────────────────────

/// Everything the hub needs to adopt a new session.
#[derive(Debug)]
pub struct Registration {
    pub id: SessionId,
    /// Transport address of the peer; becomes the `ip` field of its events.
    pub peer_addr: SocketAddr,
    /// The session's outbound mailbox.  Ownership passes to the hub.
    pub mailbox: Mailbox,
    /// Held by the hub for as long as the session is live.  Dropping it is
    /// how the session learns it has been removed, even while its outbound
    /// drain is stuck in a write.
    pub membership: oneshot::Sender<()>,
}

/// What the hub keeps per live session.
#[derive(Debug)]
struct Member {
    mailbox: Mailbox,
    _membership: oneshot::Sender<()>,
}

/// Roster change to apply before an event is fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterUpdate {
    /// Plain relay; the roster is not touched and not attached.
    Unchanged,
    /// Append the user, then attach the new snapshot.
    Join(String),
    /// Remove the user's first entry, then attach the new snapshot.
    Leave(String),
}

/// An event to fan out, plus the roster change it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub event: Event,
    pub roster_update: RosterUpdate,
}

impl Broadcast {
    /// Fan out `event` as-is.
    pub fn relay(event: Event) -> Self {
        Self {
            event,
            roster_update: RosterUpdate::Unchanged,
        }
    }

    /// Add `user` to the roster, then fan out `event` with the new roster.
    pub fn join(user: impl Into<String>, event: Event) -> Self {
        Self {
            event,
            roster_update: RosterUpdate::Join(user.into()),
        }
    }

    /// Remove `user` from the roster, then fan out `event` with the new roster.
    pub fn leave(user: impl Into<String>, event: Event) -> Self {
        Self {
            event,
            roster_update: RosterUpdate::Leave(user.into()),
        }
    }
}

/// Commands carried on the intake channel.
#[derive(Debug)]
enum Intake {
    Register {
        registration: Registration,
        accepted: oneshot::Sender<()>,
    },
    Unregister(SessionId),
    Broadcast(Broadcast),
}

// ── Delivery outcome ──────────────────────────────────────────────────────────

/// Result of one delivery attempt on one mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    /// Mailbox full under `DropMessage`; session stays live.
    Skipped,
    /// Mailbox closed, or full under `Disconnect`; session must be removed.
    Dead,
}

async fn deliver(policy: BackpressurePolicy, mailbox: &Mailbox, payload: Payload) -> Delivery {
    match mailbox.try_send(payload) {
        Ok(()) => Delivery::Delivered,
        Err(TrySendError::Closed(_)) => Delivery::Dead,
        Err(TrySendError::Full(payload)) => match policy {
            BackpressurePolicy::Disconnect => Delivery::Dead,
            BackpressurePolicy::DropMessage => Delivery::Skipped,
            BackpressurePolicy::Block => match mailbox.send(payload).await {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Dead,
            },
        },
    }
}

// ── Hub state ─────────────────────────────────────────────────────────────────

/// The state owned by the hub loop: live sessions and the roster.
///
/// Only [`Hub::run`] mutates it; the crate's unit tests drive it directly.
#[derive(Debug)]
pub(crate) struct HubState {
    sessions: HashMap<SessionId, Member>,
    roster: Roster,
    format: WireFormat,
    policy: BackpressurePolicy,
}

impl HubState {
    pub(crate) fn new(format: WireFormat, policy: BackpressurePolicy) -> Self {
        Self {
            sessions: HashMap::new(),
            roster: Roster::new(),
            format,
            policy,
        }
    }

    /// Adds a session to the live set and sends it a handshake carrying the
    /// current roster.  No other session is notified.
    pub(crate) async fn register(&mut self, registration: Registration) {
        let Registration {
            id,
            peer_addr,
            mailbox,
            membership,
        } = registration;

        let handshake = Event::handshake(peer_addr.to_string(), self.roster.snapshot());
        let payload = match self.encode(&handshake) {
            Some(payload) => payload,
            None => return,
        };

        let member = Member {
            mailbox,
            _membership: membership,
        };
        if self.sessions.insert(id, member).is_some() {
            warn!("session {id}: registered twice; previous mailbox replaced");
        }
        info!(
            "session {id}: registered from {peer_addr} ({} live)",
            self.sessions.len()
        );

        if let Some(member) = self.sessions.get(&id) {
            if deliver(self.policy, &member.mailbox, payload).await == Delivery::Dead {
                warn!("session {id}: handshake could not be delivered; dropping session");
                self.sessions.remove(&id);
            }
        }
    }

    /// Removes a session, closing its mailbox and ending its membership.
    ///
    /// Returns `false` (and does nothing else) if the session was not live.
    pub(crate) fn unregister(&mut self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some(_member) => {
                info!("session {id}: unregistered ({} live)", self.sessions.len());
                true
            }
            None => {
                debug!("session {id}: unregister ignored (not live)");
                false
            }
        }
    }

    /// Applies the roster update, then attempts delivery on every live
    /// session exactly once.  Sessions whose delivery comes back dead are
    /// removed before this returns.
    pub(crate) async fn broadcast(&mut self, broadcast: Broadcast) {
        let Broadcast {
            mut event,
            roster_update,
        } = broadcast;

        match roster_update {
            RosterUpdate::Unchanged => {}
            RosterUpdate::Join(user) => {
                self.roster.add(user);
                event.roster = self.roster.snapshot();
            }
            RosterUpdate::Leave(user) => {
                if !self.roster.remove(&user) {
                    debug!("roster: '{user}' was not present");
                }
                event.roster = self.roster.snapshot();
            }
        }

        let payload = match self.encode(&event) {
            Some(payload) => payload,
            None => return,
        };

        let mut dead = Vec::new();
        let mut skipped = 0usize;
        for (id, member) in &self.sessions {
            match deliver(self.policy, &member.mailbox, Arc::clone(&payload)).await {
                Delivery::Delivered => {}
                Delivery::Skipped => skipped += 1,
                Delivery::Dead => dead.push(*id),
            }
        }

        for id in &dead {
            self.sessions.remove(id);
            warn!("session {id}: mailbox full or closed; disconnected");
        }

        debug!(
            "broadcast '{}' to {} session(s), {} skipped, {} dropped",
            event.kind,
            self.sessions.len(),
            skipped,
            dead.len()
        );
    }

    pub(crate) fn is_live(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn roster(&self) -> &Roster {
        &self.roster
    }

    fn encode(&self, event: &Event) -> Option<Payload> {
        match encode_event(event, self.format) {
            Ok(bytes) => Some(Arc::from(bytes)),
            Err(e) => {
                error!("failed to encode '{}' event: {e}", event.kind);
                None
            }
        }
    }

    async fn handle(&mut self, intake: Intake) {
        match intake {
            Intake::Register {
                registration,
                accepted,
            } => {
                self.register(registration).await;
                // The registering session may have given up waiting; that is fine.
                let _ = accepted.send(());
            }
            Intake::Unregister(id) => {
                self.unregister(id);
            }
            Intake::Broadcast(broadcast) => self.broadcast(broadcast).await,
        }
    }
}

// ── Hub loop ──────────────────────────────────────────────────────────────────

/// The coordination loop.  Create with [`Hub::new`], then drive with
/// [`Hub::run`] on its own task (or use [`Hub::spawn`]).
pub struct Hub {
    state: HubState,
    intake: mpsc::Receiver<Intake>,
}

impl Hub {
    /// Creates the hub and the first handle to it.
    pub fn new(format: WireFormat, policy: BackpressurePolicy) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(INTAKE_CAPACITY);
        let hub = Self {
            state: HubState::new(format, policy),
            intake: rx,
        };
        (hub, HubHandle { intake: tx })
    }

    /// Creates the hub and runs it on a new Tokio task.
    pub fn spawn(format: WireFormat, policy: BackpressurePolicy) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(format, policy);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Processes intake commands one at a time until every [`HubHandle`] has
    /// been dropped.
    pub async fn run(mut self) {
        info!(
            "hub started (format={}, backpressure={})",
            self.state.format, self.state.policy
        );
        while let Some(intake) = self.intake.recv().await {
            self.state.handle(intake).await;
        }
        info!(
            "hub stopped; closing {} remaining mailbox(es)",
            self.state.live_count()
        );
    }
}

/// Cloneable handle to the hub loop: the three intake points.
#[derive(Debug, Clone)]
pub struct HubHandle {
    intake: mpsc::Sender<Intake>,
}

impl HubHandle {
    /// Hands a new session to the hub and waits until the hub has added it
    /// to the live set and queued its handshake.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub loop has exited.
    pub async fn register(&self, registration: Registration) -> Result<(), HubError> {
        let (accepted, ack) = oneshot::channel();
        self.send(Intake::Register {
            registration,
            accepted,
        })
        .await?;
        ack.await.map_err(|_| HubError::Stopped)
    }

    /// Asks the hub to drop a session.  Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub loop has exited.
    pub async fn unregister(&self, id: SessionId) -> Result<(), HubError> {
        self.send(Intake::Unregister(id)).await
    }

    /// Queues an event for fan-out to every live session.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Stopped`] if the hub loop has exited.
    pub async fn broadcast(&self, broadcast: Broadcast) -> Result<(), HubError> {
        self.send(Intake::Broadcast(broadcast)).await
    }

    async fn send(&self, intake: Intake) -> Result<(), HubError> {
        self.intake.send(intake).await.map_err(|_| HubError::Stopped)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
