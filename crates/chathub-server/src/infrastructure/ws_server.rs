//! WebSocket gateway: accept loop, path routing, and per-session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Starting the hub coordination loop.
//! 3. Accepting incoming TCP connections.
//! 4. Upgrading each connection to a WebSocket, but only on the configured
//!    path; any other path is answered with `404 Not Found`.
//! 5. Handing each upgraded connection to a new `Session` on its own task.
//! 6. Stopping the accept loop when the `running` flag is cleared.
//!
//! The gateway carries no chat semantics.  Everything past the upgrade is
//! the application layer's business.
//!
//! # Scalability
//!
//! The accept loop never awaits a session: it spawns and moves on.  Each
//! session costs two Tokio tasks (inbound on the connection task, outbound
//! spawned by the session) plus its mailbox.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, error, info, warn};

use crate::application::hub::{Hub, HubHandle};
use crate::application::session::Session;
use crate::domain::config::HubConfig;
use crate::infrastructure::ws_peer;

/// How often the accept loop wakes up to check the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the config is invalid or the listener cannot be bound
/// (port in use, missing permission).
pub async fn run_server(config: HubConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    serve(listener, config, running).await
}

/// Serves on an already-bound listener until `running` is set to `false`.
///
/// Split out from [`run_server`] so callers can bind port 0 and read the
/// chosen address before serving.
///
/// # Errors
///
/// Returns an error if the config is invalid.
pub async fn serve(
    listener: TcpListener,
    config: HubConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    config.validate().context("invalid hub configuration")?;

    let local_addr = listener
        .local_addr()
        .context("failed to read listener address")?;
    info!(
        "chat hub listening on ws://{local_addr}{} (format={}, backpressure={}, mailbox={})",
        config.ws_path, config.wire_format, config.backpressure, config.mailbox_capacity
    );

    let (hub, hub_handle) = Hub::new(config.wire_format, config.backpressure);
    tokio::spawn(hub.run());

    let config = Arc::new(config);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Bounded wait so the flag is re-checked even when nobody connects.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let hub = hub_handle.clone();
                let cfg = Arc::clone(&config);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, hub, cfg).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    // Live sessions hold their own handles; the hub stops after the last one.
    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: HubHandle,
    config: Arc<HubConfig>,
) {
    match run_connection(stream, peer_addr, hub, &config).await {
        Ok(()) => debug!("connection {peer_addr} closed normally"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

async fn run_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: HubHandle,
    config: &HubConfig,
) -> anyhow::Result<()> {
    let ws_path = config.ws_path.as_str();
    let ws = accept_hdr_async(stream, |request: &Request, response: Response| {
        route(request, response, ws_path)
    })
    .await
    .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let (reader, writer) = ws_peer::split(ws, config.wire_format);
    let session = Session::new(reader, writer, peer_addr, hub, config);
    let id = session.id();
    session
        .run()
        .await
        .with_context(|| format!("session {id} from {peer_addr}"))
}

/// Upgrade-time routing: only `ws_path` is upgraded.
///
/// The query string is ignored, so `/ws?token=x` still matches `/ws`.
fn route(request: &Request, response: Response, ws_path: &str) -> Result<Response, ErrorResponse> {
    let path = request.uri().path();
    if path == ws_path {
        Ok(response)
    } else {
        debug!("rejecting upgrade on unknown path {path}");
        let mut not_found = ErrorResponse::new(Some(format!("no WebSocket endpoint at {path}")));
        *not_found.status_mut() = StatusCode::NOT_FOUND;
        Err(not_found)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
