//! WebSocket implementation of the peer ports.
//!
//! [`split`] takes an upgraded `WebSocketStream` and returns the two halves a
//! `Session` needs.  Framing follows the hub's wire format:
//!
//! | Wire format | Frames written | Frames accepted     |
//! |-------------|----------------|---------------------|
//! | `json`      | text           | text or binary      |
//! | `bincode`   | binary         | text or binary      |
//!
//! Either frame type is accepted on read; the decoder rejects bytes it cannot
//! parse.
//!
//! Ping/pong control frames never reach the session.  tungstenite queues the
//! pong reply itself and flushes it on the next read or write.

use async_trait::async_trait;
use chathub_core::WireFormat;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::error::ProtocolError as WsProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use crate::application::peer::{PeerError, PeerReader, PeerWriter};

/// Receiving half of a WebSocket peer.
pub struct WsReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

/// Sending half of a WebSocket peer.
pub struct WsWriter<S> {
    sink: SplitSink<WebSocketStream<S>, WsMessage>,
    format: WireFormat,
}

/// Splits an upgraded WebSocket into session-ready halves.
pub fn split<S>(ws: WebSocketStream<S>, format: WireFormat) -> (WsReader<S>, WsWriter<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    (WsReader { stream }, WsWriter { sink, format })
}

fn transport_error(e: WsError) -> PeerError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => PeerError::Closed,
        other => PeerError::Transport(Box::new(other)),
    }
}

#[async_trait]
impl<S> PeerReader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Result<Vec<u8>, PeerError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => return Some(Ok(text.into_bytes())),
                Ok(WsMessage::Binary(bytes)) => return Some(Ok(bytes)),
                Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => continue,
                Ok(WsMessage::Close(frame)) => {
                    debug!("peer sent close frame: {frame:?}");
                    return None;
                }
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(WsError::Protocol(WsProtocolError::ResetWithoutClosingHandshake)) => {
                    debug!("peer dropped the connection without a close frame");
                    return None;
                }
                Err(e) => return Some(Err(transport_error(e))),
            }
        }
    }
}

#[async_trait]
impl<S> PeerWriter for WsWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, payload: &[u8]) -> Result<(), PeerError> {
        let message = if self.format.is_text() {
            let text = std::str::from_utf8(payload).map_err(|_| PeerError::NotText)?;
            WsMessage::Text(text.to_owned())
        } else {
            WsMessage::Binary(payload.to_vec())
        };
        self.sink.send(message).await.map_err(transport_error)
    }

    async fn close(&mut self) {
        if let Err(e) = self.sink.close().await {
            debug!("WebSocket close failed: {e}");
        }
    }
}
