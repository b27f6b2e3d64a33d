//! Connection Handler
//!
//! Runs one WebSocket connection through a `Session`.
//!
//! tungstenite reassembles fragmented WebSocket messages itself, so every
//! message reaches the session as a single final fragment, and each queued
//! response goes out as one complete frame.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tungstenite::error::ProtocolError;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tungstenite::http::HeaderValue;
use tungstenite::protocol::WebSocketConfig;
use tungstenite::{Message as WsMessage, WebSocket};

use crate::config::Config;
use crate::error::{DspError, Result};
use crate::protocol::SUBPROTOCOL;
use crate::session::{FrameFlags, Session, SessionSummary, Transport};

/// Blocking WebSocket transport
///
/// Writable notifications are modeled as a flag the connection loop drains
/// before it reads again. While reads are paused the loop does not read at
/// all; it only delivers writable notifications.
struct WsTransport {
    socket: WebSocket<TcpStream>,
    read_paused: bool,
    writable_requested: bool,
}

impl Transport for WsTransport {
    fn write(&mut self, payload: &[u8], flags: FrameFlags) -> Result<usize> {
        let frame = if flags.binary {
            WsMessage::Binary(payload.to_vec())
        } else {
            WsMessage::Text(String::from_utf8_lossy(payload).into_owned())
        };
        self.socket.send(frame)?;
        Ok(payload.len())
    }

    fn set_read_paused(&mut self, paused: bool) {
        self.read_paused = paused;
    }

    fn request_writable(&mut self) {
        self.writable_requested = true;
    }
}

/// Handles a single client connection
pub struct Connection {
    transport: WsTransport,
    session: Session,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Perform the WebSocket handshake and set up the session
    pub fn accept(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Sockets accepted from a non-blocking listener may inherit its mode
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        set_timeouts(&stream, config.read_timeout_ms, config.write_timeout_ms)?;

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(config.max_message_size);
        ws_config.max_frame_size = Some(config.max_message_size);

        let socket =
            tungstenite::accept_hdr_with_config(stream, negotiate_subprotocol, Some(ws_config))
                .map_err(|e| {
                    DspError::Network(format!(
                        "WebSocket handshake with {} failed: {}",
                        peer_addr, e
                    ))
                })?;

        Ok(Self {
            transport: WsTransport {
                socket,
                read_paused: false,
                writable_requested: false,
            },
            session: Session::new(config),
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns the session summary once the client disconnects. Fatal
    /// errors (short writes, socket failures) are returned after the
    /// session has been torn down.
    pub fn handle(mut self) -> Result<SessionSummary> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let outcome = self.serve();
        let summary = self.session.on_close();

        tracing::debug!(
            "Connection {} closed: {} processed, {} malformed, {} dropped responses",
            self.peer_addr,
            summary.stats.messages_processed,
            summary.stats.malformed_messages,
            summary.stats.dropped_responses
        );

        match outcome {
            Ok(()) => Ok(summary),
            Err(e) => {
                tracing::warn!("Connection {} failed: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    fn serve(&mut self) -> Result<()> {
        loop {
            self.flush_writes()?;

            if self.transport.read_paused {
                // Writes are drained, so nothing is left that could resume reads
                return Err(DspError::Network(format!(
                    "reads for {} stayed paused with no pending writes",
                    self.peer_addr
                )));
            }

            let message = match self.transport.socket.read() {
                Ok(message) => message,
                Err(e) if is_disconnect(&e) => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            match message {
                WsMessage::Binary(data) => {
                    self.session
                        .on_fragment(&mut self.transport, &data, FrameFlags::complete_binary());
                }
                WsMessage::Text(text) => {
                    self.session.on_fragment(
                        &mut self.transport,
                        text.as_bytes(),
                        FrameFlags::new(false, true, true),
                    );
                }
                WsMessage::Close(_) => {
                    // Send the queued close reply; the peer is going away regardless
                    let _ = self.transport.socket.flush();
                    tracing::debug!("Client {} sent close", self.peer_addr);
                    return Ok(());
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
    }

    /// Deliver writable notifications until the session stops asking
    ///
    /// Reads are paused only while something is queued or a pause is waiting
    /// for its resume check, and both keep the session asking.
    fn flush_writes(&mut self) -> Result<()> {
        while std::mem::take(&mut self.transport.writable_requested) {
            self.session.on_writable(&mut self.transport)?;
        }
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Answer with our subprotocol when the client offers it
fn negotiate_subprotocol(
    request: &Request,
    mut response: Response,
) -> std::result::Result<Response, ErrorResponse> {
    let offered = request
        .headers()
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|protocol| protocol.trim() == SUBPROTOCOL);

    if offered {
        response
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));
    }

    Ok(response)
}

fn set_timeouts(stream: &TcpStream, read_ms: u64, write_ms: u64) -> Result<()> {
    if read_ms > 0 {
        stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
    }
    if write_ms > 0 {
        stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
    }
    Ok(())
}

/// Errors that just mean the client went away
fn is_disconnect(error: &tungstenite::Error) -> bool {
    match error {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(e) => matches!(
            e.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        ),
        _ => false,
    }
}
