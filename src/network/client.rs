//! WebSocket Client
//!
//! Sends DSP requests to a wsdsp server and waits for their responses.
//!
//! The server drops malformed, rejected and overflowing requests without
//! answering, so every wait for a response is bounded by a read timeout.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use tungstenite::client::IntoClientRequest;
use tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tungstenite::http::HeaderValue;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message as WsMessage, WebSocket};

use crate::error::{DspError, Result};
use crate::protocol::{decode_response, encode_message, Command, Message, SUBPROTOCOL};

/// How long `receive` waits unless told otherwise
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Request/response client over one WebSocket connection
pub struct Client {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    next_id: u32,
}

impl Client {
    /// Connect to `url` (e.g. `ws://127.0.0.1:7681`), offering the subprotocol
    pub fn connect(url: &str) -> Result<Self> {
        Self::connect_with_timeout(url, Some(DEFAULT_RESPONSE_TIMEOUT))
    }

    /// Connect with an explicit response timeout; `None` waits forever
    pub fn connect_with_timeout(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut request = url.into_client_request()?;
        request
            .headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(SUBPROTOCOL));

        let (socket, response) = tungstenite::connect(request)?;
        tracing::debug!("Connected to {} (HTTP {})", url, response.status());

        let mut client = Self { socket, next_id: 1 };
        client.set_timeout(timeout)?;
        Ok(client)
    }

    /// Change how long `receive` waits for a frame
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let MaybeTlsStream::Plain(stream) = self.socket.get_ref() {
            stream.set_read_timeout(timeout)?;
        }
        Ok(())
    }

    /// Send a request built from `commands` and `data`; returns its id
    pub fn send(&mut self, commands: Vec<Command>, data: Vec<u8>) -> Result<u32> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let message = Message::request(id, commands, data);
        self.send_message(&message)?;
        Ok(id)
    }

    /// Send an already built request
    pub fn send_message(&mut self, message: &Message) -> Result<()> {
        self.send_raw(encode_message(message)?)
    }

    /// Send arbitrary bytes as one binary message
    pub fn send_raw(&mut self, bytes: Vec<u8>) -> Result<()> {
        self.socket.send(WsMessage::Binary(bytes))?;
        Ok(())
    }

    /// Wait for the next response message
    ///
    /// Fails with `DspError::Network` when the timeout passes first.
    pub fn receive(&mut self) -> Result<Message> {
        loop {
            let frame = match self.socket.read() {
                Ok(frame) => frame,
                Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {
                    return Err(DspError::Network("timed out waiting for a response".to_string()))
                }
                Err(e) => return Err(e.into()),
            };

            match frame {
                WsMessage::Binary(data) => return decode_response(&data),
                WsMessage::Close(_) => {
                    return Err(DspError::Network("server closed the connection".to_string()))
                }
                _ => continue,
            }
        }
    }

    /// Send a request and wait for the response carrying its id
    ///
    /// Responses to other requests received in the meantime are discarded.
    pub fn request(&mut self, commands: Vec<Command>, data: Vec<u8>) -> Result<Message> {
        let id = self.send(commands, data)?;
        loop {
            let response = self.receive()?;
            if response.id == id {
                return Ok(response);
            }
            tracing::debug!("Ignoring response {} while waiting for {}", response.id, id);
        }
    }

    /// Close the connection with a proper close handshake
    pub fn close(mut self) -> Result<()> {
        self.socket.close(None)?;
        loop {
            match self.socket.read() {
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed)
                | Err(tungstenite::Error::Io(_))
                | Err(tungstenite::Error::Protocol(_)) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_timeout(error: &std::io::Error) -> bool {
    matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
