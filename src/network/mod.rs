//! Network Module
//!
//! WebSocket server, client, and the transport binding for sessions.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections
//! - Each connection owns one `Session`; nothing is shared between them

mod server;
mod connection;
mod client;

pub use server::{ServeSummary, Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
