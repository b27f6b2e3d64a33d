//! Message definitions
//!
//! A full request or response exchanged with a client.

use super::{Command, PROTOCOL_VERSION};

/// A request or response message
///
/// Requests carry an ordered command list; responses never do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Version of the message format
    pub version: u8,

    /// Tracking identifier, echoed unchanged in the response
    pub id: u32,

    /// Commands applied left to right (request side only)
    pub commands: Vec<Command>,

    /// Raw sample bytes the commands operate on
    pub data: Vec<u8>,
}

impl Message {
    /// Create a request message
    pub fn request(id: u32, commands: Vec<Command>, data: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            id,
            commands,
            data,
        }
    }

    /// Create a response message answering request `id`
    pub fn response(id: u32, data: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            id,
            commands: Vec::new(),
            data,
        }
    }
}
