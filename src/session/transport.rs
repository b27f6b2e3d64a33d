//! Transport boundary
//!
//! What a session needs from the event-driven transport underneath it.

use crate::error::Result;

/// WebSocket framing markers for a fragment or an outbound write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFlags {
    pub binary: bool,
    pub first: bool,
    pub is_final: bool,
}

impl FrameFlags {
    pub fn new(binary: bool, first: bool, is_final: bool) -> Self {
        Self {
            binary,
            first,
            is_final,
        }
    }

    /// A whole binary message in a single frame
    pub fn complete_binary() -> Self {
        Self::new(true, true, true)
    }
}

/// Transport operations a session drives
///
/// Implementations must not assume a write is finished until they deliver
/// the next writable notification.
pub trait Transport {
    /// Write one frame; returns how many payload bytes were accepted
    fn write(&mut self, payload: &[u8], flags: FrameFlags) -> Result<usize>;

    /// Pause (`true`) or resume (`false`) delivery of received data
    fn set_read_paused(&mut self, paused: bool);

    /// Ask for another writable notification
    fn request_writable(&mut self);
}
