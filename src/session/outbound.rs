//! Outbound queue
//!
//! Serialized responses waiting for the transport to become writable.

use bytes::Bytes;

use super::{FrameFlags, Ring};

/// A queued response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingEntry {
    payload: Bytes,
    flags: FrameFlags,
}

impl RingEntry {
    pub fn new(payload: impl Into<Bytes>, flags: FrameFlags) -> Self {
        Self {
            payload: payload.into(),
            flags,
        }
    }

    /// A complete binary response frame
    pub fn response(payload: Vec<u8>) -> Self {
        Self::new(payload, FrameFlags::complete_binary())
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Bounded FIFO of responses
///
/// The head stays in place while it is being written; the session consumes
/// it only once the transport confirms the write with its next writable
/// notification.
#[derive(Debug)]
pub struct OutboundQueue {
    ring: Ring<RingEntry>,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::with_capacity(capacity),
        }
    }

    /// Queue a response; `false` means the ring was full and it was dropped
    pub fn push(&mut self, entry: RingEntry) -> bool {
        self.ring.push(entry).is_ok()
    }

    /// Oldest unconsumed entry
    pub fn peek_head(&self) -> Option<&RingEntry> {
        self.ring.peek()
    }

    /// Remove the oldest entry
    pub fn consume_head(&mut self) -> Option<RingEntry> {
        self.ring.pop()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn free(&self) -> usize {
        self.ring.free()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
