//! Fragment assembler
//!
//! Reassembles a message the transport delivered in several fragments.

use bytes::{Bytes, BytesMut};

use super::{FrameFlags, Ring};

/// One buffered non-final fragment
#[derive(Debug, Clone)]
pub struct FragmentBuffer {
    pub payload: Bytes,
    pub flags: FrameFlags,
}

impl FragmentBuffer {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Outcome of pushing one fragment
#[derive(Debug, PartialEq, Eq)]
pub enum Assembly {
    /// Non-final fragment stored
    Buffered,

    /// Non-final fragment discarded because the ring is full
    Dropped,

    /// Final fragment arrived; the whole message in arrival order
    Complete(Bytes),
}

/// Accumulates fragments for the in-flight message
///
/// When the ring is full further non-final fragments are dropped, so the
/// message assembled later is incomplete and will normally fail to decode.
#[derive(Debug)]
pub struct FragmentAssembler {
    ring: Ring<FragmentBuffer>,
    /// Bytes held in `ring`
    pending_bytes: usize,
}

impl FragmentAssembler {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::with_capacity(capacity),
            pending_bytes: 0,
        }
    }

    /// Add a fragment; on the final one return the assembled message
    pub fn push_fragment(&mut self, payload: &[u8], flags: FrameFlags) -> Assembly {
        if flags.is_final {
            return Assembly::Complete(self.assemble(payload));
        }

        if self.ring.is_full() {
            tracing::debug!(
                "Fragment ring full ({} fragments), dropping {} bytes",
                self.ring.len(),
                payload.len()
            );
            return Assembly::Dropped;
        }

        let fragment = FragmentBuffer {
            payload: Bytes::copy_from_slice(payload),
            flags,
        };
        if self.ring.push(fragment).is_err() {
            return Assembly::Dropped;
        }
        self.pending_bytes += payload.len();

        Assembly::Buffered
    }

    fn assemble(&mut self, last: &[u8]) -> Bytes {
        let mut message = BytesMut::with_capacity(self.pending_bytes + last.len());
        for fragment in self.ring.drain() {
            message.extend_from_slice(&fragment.payload);
        }
        message.extend_from_slice(last);
        self.pending_bytes = 0;
        message.freeze()
    }

    /// Number of buffered fragments
    pub fn pending_fragments(&self) -> usize {
        self.ring.len()
    }

    /// Bytes buffered for the in-flight message
    pub fn pending_bytes(&self) -> usize {
        self.pending_bytes
    }

    pub fn free(&self) -> usize {
        self.ring.free()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
