//! Session state machine
//!
//! Glues the assembler, pipeline, outbound queue and flow controller to the
//! transport's notification sequence for a single connection.

use crate::config::Config;
use crate::error::{DspError, Result};
use crate::pipeline::Pipeline;
use crate::protocol::{decode_message, encode_response};

use super::{
    Assembly, FlowAction, FlowController, FragmentAssembler, FrameFlags, OutboundQueue,
    RingEntry, Transport,
};

/// Per-session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Requests decoded, executed and encoded
    pub messages_processed: u64,

    /// Reassembled messages that failed to decode
    pub malformed_messages: u64,

    /// Requests refused by the pipeline
    pub rejected_messages: u64,

    /// Non-final fragments dropped on a full fragment ring
    pub dropped_fragments: u64,

    /// Responses dropped on a full response ring
    pub dropped_responses: u64,

    /// Unknown commands skipped
    pub skipped_commands: u64,

    /// Commands that failed on bad parameters or sample data
    pub failed_commands: u64,

    /// Response frames handed to the transport
    pub responses_written: u64,
}

/// State left when a session is torn down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stats: SessionStats,

    /// The session reached its end condition (one-shot mode)
    pub completed: bool,

    /// Responses still queued at close, now discarded
    pub unwritten_responses: usize,

    /// Fragments of an incomplete message, now discarded
    pub discarded_fragments: usize,
}

/// One connection's protocol state
pub struct Session {
    assembler: FragmentAssembler,
    outbound: OutboundQueue,
    flow: FlowController,
    pipeline: Pipeline,

    /// Mark the session completed once a final frame is written
    exit_after_response: bool,

    completed: bool,

    /// The queue head was written but not yet confirmed by the transport
    write_consume_pending: bool,

    stats: SessionStats,
}

impl Session {
    /// Connection established: create empty rings
    pub fn new(config: &Config) -> Self {
        Self::with_pipeline(config, Pipeline::from_config(config))
    }

    pub fn with_pipeline(config: &Config, pipeline: Pipeline) -> Self {
        Self {
            assembler: FragmentAssembler::new(config.ring_depth),
            outbound: OutboundQueue::new(config.ring_depth),
            flow: FlowController::new(config.flow),
            pipeline,
            exit_after_response: config.exit_after_response,
            completed: false,
            write_consume_pending: false,
            stats: SessionStats::default(),
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Data received
    ///
    /// Buffers non-final fragments. A final fragment completes the message,
    /// which is decoded, executed, and its response queued for writing.
    /// Malformed or rejected requests are dropped; the connection stays open.
    pub fn on_fragment<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &[u8],
        flags: FrameFlags,
    ) {
        match self.assembler.push_fragment(payload, flags) {
            Assembly::Buffered => {
                tracing::trace!(
                    "Buffered fragment of {} bytes ({} pending)",
                    payload.len(),
                    self.assembler.pending_bytes()
                );
                let action = self.flow.after_enqueue(self.headroom());
                if action == Some(FlowAction::Pause) {
                    // Only a writable notification can lift this pause
                    transport.request_writable();
                }
                Self::apply(transport, action);
            }
            Assembly::Dropped => {
                tracing::warn!("Fragment ring full, dropping {} byte fragment", payload.len());
                self.stats.dropped_fragments += 1;
            }
            Assembly::Complete(message) => {
                let action = self.flow.after_drain(self.headroom(), self.capacity());
                Self::apply(transport, action);
                self.process(transport, &message);
            }
        }
    }

    /// Transport ready to write
    ///
    /// Consumes the previously written head (its write is now complete),
    /// then writes the next queued response and asks to be called again.
    /// Reads resume once the response ring has drained past the resume
    /// margin, whatever the fragment ring holds. A short write is fatal for
    /// the connection.
    pub fn on_writable<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        if self.write_consume_pending {
            self.outbound.consume_head();
            self.write_consume_pending = false;
        }

        if let Some(entry) = self.outbound.peek_head() {
            let expected = entry.len();
            let flags = entry.flags();
            let written = transport.write(entry.payload(), flags)?;
            if written < expected {
                tracing::error!("Short write: {} of {} bytes", written, expected);
                return Err(DspError::ShortWrite { written, expected });
            }

            self.write_consume_pending = true;
            self.stats.responses_written += 1;
            transport.request_writable();

            if self.exit_after_response && flags.is_final {
                self.completed = true;
            }
        }

        let action = self.flow.after_drain(self.outbound.free(), self.capacity());
        Self::apply(transport, action);

        Ok(())
    }

    /// Connection closed: release everything still buffered
    pub fn on_close(self) -> SessionSummary {
        let summary = SessionSummary {
            stats: self.stats,
            completed: self.completed,
            unwritten_responses: self.outbound.len(),
            discarded_fragments: self.assembler.pending_fragments(),
        };

        if summary.unwritten_responses > 0 || summary.discarded_fragments > 0 {
            tracing::debug!(
                "Session closed with {} unwritten responses and {} buffered fragments",
                summary.unwritten_responses,
                summary.discarded_fragments
            );
        }

        summary
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn process<T: Transport + ?Sized>(&mut self, transport: &mut T, bytes: &[u8]) {
        let request = match decode_message(bytes) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Dropping malformed message of {} bytes: {}", bytes.len(), e);
                self.stats.malformed_messages += 1;
                return;
            }
        };

        let id = request.id;
        let execution = match self.pipeline.execute(request) {
            Ok(execution) => execution,
            Err(e) => {
                tracing::warn!("Request {} rejected: {}", id, e);
                self.stats.rejected_messages += 1;
                return;
            }
        };

        self.stats.skipped_commands += execution.report.skipped.len() as u64;
        self.stats.failed_commands += execution.report.failures.len() as u64;

        let payload = match encode_response(&execution.response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Dropping response {}: {}", id, e);
                self.stats.dropped_responses += 1;
                return;
            }
        };
        self.stats.messages_processed += 1;

        if !self.outbound.push(RingEntry::response(payload)) {
            tracing::warn!("Response ring is full, dropping response {}", id);
            self.stats.dropped_responses += 1;
            return;
        }

        let action = self.flow.after_enqueue(self.headroom());
        Self::apply(transport, action);
        transport.request_writable();
    }

    fn apply<T: Transport + ?Sized>(transport: &mut T, action: Option<FlowAction>) {
        match action {
            Some(FlowAction::Pause) => {
                tracing::debug!("Rings nearly full, pausing reads");
                transport.set_read_paused(true);
            }
            Some(FlowAction::Resume) => {
                tracing::debug!("Rings drained, resuming reads");
                transport.set_read_paused(false);
            }
            None => {}
        }
    }

    /// Free slots in whichever ring is fuller
    fn headroom(&self) -> usize {
        self.assembler.free().min(self.outbound.free())
    }

    fn capacity(&self) -> usize {
        self.outbound.capacity()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether reads are currently paused
    pub fn is_flow_controlled(&self) -> bool {
        self.flow.is_paused()
    }

    pub fn write_consume_pending(&self) -> bool {
        self.write_consume_pending
    }

    /// Responses queued, including one awaiting write confirmation
    pub fn queued_responses(&self) -> usize {
        self.outbound.len()
    }

    pub fn pending_fragments(&self) -> usize {
        self.assembler.pending_fragments()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
