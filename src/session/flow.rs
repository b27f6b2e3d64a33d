//! Flow controller
//!
//! Decides when to pause and resume transport reads.

use crate::config::FlowThresholds;

/// Change to apply to the transport's read side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Pause,
    Resume,
}

/// Read-side flow control with a hysteresis band
///
/// Pauses when free slots drop below `pause_below`, resumes once free slots
/// exceed `capacity - resume_margin`. Each transition is reported once.
#[derive(Debug)]
pub struct FlowController {
    thresholds: FlowThresholds,
    paused: bool,
}

impl FlowController {
    pub fn new(thresholds: FlowThresholds) -> Self {
        Self {
            thresholds,
            paused: false,
        }
    }

    /// Call after something was enqueued; `free` is the remaining room
    pub fn after_enqueue(&mut self, free: usize) -> Option<FlowAction> {
        if !self.paused && free < self.thresholds.pause_below {
            self.paused = true;
            return Some(FlowAction::Pause);
        }
        None
    }

    /// Call after something was written or drained
    pub fn after_drain(&mut self, free: usize, capacity: usize) -> Option<FlowAction> {
        let resume_above = capacity.saturating_sub(self.thresholds.resume_margin);
        if self.paused && free > resume_above {
            self.paused = false;
            return Some(FlowAction::Resume);
        }
        None
    }

    /// Whether reads are currently paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
