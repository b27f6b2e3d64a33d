//! Configuration for wsdsp
//!
//! Centralized configuration with sensible defaults.

use crate::error::{DspError, Result};

/// Default depth of the per-session fragment and response rings
pub const DEFAULT_RING_DEPTH: usize = 1024;

/// Main configuration for a wsdsp server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads, i.e. max concurrently served connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    /// Largest reassembled WebSocket message accepted (bytes)
    pub max_message_size: usize,

    // -------------------------------------------------------------------------
    // Session Configuration
    // -------------------------------------------------------------------------
    /// Capacity of both the fragment ring and the response ring
    pub ring_depth: usize,

    /// Read pause/resume thresholds
    pub flow: FlowThresholds,

    /// Stop the server once a connection in one-shot mode closes
    pub exit_after_response: bool,

    // -------------------------------------------------------------------------
    // Pipeline Configuration
    // -------------------------------------------------------------------------
    /// What to do with commands whose type has no handler
    pub unknown_command_policy: UnknownCommandPolicy,
}

/// Hysteresis band for read-side flow control
///
/// Reads pause when free ring slots drop below `pause_below` and resume
/// once free slots exceed `capacity - resume_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowThresholds {
    pub pause_below: usize,
    pub resume_margin: usize,
}

impl Default for FlowThresholds {
    fn default() -> Self {
        Self {
            pause_below: 3,
            resume_margin: 5,
        }
    }
}

/// Policy for commands with an unrecognized type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCommandPolicy {
    /// Skip the command, count it, and keep executing the rest
    #[default]
    Skip,

    /// Fail the whole request; no response is queued
    Reject,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7681".to_string(),
            max_connections: 64,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            max_message_size: 16 * 1024 * 1024, // 16 MB
            ring_depth: DEFAULT_RING_DEPTH,
            flow: FlowThresholds::default(),
            exit_after_response: false,
            unknown_command_policy: UnknownCommandPolicy::Skip,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check invariants the session relies on
    pub fn validate(&self) -> Result<()> {
        if self.ring_depth == 0 {
            return Err(DspError::Config("ring_depth must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(DspError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.flow.resume_margin >= self.ring_depth {
            return Err(DspError::Config(format!(
                "resume_margin {} must be smaller than ring_depth {}",
                self.flow.resume_margin, self.ring_depth
            )));
        }

        // The resume point may not sit below the pause point
        let resume_above = self.ring_depth - self.flow.resume_margin;
        if resume_above < self.flow.pause_below {
            return Err(DspError::Config(format!(
                "flow thresholds overlap: pause below {} free, resume above {} free",
                self.flow.pause_below, resume_above
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted message (in bytes)
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.config.max_message_size = bytes;
        self
    }

    /// Set the fragment and response ring depth
    pub fn ring_depth(mut self, depth: usize) -> Self {
        self.config.ring_depth = depth;
        self
    }

    /// Set the flow control thresholds
    pub fn flow(mut self, flow: FlowThresholds) -> Self {
        self.config.flow = flow;
        self
    }

    /// Enable one-shot mode
    pub fn exit_after_response(mut self, enabled: bool) -> Self {
        self.config.exit_after_response = enabled;
        self
    }

    /// Set the unknown command policy
    pub fn unknown_command_policy(mut self, policy: UnknownCommandPolicy) -> Self {
        self.config.unknown_command_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
