//! Error types for wsdsp
//!
//! Provides a unified error type for connection-level operations and a
//! separate command-level error for failures that must not abort a pipeline.

use thiserror::Error;

/// Result type alias using DspError
pub type Result<T> = std::result::Result<T, DspError>;

/// Unified error type for wsdsp operations
#[derive(Debug, Error)]
pub enum DspError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unsupported message version: {0} (expected {})", crate::protocol::PROTOCOL_VERSION)]
    UnsupportedVersion(u8),

    #[error("Unknown command type: {0}")]
    UnknownCommand(u32),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Short write: transport accepted {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of a single command inside a pipeline.
///
/// These never close the connection; the pipeline skips the command and
/// records the failure in its report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command parameters too short: expected {expected} bytes, got {actual}")]
    ParamsTooShort { expected: usize, actual: usize },

    #[error("sample width must be non-zero")]
    ZeroSampleWidth,

    #[error("unsupported sample width: {0} bytes")]
    UnsupportedSampleWidth(u32),

    #[error("payload of {len} bytes is not a whole number of {frame}-byte I/Q samples")]
    MisalignedSamples { len: usize, frame: usize },
}
