//! # wsdsp
//!
//! A WebSocket subprotocol for digital signal processing requests:
//! - Binary request/response wire format with an ordered command list
//! - Chained commands: echo, FIR low-pass filter, forward FFT
//! - Fragment reassembly and bounded response queuing per connection
//! - Read-side flow control with hysteresis
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   WebSocket Server                           │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ fragments / writable / close
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Session                                │
//! │        (FragmentAssembler, OutboundQueue, FlowController)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │  Pipeline   │
//!   │   (codec)   │          │ (commands)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │     DSP     │
//!                           │ (FFT, FIR)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod dsp;
pub mod pipeline;
pub mod session;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CommandError, DspError, Result};
pub use config::Config;
pub use pipeline::Pipeline;
pub use session::Session;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of wsdsp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
