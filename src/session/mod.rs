//! Session Module
//!
//! Per-connection state driven by transport notifications.
//!
//! ## Components
//! - `FragmentAssembler`: buffers non-final fragments until the final one
//! - `OutboundQueue`: bounded FIFO of serialized responses awaiting write
//! - `FlowController`: pauses and resumes transport reads with hysteresis
//! - `Session`: ties them to `on_fragment` / `on_writable` / `on_close`
//!
//! ## Notification Sequence
//! ```text
//! established ──► Session::new
//! data        ──► on_fragment ──► (final) decode ─► pipeline ─► encode ─► queue
//! writable    ──► on_writable ──► deferred consume ─► write head ─► re-arm
//! closed      ──► on_close (drops everything still buffered)
//! ```
//!
//! A session is owned by exactly one caller and every method takes
//! `&mut self`, so no locking happens inside it.

mod ring;
mod transport;
mod assembler;
mod outbound;
mod flow;
mod state;

pub use ring::Ring;
pub use transport::{FrameFlags, Transport};
pub use assembler::{Assembly, FragmentAssembler, FragmentBuffer};
pub use outbound::{OutboundQueue, RingEntry};
pub use flow::{FlowAction, FlowController};
pub use state::{Session, SessionStats, SessionSummary};
