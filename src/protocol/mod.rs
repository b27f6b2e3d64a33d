//! Protocol Module
//!
//! Defines the wire protocol for DSP requests and responses.
//!
//! ## Protocol Format (V1 - Simple Binary, little-endian)
//!
//! ### Request Format
//! ```text
//! ┌─────────┬────────┬───────────┬──────────────────────┬──────────────┬──────────┐
//! │ Ver (1) │ Id (4) │ Count (4) │ Commands[Count]      │ DataLen (4)  │   Data   │
//! └─────────┴────────┴───────────┴──────────────────────┴──────────────┴──────────┘
//! ```
//!
//! ### Command Format
//! ```text
//! ┌──────────┬──────────────┬─────────────────────────────┐
//! │ Type (4) │ ParamLen (4) │           Params            │
//! └──────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! ### Command Types
//! - 0x01: ECHO - return the current signal unchanged
//! - 0x02: FFT  - Params: sample_rate (4) + sample_width (4)
//! - 0x03: FIR  - Params: sample_rate (4) + sample_width (4)
//!
//! ### Response Format
//! ```text
//! ┌─────────┬────────┬──────────────┬─────────────────────────────┐
//! │ Ver (1) │ Id (4) │ DataLen (4)  │            Data             │
//! └─────────┴────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! Responses carry no command list, so a pipeline always ends with the
//! response it produces.

mod command;
mod message;
mod codec;

pub use command::{Command, CommandKind, SampleParams};
pub use message::Message;
pub use codec::{
    command_encoded_len, decode_command, decode_message, decode_response, encode_command,
    encode_message, encode_response, message_encoded_len, response_encoded_len,
    COMMAND_HEADER_SIZE, MESSAGE_HEADER_SIZE, RESPONSE_HEADER_SIZE,
};

/// Current version of the message format
pub const PROTOCOL_VERSION: u8 = 1;

/// WebSocket subprotocol name negotiated during the handshake
pub const SUBPROTOCOL: &str = "fs-dsp";
