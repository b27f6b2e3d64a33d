//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! All integers are little-endian.
//!
//! ### Request
//! ```text
//! version (1) | id (4) | commands_count (4) | commands... | data_len (4) | data
//! ```
//!
//! ### Command
//! ```text
//! type (4) | params_len (4) | params
//! ```
//!
//! ### Response
//! ```text
//! version (1) | id (4) | data_len (4) | data
//! ```
//!
//! Every declared length is checked against the bytes that remain before it
//! is used, and decoded fields are copied out of the input buffer.

use crate::error::{DspError, Result};
use super::{Command, CommandKind, Message, PROTOCOL_VERSION};

/// Command header size: type (4) + params_len (4)
pub const COMMAND_HEADER_SIZE: usize = 8;

/// Fixed request bytes: version (1) + id (4) + commands_count (4) + data_len (4)
pub const MESSAGE_HEADER_SIZE: usize = 13;

/// Fixed response bytes: version (1) + id (4) + data_len (4)
pub const RESPONSE_HEADER_SIZE: usize = 9;

// =============================================================================
// Bounds-checked reader
// =============================================================================

/// Cursor over an input buffer that refuses to read past its end
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(DspError::Protocol(format!(
                "Incomplete {}: expected {} bytes, got {}",
                field,
                len,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn finish(&self, what: &str) -> Result<()> {
        if self.remaining() != 0 {
            return Err(DspError::Protocol(format!(
                "{}: {} trailing bytes after data",
                what,
                self.remaining()
            )));
        }
        Ok(())
    }
}

fn check_version(version: u8) -> Result<()> {
    if version != PROTOCOL_VERSION {
        return Err(DspError::UnsupportedVersion(version));
    }
    Ok(())
}

fn wire_len(len: usize, field: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        DspError::Protocol(format!("{} of {} bytes does not fit in u32", field, len))
    })
}

// =============================================================================
// Size Queries
// =============================================================================

/// Exact encoded size of a command
pub fn command_encoded_len(command: &Command) -> usize {
    COMMAND_HEADER_SIZE + command.params.len()
}

/// Exact encoded size of a request message
pub fn message_encoded_len(message: &Message) -> usize {
    MESSAGE_HEADER_SIZE
        + message.commands.iter().map(command_encoded_len).sum::<usize>()
        + message.data.len()
}

/// Exact encoded size of a response message
pub fn response_encoded_len(message: &Message) -> usize {
    RESPONSE_HEADER_SIZE + message.data.len()
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: type (4) + params_len (4) + params
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(command_encoded_len(command));
    write_command(&mut out, command)?;
    Ok(out)
}

fn write_command(out: &mut Vec<u8>, command: &Command) -> Result<()> {
    let params_len = wire_len(command.params.len(), "command params")?;
    out.extend_from_slice(&command.kind.tag().to_le_bytes());
    out.extend_from_slice(&params_len.to_le_bytes());
    out.extend_from_slice(&command.params);
    Ok(())
}

/// Decode a command from the front of `bytes`
///
/// Returns the command and number of bytes consumed
pub fn decode_command(bytes: &[u8]) -> Result<(Command, usize)> {
    let mut reader = Reader::new(bytes);
    let command = read_command(&mut reader)?;
    Ok((command, reader.pos))
}

fn read_command(reader: &mut Reader<'_>) -> Result<Command> {
    let tag = reader.u32("command type")?;
    let params_len = reader.u32("command params length")? as usize;
    let params = reader.take(params_len, "command params")?.to_vec();

    Ok(Command {
        kind: CommandKind::from_tag(tag),
        params,
    })
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request message to bytes
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    let commands_count = wire_len(message.commands.len(), "command list")?;
    let data_len = wire_len(message.data.len(), "message data")?;

    let mut out = Vec::with_capacity(message_encoded_len(message));
    out.push(message.version);
    out.extend_from_slice(&message.id.to_le_bytes());
    out.extend_from_slice(&commands_count.to_le_bytes());
    for command in &message.commands {
        write_command(&mut out, command)?;
    }
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&message.data);

    Ok(out)
}

/// Decode a complete request message
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    let mut reader = Reader::new(bytes);

    let version = reader.u8("message version")?;
    check_version(version)?;
    let id = reader.u32("message id")?;
    let commands_count = reader.u32("command count")? as usize;

    // Each command needs at least its header, so an impossible count is
    // rejected before anything is allocated for it.
    let max_commands = reader.remaining() / COMMAND_HEADER_SIZE;
    if commands_count > max_commands {
        return Err(DspError::Protocol(format!(
            "Command count {} exceeds what {} remaining bytes can hold",
            commands_count,
            reader.remaining()
        )));
    }

    let mut commands = Vec::with_capacity(commands_count);
    for _ in 0..commands_count {
        commands.push(read_command(&mut reader)?);
    }

    let data_len = reader.u32("data length")? as usize;
    let data = reader.take(data_len, "message data")?.to_vec();
    reader.finish("Request")?;

    Ok(Message {
        version,
        id,
        commands,
        data,
    })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response message to bytes
///
/// Any commands on `message` are not part of the response format and are
/// not written.
pub fn encode_response(message: &Message) -> Result<Vec<u8>> {
    let data_len = wire_len(message.data.len(), "response data")?;

    let mut out = Vec::with_capacity(response_encoded_len(message));
    out.push(message.version);
    out.extend_from_slice(&message.id.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&message.data);

    Ok(out)
}

/// Decode a complete response message
pub fn decode_response(bytes: &[u8]) -> Result<Message> {
    let mut reader = Reader::new(bytes);

    let version = reader.u8("response version")?;
    check_version(version)?;
    let id = reader.u32("response id")?;
    let data_len = reader.u32("response data length")? as usize;
    let data = reader.take(data_len, "response data")?.to_vec();
    reader.finish("Response")?;

    Ok(Message {
        version,
        id,
        commands: Vec::new(),
        data,
    })
}
