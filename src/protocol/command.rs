//! Command definitions
//!
//! Represents signal-processing instructions embedded in a request.

use crate::error::CommandError;

/// Command types
///
/// The wire tag is resolved into this enum once, at decode time. Tags
/// without a handler are kept as `Unknown` so they survive a round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Echo,
    Fft,
    FirFilter,
    Unknown(u32),
}

impl CommandKind {
    pub const ECHO: u32 = 0x01;
    pub const FFT: u32 = 0x02;
    pub const FIR_FILTER: u32 = 0x03;

    /// Resolve a wire tag
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            Self::ECHO => CommandKind::Echo,
            Self::FFT => CommandKind::Fft,
            Self::FIR_FILTER => CommandKind::FirFilter,
            other => CommandKind::Unknown(other),
        }
    }

    /// Wire tag for this kind
    pub fn tag(self) -> u32 {
        match self {
            CommandKind::Echo => Self::ECHO,
            CommandKind::Fft => Self::FFT,
            CommandKind::FirFilter => Self::FIR_FILTER,
            CommandKind::Unknown(tag) => tag,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Which handler runs this command
    pub kind: CommandKind,

    /// Handler-specific parameters, kept verbatim
    pub params: Vec<u8>,
}

impl Command {
    /// Create a command with raw parameters
    pub fn new(kind: CommandKind, params: Vec<u8>) -> Self {
        Self { kind, params }
    }

    /// Echo the current signal back
    pub fn echo() -> Self {
        Self::new(CommandKind::Echo, Vec::new())
    }

    /// Forward FFT over the current signal
    pub fn fft(params: SampleParams) -> Self {
        Self::new(CommandKind::Fft, params.to_bytes().to_vec())
    }

    /// Low-pass FIR filter over the current signal
    pub fn fir_filter(params: SampleParams) -> Self {
        Self::new(CommandKind::FirFilter, params.to_bytes().to_vec())
    }

    /// Interpret the parameters as sample format parameters
    pub fn sample_params(&self) -> Result<SampleParams, CommandError> {
        SampleParams::parse(&self.params)
    }
}

/// Sample format parameters shared by the FFT and FIR commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleParams {
    /// Samples per second (informational, not used by the transforms)
    pub sample_rate: u32,

    /// Bytes per I or Q component of the raw request data
    pub sample_width: u32,
}

impl SampleParams {
    /// Encoded size: sample_rate (4) + sample_width (4)
    pub const ENCODED_LEN: usize = 8;

    pub fn new(sample_rate: u32, sample_width: u32) -> Self {
        Self {
            sample_rate,
            sample_width,
        }
    }

    /// Parse from command parameters; trailing bytes are ignored
    pub fn parse(params: &[u8]) -> Result<Self, CommandError> {
        if params.len() < Self::ENCODED_LEN {
            return Err(CommandError::ParamsTooShort {
                expected: Self::ENCODED_LEN,
                actual: params.len(),
            });
        }

        let sample_rate = u32::from_le_bytes([params[0], params[1], params[2], params[3]]);
        let sample_width = u32::from_le_bytes([params[4], params[5], params[6], params[7]]);

        Ok(Self {
            sample_rate,
            sample_width,
        })
    }

    pub fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..4].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[4..].copy_from_slice(&self.sample_width.to_le_bytes());
        out
    }
}
