//! Pipeline Module
//!
//! Executes a request's command list and builds the response.
//!
//! ## Responsibilities
//! - Dispatch each command to its handler, left to right
//! - Chain outputs: each command consumes the signal left by the previous one
//! - Track which commands ran, were skipped, or failed
//!
//! ## Chaining
//! The current signal starts as the raw request bytes. FFT and FIR widen raw
//! bytes using the command's sample width, but reuse complex output from an
//! earlier command as-is. Whether the signal is raw or complex is tracked by
//! the pipeline itself; nothing in the wire format says so.

use crate::config::{Config, UnknownCommandPolicy};
use crate::dsp::{self, Complex32, FirFilter};
use crate::error::{CommandError, DspError, Result};
use crate::protocol::{Command, CommandKind, Message};

/// Signal flowing between commands
#[derive(Debug)]
enum Signal {
    /// Narrow interleaved I/Q bytes, as sent by the client
    Raw(Vec<u8>),

    /// Output of a previous transform
    Complex(Vec<Complex32>),
}

impl Signal {
    /// Complex samples for a transform, widening raw bytes if needed
    fn take_complex(
        &mut self,
        command: &Command,
    ) -> std::result::Result<Vec<Complex32>, CommandError> {
        let params = command.sample_params()?;
        match self {
            Signal::Raw(bytes) => dsp::widen(bytes, params.sample_width),
            Signal::Complex(samples) => Ok(std::mem::take(samples)),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Signal::Raw(bytes) => bytes,
            Signal::Complex(samples) => dsp::complex_to_bytes(&samples),
        }
    }
}

/// A command that did not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Position in the request's command list
    pub index: usize,
    pub kind: CommandKind,
    pub error: CommandError,
}

/// What happened to each command of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Commands that ran successfully
    pub executed: usize,

    /// Type tags of unknown commands that were skipped
    pub skipped: Vec<u32>,

    /// Commands that failed and were skipped
    pub failures: Vec<CommandFailure>,
}

impl ExecutionReport {
    /// True when every command ran
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

/// Result of executing one request
#[derive(Debug)]
pub struct Execution {
    pub response: Message,
    pub report: ExecutionReport,
}

/// Command dispatcher
#[derive(Debug, Clone)]
pub struct Pipeline {
    unknown_policy: UnknownCommandPolicy,
    fir_taps: Vec<f32>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(UnknownCommandPolicy::default())
    }
}

impl Pipeline {
    /// Create a pipeline with the given unknown command policy
    pub fn new(unknown_policy: UnknownCommandPolicy) -> Self {
        Self {
            unknown_policy,
            fir_taps: FirFilter::lowpass().taps().to_vec(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.unknown_command_policy)
    }

    pub fn unknown_policy(&self) -> UnknownCommandPolicy {
        self.unknown_policy
    }

    /// Execute a request
    ///
    /// The response carries the request's id. Its data is the final signal,
    /// or empty when no command produced output.
    ///
    /// Fails only under `UnknownCommandPolicy::Reject`, before any command runs.
    pub fn execute(&self, request: Message) -> Result<Execution> {
        let Message {
            id, commands, data, ..
        } = request;

        if self.unknown_policy == UnknownCommandPolicy::Reject {
            if let Some(CommandKind::Unknown(tag)) = commands
                .iter()
                .map(|c| c.kind)
                .find(|k| matches!(k, CommandKind::Unknown(_)))
            {
                return Err(DspError::UnknownCommand(tag));
            }
        }

        let mut report = ExecutionReport::default();
        let mut signal = Signal::Raw(data);
        let mut produced = false;

        for (index, command) in commands.iter().enumerate() {
            let outcome = match command.kind {
                CommandKind::Echo => Ok(()),
                CommandKind::Fft => Self::run_fft(command, &mut signal),
                CommandKind::FirFilter => self.run_fir(command, &mut signal),
                CommandKind::Unknown(tag) => {
                    tracing::warn!("Request {}: skipping unknown command type {}", id, tag);
                    report.skipped.push(tag);
                    continue;
                }
            };

            match outcome {
                Ok(()) => {
                    produced = true;
                    report.executed += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        "Request {}: command {} ({:?}) failed: {}",
                        id,
                        index,
                        command.kind,
                        error
                    );
                    report.failures.push(CommandFailure {
                        index,
                        kind: command.kind,
                        error,
                    });
                }
            }
        }

        let data = if produced { signal.into_bytes() } else { Vec::new() };

        tracing::trace!(
            "Request {}: {} commands executed, response {} bytes",
            id,
            report.executed,
            data.len()
        );

        Ok(Execution {
            response: Message::response(id, data),
            report,
        })
    }

    fn run_fft(command: &Command, signal: &mut Signal) -> std::result::Result<(), CommandError> {
        let samples = signal.take_complex(command)?;
        *signal = Signal::Complex(dsp::forward_fft(samples));
        Ok(())
    }

    fn run_fir(
        &self,
        command: &Command,
        signal: &mut Signal,
    ) -> std::result::Result<(), CommandError> {
        let samples = signal.take_complex(command)?;
        let mut filter = FirFilter::new(self.fir_taps.clone());
        *signal = Signal::Complex(filter.filter(&samples));
        Ok(())
    }
}
