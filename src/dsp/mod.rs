//! DSP Module
//!
//! Signal-processing primitives used by the command pipeline.
//!
//! ## Sample Formats
//! - Raw request data: interleaved I/Q components, `sample_width` bytes each
//!   (1 = i8, 2 = i16 LE, 4 = f32 LE)
//! - Processed data: interleaved `f32` I/Q (8 bytes per complex sample, LE)
//!
//! Raw components are widened to `f32` without scaling.

mod samples;
mod fft;
mod fir;

pub use rustfft::num_complex::Complex32;

pub use samples::{complex_from_bytes, complex_to_bytes, widen, COMPLEX_SAMPLE_SIZE};
pub use fft::forward_fft;
pub use fir::{kaiser_lowpass, FirFilter, FIR_CUTOFF, FIR_STOPBAND_DB, FIR_TAPS};
