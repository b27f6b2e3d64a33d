//! Sample conversion
//!
//! Converts between raw interleaved I/Q bytes and complex `f32` samples.

use rustfft::num_complex::Complex32;

use crate::error::CommandError;

/// Bytes per processed complex sample (f32 I + f32 Q)
pub const COMPLEX_SAMPLE_SIZE: usize = 8;

/// Widen raw interleaved I/Q bytes into complex samples
///
/// `n = bytes.len() / width / 2`. The payload must hold a whole number of
/// samples.
pub fn widen(bytes: &[u8], width: u32) -> Result<Vec<Complex32>, CommandError> {
    let component = match width {
        0 => return Err(CommandError::ZeroSampleWidth),
        1 | 2 | 4 => width as usize,
        other => return Err(CommandError::UnsupportedSampleWidth(other)),
    };

    let frame = component * 2;
    if bytes.len() % frame != 0 {
        return Err(CommandError::MisalignedSamples {
            len: bytes.len(),
            frame,
        });
    }

    let samples = bytes
        .chunks_exact(frame)
        .map(|iq| {
            let (i, q) = iq.split_at(component);
            Complex32::new(component_value(i), component_value(q))
        })
        .collect();

    Ok(samples)
}

fn component_value(raw: &[u8]) -> f32 {
    match raw.len() {
        1 => raw[0] as i8 as f32,
        2 => i16::from_le_bytes([raw[0], raw[1]]) as f32,
        _ => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
    }
}

/// Serialize complex samples as interleaved little-endian f32 I/Q
pub fn complex_to_bytes(samples: &[Complex32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * COMPLEX_SAMPLE_SIZE);
    for sample in samples {
        out.extend_from_slice(&sample.re.to_le_bytes());
        out.extend_from_slice(&sample.im.to_le_bytes());
    }
    out
}

/// Parse interleaved little-endian f32 I/Q back into complex samples
///
/// Returns `None` when the length is not a multiple of 8.
pub fn complex_from_bytes(bytes: &[u8]) -> Option<Vec<Complex32>> {
    if bytes.len() % COMPLEX_SAMPLE_SIZE != 0 {
        return None;
    }

    let samples = bytes
        .chunks_exact(COMPLEX_SAMPLE_SIZE)
        .map(|c| {
            Complex32::new(
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            )
        })
        .collect();

    Some(samples)
}
