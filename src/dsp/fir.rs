//! FIR filter
//!
//! Kaiser-windowed low-pass design and a streaming complex filter.

use rustfft::num_complex::Complex32;

/// Filter length of the pipeline's low-pass filter
pub const FIR_TAPS: usize = 57;

/// Normalized cutoff frequency (fraction of the sample rate)
pub const FIR_CUTOFF: f32 = 0.10;

/// Stop-band attenuation in dB
pub const FIR_STOPBAND_DB: f32 = 60.0;

/// Kaiser window shape parameter for a stop-band attenuation
fn kaiser_beta(stopband_db: f32) -> f32 {
    if stopband_db > 50.0 {
        0.1102 * (stopband_db - 8.7)
    } else if stopband_db > 21.0 {
        let a = stopband_db - 21.0;
        0.5842 * a.powf(0.4) + 0.07886 * a
    } else {
        0.0
    }
}

/// Zeroth-order modified Bessel function of the first kind
fn bessel_i0(x: f32) -> f32 {
    let half = f64::from(x) / 2.0;
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    for k in 1..64 {
        term *= half / k as f64;
        let squared = term * term;
        sum += squared;
        if squared < sum * 1e-12 {
            break;
        }
    }
    sum as f32
}

fn sinc(x: f32) -> f32 {
    if x.abs() < 1e-6 {
        1.0
    } else {
        let px = std::f32::consts::PI * x;
        px.sin() / px
    }
}

/// Design a low-pass filter of `len` taps
///
/// Windowed-sinc with a Kaiser window. Taps are left unscaled: the center
/// tap is 1.0 and the DC gain is close to `1 / (2 * cutoff)`.
pub fn kaiser_lowpass(len: usize, cutoff: f32, stopband_db: f32) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }

    let beta = kaiser_beta(stopband_db);
    let norm = bessel_i0(beta);
    let center = (len as f32 - 1.0) / 2.0;

    (0..len)
        .map(|i| {
            let t = i as f32 - center;
            let window = if len == 1 {
                1.0
            } else {
                let r = 2.0 * i as f32 / (len as f32 - 1.0) - 1.0;
                bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / norm
            };
            sinc(2.0 * cutoff * t) * window
        })
        .collect()
}

/// Streaming FIR filter over complex samples with real taps
pub struct FirFilter {
    taps: Vec<f32>,
    /// Circular window of the most recent inputs
    history: Vec<Complex32>,
    /// Index of the newest input in `history`
    head: usize,
}

impl FirFilter {
    /// Create a filter from explicit taps
    pub fn new(taps: Vec<f32>) -> Self {
        let len = taps.len().max(1);
        Self {
            taps,
            history: vec![Complex32::new(0.0, 0.0); len],
            head: 0,
        }
    }

    /// The pipeline's fixed low-pass filter
    pub fn lowpass() -> Self {
        Self::new(kaiser_lowpass(FIR_TAPS, FIR_CUTOFF, FIR_STOPBAND_DB))
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Push one input sample into the delay line
    pub fn push(&mut self, sample: Complex32) {
        self.head = (self.head + 1) % self.history.len();
        self.history[self.head] = sample;
    }

    /// Output for the current delay line contents
    pub fn execute(&self) -> Complex32 {
        let len = self.history.len();
        self.taps
            .iter()
            .enumerate()
            .fold(Complex32::new(0.0, 0.0), |acc, (k, &h)| {
                acc + self.history[(self.head + len - k) % len] * h
            })
    }

    /// Stream `input` through the filter one sample at a time
    pub fn filter(&mut self, input: &[Complex32]) -> Vec<Complex32> {
        input
            .iter()
            .map(|&x| {
                self.push(x);
                self.execute()
            })
            .collect()
    }
}
