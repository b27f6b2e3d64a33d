//! Forward FFT
//!
//! Unnormalized, unwindowed forward transform over complex samples.

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

/// Forward transform of `samples`, in place, returning the same buffer
pub fn forward_fft(mut samples: Vec<Complex32>) -> Vec<Complex32> {
    if samples.is_empty() {
        return samples;
    }

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(samples.len());
    fft.process(&mut samples);
    samples
}
