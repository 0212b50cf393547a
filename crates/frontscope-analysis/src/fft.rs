//! Real-input FFT and analysis windows.

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window applied to each segment before transforming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// No tapering.
    Rectangular,
    /// Periodic Hann window, `0.5 * (1 - cos(2πi / n))`.
    Hann,
}

impl Window {
    /// Multiply `buffer` by the window in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        if *self == Window::Rectangular {
            return;
        }
        let taps = self.coefficients(buffer.len());
        buffer.iter_mut().zip(taps).for_each(|(s, w)| *s *= w);
    }

    /// Window of `size` taps.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        match self {
            Window::Rectangular => vec![1.0; size],
            Window::Hann => (0..size)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
                .collect(),
        }
    }
}

/// Forward and inverse plans of one transform length.
pub struct Fft {
    forward: Arc<dyn rustfft::Fft<f32>>,
    inverse: Arc<dyn rustfft::Fft<f32>>,
    len: usize,
}

impl Fft {
    /// Plan transforms of `len` points.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
            len,
        }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.len
    }

    /// One-sided spectrum of real `input`, `len/2 + 1` bins from DC to Nyquist.
    ///
    /// Shorter input is zero-padded, longer input is cut.
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut spectrum = vec![Complex::new(0.0, 0.0); self.len];
        for (bin, &x) in spectrum.iter_mut().zip(input) {
            bin.re = x;
        }
        self.forward.process(&mut spectrum);
        spectrum.truncate(self.len / 2 + 1);
        spectrum
    }

    /// In-place forward transform of a full complex buffer.
    pub fn forward_complex(&self, buffer: &mut [Complex<f32>]) {
        self.forward.process(buffer);
    }

    /// In-place inverse transform, scaled by `1/len`.
    pub fn inverse_complex(&self, buffer: &mut [Complex<f32>]) {
        self.inverse.process(buffer);
        let scale = 1.0 / self.len as f32;
        buffer.iter_mut().for_each(|c| *c *= scale);
    }
}

/// Bin frequencies of a one-sided spectrum, `linspace(0, rate/2, bins)`.
pub fn rfft_frequencies(bins: usize, sample_rate: f32) -> Vec<f32> {
    match bins {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = sample_rate / 2.0 / (bins - 1) as f32;
            (0..bins).map(|i| i as f32 * step).collect()
        }
    }
}

/// Compute magnitude spectrum in dB, `20·log10(|X| + floor)`
pub fn magnitude_db(spectrum: &[Complex<f32>], floor: f32) -> Vec<f32> {
    spectrum
        .iter()
        .map(|c| 20.0 * (c.norm() + floor).log10())
        .collect()
}
