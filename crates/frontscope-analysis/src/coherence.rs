//! Magnitude-squared coherence by Welch's method.
//!
//! ```text
//! Cxy(f) = |Pxy(f)|² / (Pxx(f) · Pyy(f))
//! ```
//!
//! Spectral densities are averaged over overlapping segments. Each segment
//! has its mean removed, is multiplied by the window and transformed at the
//! segment length, and only the one-sided spectrum is kept. Absolute PSD
//! scaling cancels in the ratio and is not applied.

use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, Window, rfft_frequencies};
use rustfft::num_complex::Complex;
use serde::Serialize;

/// Coherence spectrum of one channel pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coherence {
    /// Bin frequencies in Hz, DC to Nyquist.
    pub frequencies: Vec<f32>,
    /// Coherence per bin, in `[0, 1]`.
    pub values: Vec<f32>,
    /// Number of segments averaged.
    pub segments: usize,
}

impl Coherence {
    /// Mean coherence over all bins.
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }

    /// Mean coherence between `low_hz` and `high_hz` inclusive.
    pub fn band_mean(&self, low_hz: f32, high_hz: f32) -> Option<f32> {
        let (sum, count) = self
            .frequencies
            .iter()
            .zip(self.values.iter())
            .filter(|(f, _)| (low_hz..=high_hz).contains(*f))
            .fold((0.0f32, 0usize), |(s, n), (_, &v)| (s + v, n + 1));
        (count > 0).then(|| sum / count as f32)
    }
}

/// Welch coherence estimator with a fixed segment layout.
#[derive(Debug, Clone)]
pub struct CoherenceAnalyzer {
    sample_rate: f32,
    segment_len: usize,
    hop: usize,
    window: Window,
}

impl CoherenceAnalyzer {
    /// Create an analyzer with `segment_len`-sample periodic Hann segments
    /// overlapping by half.
    pub fn new(sample_rate: f32, segment_len: usize) -> Result<Self> {
        Self::with_overlap(sample_rate, segment_len, 0.5)
    }

    /// Create an analyzer with an explicit overlap ratio in `[0, 1)`.
    pub fn with_overlap(sample_rate: f32, segment_len: usize, overlap: f32) -> Result<Self> {
        if segment_len < 2 {
            return Err(AnalysisError::invalid(
                "segment_len",
                format!("{segment_len} is below the minimum of 2"),
            ));
        }
        if !(0.0..1.0).contains(&overlap) {
            return Err(AnalysisError::invalid(
                "overlap",
                format!("{overlap} is outside [0, 1)"),
            ));
        }
        if sample_rate <= 0.0 {
            return Err(AnalysisError::invalid(
                "sample_rate",
                format!("{sample_rate} must be positive"),
            ));
        }

        // Overlap is rounded down in samples, so half of an odd length keeps
        // the larger hop.
        let noverlap = (segment_len as f32 * overlap) as usize;
        Ok(Self {
            sample_rate,
            segment_len,
            hop: segment_len - noverlap,
            window: Window::Hann,
        })
    }

    /// Segment length in samples.
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Hop between segment starts in samples.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of complete segments that fit in `len` samples.
    pub fn num_segments(&self, len: usize) -> usize {
        if len < self.segment_len {
            0
        } else {
            (len - self.segment_len) / self.hop + 1
        }
    }

    /// Estimate the coherence between `x` and `y`.
    ///
    /// Both signals must have the same length and hold at least one segment.
    pub fn analyze(&self, x: &[f32], y: &[f32]) -> Result<Coherence> {
        if x.len() != y.len() {
            return Err(AnalysisError::LengthMismatch {
                a: x.len(),
                b: y.len(),
            });
        }
        let segments = self.num_segments(x.len());
        if segments == 0 {
            return Err(AnalysisError::SignalTooShort {
                len: x.len(),
                window: self.segment_len,
            });
        }

        let n = self.segment_len;
        let fft = Fft::new(n);
        let window = self.window.coefficients(n);
        let bins = n / 2 + 1;

        let mut pxx = vec![0.0f64; bins];
        let mut pyy = vec![0.0f64; bins];
        let mut pxy = vec![Complex::new(0.0f64, 0.0); bins];

        for seg in 0..segments {
            let start = seg * self.hop;
            let sx = self.prepare(&x[start..start + n], &window, &fft);
            let sy = self.prepare(&y[start..start + n], &window, &fft);

            for i in 0..bins {
                let a = Complex::new(sx[i].re as f64, sx[i].im as f64);
                let b = Complex::new(sy[i].re as f64, sy[i].im as f64);
                pxx[i] += a.norm_sqr();
                pyy[i] += b.norm_sqr();
                pxy[i] += a.conj() * b;
            }
        }

        let values = (0..bins)
            .map(|i| {
                let denom = pxx[i] * pyy[i];
                if denom > 0.0 {
                    (pxy[i].norm_sqr() / denom).min(1.0) as f32
                } else {
                    0.0
                }
            })
            .collect();

        tracing::debug!(segments, segment_len = n, "coherence estimated");

        Ok(Coherence {
            frequencies: rfft_frequencies(bins, self.sample_rate),
            values,
            segments,
        })
    }

    fn prepare(&self, segment: &[f32], window: &[f32], fft: &Fft) -> Vec<Complex<f32>> {
        let mean = segment.iter().sum::<f32>() / segment.len() as f32;
        let mut buffer: Vec<Complex<f32>> = segment
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new((s - mean) * w, 0.0))
            .collect();
        fft.forward_complex(&mut buffer);
        buffer
    }
}
