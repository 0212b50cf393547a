//! Frequency response of FIR filter coefficient sets.

use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, magnitude_db, rfft_frequencies};
use serde::Serialize;

/// Floor added to the magnitude before taking the log, so empty bins stay finite.
pub const MAGNITUDE_FLOOR: f32 = 1e-39;

/// Lowest value the display range of a response is allowed to start at.
pub const DISPLAY_FLOOR_DB: f32 = -75.0;

/// Headroom above the peak in the display range.
pub const DISPLAY_HEADROOM_DB: f32 = 5.0;

/// Magnitude response of an impulse response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResponse {
    /// Bin frequencies in Hz, `linspace(0, rate/2, len/2 + 1)`.
    pub frequencies: Vec<f32>,
    /// Magnitude per bin in dB.
    pub magnitude_db: Vec<f32>,
}

impl FilterResponse {
    /// Transform `coefficients` at their own length and convert to dB.
    pub fn from_impulse(coefficients: &[f32], sample_rate: f32) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(AnalysisError::invalid("coefficients", "impulse response is empty"));
        }
        let fft = Fft::new(coefficients.len());
        let spectrum = fft.forward(coefficients);

        Ok(Self {
            frequencies: rfft_frequencies(spectrum.len(), sample_rate),
            magnitude_db: magnitude_db(&spectrum, MAGNITUDE_FLOOR),
        })
    }

    /// Highest magnitude in dB.
    pub fn peak_db(&self) -> f32 {
        self.magnitude_db
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Lowest magnitude in dB.
    pub fn min_db(&self) -> f32 {
        self.magnitude_db.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Display range `[max(-75, min), peak + 5]`.
    pub fn display_range(&self) -> (f32, f32) {
        (
            self.min_db().max(DISPLAY_FLOOR_DB),
            self.peak_db() + DISPLAY_HEADROOM_DB,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_impulse_is_flat() {
        let mut h = vec![0.0f32; 256];
        h[0] = 1.0;
        let resp = FilterResponse::from_impulse(&h, 16000.0).unwrap();

        assert_eq!(resp.magnitude_db.len(), 129);
        for &m in &resp.magnitude_db {
            assert!(m.abs() < 1e-4, "magnitude {m} dB");
        }
        assert!((resp.frequencies[128] - 8000.0).abs() < 1e-3);
    }

    #[test]
    fn delayed_impulse_is_still_flat() {
        let mut h = vec![0.0f32; 100];
        h[17] = 0.5;
        let resp = FilterResponse::from_impulse(&h, 16000.0).unwrap();

        let expected = 20.0 * 0.5f32.log10();
        for &m in &resp.magnitude_db {
            assert!((m - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn display_range_clamps_deep_nulls() {
        let h = vec![0.0f32; 16];
        let resp = FilterResponse::from_impulse(&h, 16000.0).unwrap();

        assert!(resp.peak_db() < -700.0);
        assert!(resp.magnitude_db.iter().all(|m| m.is_finite()));

        let mut h = vec![0.0f32; 16];
        h[0] = 1.0;
        h[1] = 1.0;
        let resp = FilterResponse::from_impulse(&h, 16000.0).unwrap();
        let (lo, hi) = resp.display_range();
        assert_eq!(lo, DISPLAY_FLOOR_DB);
        assert!((hi - (20.0 * 2.0f32.log10() + 5.0)).abs() < 1e-3);
    }

    #[test]
    fn empty_buffer_is_rejected() {
        assert!(FilterResponse::from_impulse(&[], 16000.0).is_err());
    }
}
