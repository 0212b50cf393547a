//! Windowed delay tracking between two channels.
//!
//! A long correlation window slides over both channels. Each window yields the
//! lag of its absolute correlation peak and the peak-to-average ratio of the
//! correlation magnitude, a confidence measure for that lag. The correlations
//! of all windows are averaged into a single lag profile.

use crate::error::{AnalysisError, Result};
use crate::xcorr::{correlate_full, peak_abs};
use serde::Serialize;

/// Result of one correlation window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationWindow {
    /// Window index.
    pub index: usize,
    /// Window start time in seconds.
    pub time_s: f32,
    /// Lag of the absolute correlation peak in samples.
    pub lag_samples: isize,
    /// Peak |c| divided by mean |c|.
    pub peak_to_average: f32,
}

/// Aggregated delay analysis of a channel pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayAnalysis {
    /// Window length in samples.
    pub window: usize,
    /// Hop between windows in samples.
    pub hop: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Per-window results in time order.
    pub windows: Vec<CorrelationWindow>,
    /// Lag axis of [`mean_correlation`](Self::mean_correlation), `-(N-1)..=N-1`.
    pub lags: Vec<isize>,
    /// Correlation averaged over all windows.
    pub mean_correlation: Vec<f32>,
}

impl DelayAnalysis {
    /// Window start times in seconds.
    pub fn times(&self) -> Vec<f32> {
        self.windows.iter().map(|w| w.time_s).collect()
    }

    /// Per-window lags in samples.
    pub fn lag_series(&self) -> Vec<isize> {
        self.windows.iter().map(|w| w.lag_samples).collect()
    }

    /// Per-window peak-to-average ratios.
    pub fn ratio_series(&self) -> Vec<f32> {
        self.windows.iter().map(|w| w.peak_to_average).collect()
    }

    /// `|mean correlation|` per lag, the profile plotted against lag.
    pub fn mean_abs_correlation(&self) -> Vec<f32> {
        self.mean_correlation.iter().map(|c| c.abs()).collect()
    }

    /// Lag of the peak of the averaged correlation.
    pub fn overall_lag(&self) -> Option<isize> {
        peak_abs(&self.mean_correlation).map(|(i, _)| self.lags[i])
    }

    /// Most frequent per-window lag, the smallest on ties.
    pub fn dominant_lag(&self) -> Option<isize> {
        let mut lags = self.lag_series();
        lags.sort_unstable();
        let mut best: Option<(isize, usize)> = None;
        for chunk in lags.chunk_by(|a, b| a == b) {
            if best.is_none_or(|(_, n)| chunk.len() > n) {
                best = Some((chunk[0], chunk.len()));
            }
        }
        best.map(|(lag, _)| lag)
    }
}

/// Sliding-window delay estimator.
#[derive(Debug, Clone)]
pub struct DelayEstimator {
    window: usize,
    hop: usize,
    sample_rate: u32,
}

impl DelayEstimator {
    /// Create an estimator with `window`-sample windows advancing by `hop`.
    pub fn new(window: usize, hop: usize, sample_rate: u32) -> Result<Self> {
        if window == 0 {
            return Err(AnalysisError::invalid("window", "must be at least 1 sample"));
        }
        if hop == 0 || hop > window {
            return Err(AnalysisError::invalid(
                "hop",
                format!("{hop} must be in 1..={window}"),
            ));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::invalid("sample_rate", "must be positive"));
        }
        Ok(Self {
            window,
            hop,
            sample_rate,
        })
    }

    /// Number of windows processed for signals of length `len`.
    ///
    /// A window starting at `start` is used while `start + window < len`.
    pub fn num_windows(&self, len: usize) -> usize {
        if len <= self.window {
            0
        } else {
            (len - self.window - 1) / self.hop + 1
        }
    }

    /// Track the lag of `a` relative to `b`.
    ///
    /// A positive lag means `a` is delayed relative to `b`.
    pub fn analyze(&self, a: &[f32], b: &[f32]) -> Result<DelayAnalysis> {
        let len = a.len().min(b.len());
        let count = self.num_windows(len);
        if count == 0 {
            return Err(AnalysisError::SignalTooShort {
                len,
                window: self.window + 1,
            });
        }

        let n = self.window;
        let corr_len = 2 * n - 1;
        let mut sum = vec![0.0f64; corr_len];
        let mut windows = Vec::with_capacity(count);

        for index in 0..count {
            let start = index * self.hop;
            let corr = correlate_full(&a[start..start + n], &b[start..start + n]);

            let mean_abs = corr.iter().map(|c| c.abs() as f64).sum::<f64>() / corr_len as f64;
            let (peak_idx, peak) = peak_abs(&corr).unwrap_or((n - 1, 0.0));
            let peak_to_average = if mean_abs > 0.0 {
                (peak.abs() as f64 / mean_abs) as f32
            } else {
                0.0
            };

            for (s, &c) in sum.iter_mut().zip(corr.iter()) {
                *s += c as f64;
            }

            let window = CorrelationWindow {
                index,
                time_s: (index * self.hop) as f32 / self.sample_rate as f32,
                lag_samples: peak_idx as isize - (n as isize - 1),
                peak_to_average,
            };
            tracing::debug!(
                index,
                lag = window.lag_samples,
                ratio = window.peak_to_average,
                "correlation window"
            );
            windows.push(window);
        }

        let mean_correlation = sum.iter().map(|&s| (s / count as f64) as f32).collect();
        let lags = (0..corr_len).map(|k| k as isize - (n as isize - 1)).collect();

        tracing::info!(windows = count, window = n, hop = self.hop, "delay analysis complete");

        Ok(DelayAnalysis {
            window: n,
            hop: self.hop,
            sample_rate: self.sample_rate,
            windows,
            lags,
            mean_correlation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(n: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as i32 as f32) / (i32::MAX as f32)
            })
            .collect()
    }

    fn delayed(x: &[f32], delay: usize) -> Vec<f32> {
        let mut y = vec![0.0f32; x.len()];
        y[delay..].copy_from_slice(&x[..x.len() - delay]);
        y
    }

    #[test]
    fn window_count_uses_strict_bound() {
        let est = DelayEstimator::new(32768, 16384, 16000).unwrap();
        assert_eq!(est.num_windows(32768), 0);
        assert_eq!(est.num_windows(32769), 1);
        assert_eq!(est.num_windows(49152), 1);
        assert_eq!(est.num_windows(49153), 2);
    }

    #[test]
    fn delayed_channel_reports_positive_lag() {
        let b = noise(4096, 11);
        let a = delayed(&b, 12);
        let est = DelayEstimator::new(1024, 512, 16000).unwrap();
        let analysis = est.analyze(&a, &b).unwrap();

        assert_eq!(analysis.windows.len(), 6);
        assert!(analysis.lag_series().iter().all(|&l| l == 12));
        assert_eq!(analysis.overall_lag(), Some(12));
        assert_eq!(analysis.dominant_lag(), Some(12));
        assert!(analysis.ratio_series().iter().all(|&r| r > 10.0));
    }

    #[test]
    fn leading_channel_reports_negative_lag() {
        let a = noise(4096, 23);
        let b = delayed(&a, 5);
        let est = DelayEstimator::new(1024, 512, 16000).unwrap();
        let analysis = est.analyze(&a, &b).unwrap();

        assert_eq!(analysis.overall_lag(), Some(-5));
    }

    #[test]
    fn times_advance_by_hop() {
        let x = noise(4096, 3);
        let est = DelayEstimator::new(1024, 512, 16000).unwrap();
        let analysis = est.analyze(&x, &x).unwrap();

        let times = analysis.times();
        assert_eq!(times[0], 0.0);
        assert!((times[1] - 0.032).abs() < 1e-6);
        assert_eq!(analysis.lags.len(), 2047);
        assert_eq!(analysis.lags[1023], 0);
    }

    #[test]
    fn short_signal_is_an_error() {
        let est = DelayEstimator::new(1024, 512, 16000).unwrap();
        let err = est.analyze(&[0.0; 1024], &[0.0; 2000]).unwrap_err();
        assert!(matches!(err, AnalysisError::SignalTooShort { len: 1024, .. }));
    }

    #[test]
    fn silent_input_has_zero_ratio() {
        let est = DelayEstimator::new(64, 32, 16000).unwrap();
        let analysis = est.analyze(&[0.0; 200], &[0.0; 200]).unwrap();
        assert!(analysis.ratio_series().iter().all(|&r| r == 0.0));
    }

    #[test]
    fn invalid_hop_is_rejected() {
        assert!(DelayEstimator::new(1024, 0, 16000).is_err());
        assert!(DelayEstimator::new(1024, 2048, 16000).is_err());
    }
}
