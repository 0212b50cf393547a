//! Integration tests for frontscope-analysis.
//!
//! Exercise the public API with synthetic multi-channel captures whose delay
//! and coherence are known by construction.

use std::f32::consts::PI;

use frontscope_analysis::export::{export_delay_csv, export_json};
use frontscope_analysis::fft::{Fft, magnitude_db};
use frontscope_analysis::xcorr::correlate_direct;
use frontscope_analysis::{
    CoherenceAnalyzer, DelayEstimator, FilterResponse, channel_pairs, correlate_full, peak_lag,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reproducible white noise in [-1, 1].
fn noise(n: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.max(1);
    (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as i32 as f32) / (i32::MAX as f32)
        })
        .collect()
}

/// `x` delayed by `d` samples, zero-filled at the start.
fn delayed(x: &[f32], d: usize) -> Vec<f32> {
    let mut y = vec![0.0f32; x.len()];
    y[d..].copy_from_slice(&x[..x.len() - d]);
    y
}

/// A 4-mic capture of one source, each mic a delayed copy plus its own noise.
fn array_capture(len: usize, delays: [usize; 4], noise_gain: f32) -> Vec<Vec<f32>> {
    let source = noise(len, 0xA5A5);
    delays
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let own = noise(len, 1000 + i as u32);
            delayed(&source, d)
                .iter()
                .zip(own.iter())
                .map(|(s, n)| s + noise_gain * n)
                .collect()
        })
        .collect()
}

// ===========================================================================
// Coherence
// ===========================================================================

#[test]
fn array_pairs_are_coherent_and_noise_lowers_it() {
    let clean = array_capture(32000, [0, 1, 2, 3], 0.0);
    let noisy = array_capture(32000, [0, 1, 2, 3], 1.0);
    let analyzer = CoherenceAnalyzer::new(16000.0, 512).unwrap();

    for pair in channel_pairs(0, 4) {
        let c = analyzer.analyze(&clean[pair.a], &clean[pair.b]).unwrap();
        let n = analyzer.analyze(&noisy[pair.a], &noisy[pair.b]).unwrap();
        assert!(c.mean() > 0.95, "{pair}: clean mean {}", c.mean());
        assert!(n.mean() < c.mean(), "{pair}: noise did not lower coherence");
        assert!(n.mean() > 0.1 && n.mean() < 0.5, "{pair}: noisy mean {}", n.mean());
    }
}

#[test]
fn coherence_values_stay_in_unit_range() {
    let x = noise(20000, 4);
    let y: Vec<f32> = noise(20000, 5)
        .iter()
        .zip(x.iter())
        .map(|(a, b)| a + 0.3 * b)
        .collect();
    let analyzer = CoherenceAnalyzer::new(16000.0, 512).unwrap();
    let coh = analyzer.analyze(&x, &y).unwrap();

    assert!(coh.values.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(coh.frequencies.len(), coh.values.len());
}

// ===========================================================================
// Delay estimation
// ===========================================================================

#[test]
fn production_window_tracks_constant_delay() {
    let reference = noise(16000 * 5, 77);
    let mic = delayed(&reference, 40);

    let estimator = DelayEstimator::new(32768, 16384, 16000).unwrap();
    let analysis = estimator.analyze(&mic, &reference).unwrap();

    // (80000 - 32768 - 1) / 16384 + 1
    assert_eq!(analysis.windows.len(), 3);
    assert!(analysis.lag_series().iter().all(|&l| l == 40));
    assert_eq!(analysis.overall_lag(), Some(40));

    let times = analysis.times();
    assert!((times[2] - 2.048).abs() < 1e-5);
}

#[test]
fn delay_results_export_to_csv_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let b = noise(3000, 9);
    let a = delayed(&b, 3);
    let analysis = DelayEstimator::new(512, 256, 16000)
        .unwrap()
        .analyze(&a, &b)
        .unwrap();

    let csv = dir.path().join("delay.csv");
    export_delay_csv(&analysis, &csv).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), analysis.windows.len() + 1);
    assert!(text.lines().nth(1).unwrap().starts_with("0.000000,3,"));

    let json = dir.path().join("delay.json");
    export_json(&analysis, &json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["window"], 512);
}

// ===========================================================================
// Filter response
// ===========================================================================

#[test]
fn lowpass_taps_roll_off() {
    // 9-tap moving average
    let taps = vec![1.0 / 9.0; 9];
    let mut padded = taps.clone();
    padded.resize(512, 0.0);
    let response = FilterResponse::from_impulse(&padded, 16000.0).unwrap();

    assert!(response.magnitude_db[0].abs() < 1e-3);
    assert!(response.magnitude_db[200] < -10.0);
    assert_eq!(response.peak_db(), response.magnitude_db[0]);
}

#[test]
fn fft_magnitude_matches_response() {
    let h: Vec<f32> = noise(64, 3);
    let response = FilterResponse::from_impulse(&h, 16000.0).unwrap();
    let direct = magnitude_db(&Fft::new(64).forward(&h), 1e-39);
    assert_eq!(response.magnitude_db, direct);
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// `a[n] = b[n - d]` peaks at `+d`, the reverse at `-d`.
    #[test]
    fn lag_sign_follows_delayed_channel(d in 1usize..60, seed in 1u32..10_000) {
        let b = noise(256, seed);
        let a = delayed(&b, d);

        let corr = correlate_full(&a, &b);
        prop_assert_eq!(peak_lag(&corr, b.len() - 1).0, d as isize);

        let corr = correlate_full(&b, &a);
        prop_assert_eq!(peak_lag(&corr, a.len() - 1).0, -(d as isize));
    }

    /// The FFT path agrees with the direct sum.
    #[test]
    fn fft_correlation_matches_direct(
        a in prop::collection::vec(-1.0f32..=1.0, 1..64),
        b in prop::collection::vec(-1.0f32..=1.0, 1..64),
    ) {
        let fast = correlate_full(&a, &b);
        let slow = correlate_direct(&a, &b);
        prop_assert_eq!(fast.len(), a.len() + b.len() - 1);
        for (f, s) in fast.iter().zip(slow.iter()) {
            prop_assert!((f - s).abs() < 1e-3, "fft {} vs direct {}", f, s);
        }
    }
}

#[test]
fn sine_autocorrelation_peaks_at_zero() {
    let x: Vec<f32> = (0..400).map(|i| (2.0 * PI * 50.0 * i as f32 / 16000.0).sin()).collect();
    let corr = correlate_full(&x, &x);
    assert_eq!(peak_lag(&corr, x.len() - 1).0, 0);
}
