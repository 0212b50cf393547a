//! Full cross-correlation, time-domain (direct) and frequency-domain (FFT),
//! with peak lag detection.
//!
//! # Definition
//!
//! For `a` of length `Na` and `b` of length `Nb` the full correlation has
//! `Na + Nb - 1` entries:
//!
//! ```text
//! c[k] = Σ_n a[n + k - (Nb - 1)] · b[n]
//! ```
//!
//! Index `k` corresponds to lag `k - (Nb - 1)`. The lag of the absolute peak
//! is positive when `a` is a delayed copy of `b` (`a[n] = b[n - d]` peaks at
//! `+d`) and negative when `a` leads.
//!
//! # FFT-based Computation
//!
//! ```text
//! c = IFFT( A(f) · conj(B(f)) )
//! ```
//!
//! with both inputs zero-padded to at least `Na + Nb - 1` to avoid circular
//! wrap-around.

use crate::fft::Fft;
use rustfft::num_complex::Complex;

/// Direct O(Na · Nb) full cross-correlation.
///
/// Suited to short inputs and as a reference for [`correlate_full`].
pub fn correlate_direct(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let offset = b.len() as isize - 1;
    let len = a.len() + b.len() - 1;

    (0..len)
        .map(|k| {
            let lag = k as isize - offset;
            b.iter()
                .enumerate()
                .filter_map(|(n, &bv)| {
                    let m = n as isize + lag;
                    (m >= 0 && (m as usize) < a.len()).then(|| a[m as usize] * bv)
                })
                .sum()
        })
        .collect()
}

/// FFT-based full cross-correlation, O(n log n).
///
/// Output layout matches [`correlate_direct`].
pub fn correlate_full(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let out_len = a.len() + b.len() - 1;
    let fft_size = out_len.next_power_of_two().max(2);
    let fft = Fft::new(fft_size);

    let mut buf_a: Vec<Complex<f32>> = a.iter().map(|&v| Complex::new(v, 0.0)).collect();
    buf_a.resize(fft_size, Complex::new(0.0, 0.0));

    let mut buf_b: Vec<Complex<f32>> = b.iter().map(|&v| Complex::new(v, 0.0)).collect();
    buf_b.resize(fft_size, Complex::new(0.0, 0.0));

    fft.forward_complex(&mut buf_a);
    fft.forward_complex(&mut buf_b);

    for (ca, cb) in buf_a.iter_mut().zip(buf_b.iter()) {
        *ca *= cb.conj();
    }

    fft.inverse_complex(&mut buf_a);

    // Circular result: lag τ >= 0 at index τ, lag τ < 0 at fft_size + τ.
    let offset = b.len() as isize - 1;
    (0..out_len)
        .map(|k| {
            let lag = k as isize - offset;
            let idx = if lag >= 0 {
                lag as usize
            } else {
                (fft_size as isize + lag) as usize
            };
            buf_a[idx].re
        })
        .collect()
}

/// Index and value of the maximum absolute correlation.
///
/// Uses the absolute value so anti-phase correlation is also found. The first
/// index wins on ties. Returns `None` for an empty input.
pub fn peak_abs(correlation: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in correlation.iter().enumerate() {
        match best {
            Some((_, b)) if v.abs() <= b.abs() => {}
            _ => best = Some((i, v)),
        }
    }
    best
}

/// Signed lag of the maximum absolute correlation and its value.
///
/// `zero_index` is the index of lag 0, `Nb - 1` for a full correlation.
pub fn peak_lag(correlation: &[f32], zero_index: usize) -> (isize, f32) {
    match peak_abs(correlation) {
        Some((idx, value)) => (idx as isize - zero_index as isize, value),
        None => (0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn white_noise(n: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
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
    fn test_full_length_and_zero_lag_index() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.0, 1.0, 0.5];
        let c = correlate_direct(&a, &b);
        assert_eq!(c.len(), 5);
        // full correlation of [1,2,3] with [0,1,0.5] is [0.5, 2, 3.5, 3, 0]
        let expected = [0.5, 2.0, 3.5, 3.0, 0.0];
        for (got, want) in c.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "{c:?}");
        }
    }

    #[test]
    fn test_direct_matches_fft() {
        let a: Vec<f32> = (0..100).map(|i| (2.0 * PI * 5.0 * i as f32 / 100.0).sin()).collect();
        let b = white_noise(80, 7);

        let direct = correlate_direct(&a, &b);
        let fft_based = correlate_full(&a, &b);

        assert_eq!(direct.len(), fft_based.len());
        for (i, (&d, &f)) in direct.iter().zip(fft_based.iter()).enumerate() {
            assert!((d - f).abs() < 1e-3, "Mismatch at index {i}: direct={d:.4}, fft={f:.4}");
        }
    }

    #[test]
    fn test_delayed_first_signal_gives_positive_lag() {
        let b = white_noise(512, 0xDEAD_BEEF);
        let a = delayed(&b, 37);

        let corr = correlate_full(&a, &b);
        let (lag, _) = peak_lag(&corr, b.len() - 1);
        assert_eq!(lag, 37);
    }

    #[test]
    fn test_leading_first_signal_gives_negative_lag() {
        let a = white_noise(512, 0xC0FFEE);
        let b = delayed(&a, 21);

        let corr = correlate_full(&a, &b);
        let (lag, _) = peak_lag(&corr, b.len() - 1);
        assert_eq!(lag, -21);
    }

    #[test]
    fn test_peak_abs_finds_negative_peak() {
        assert_eq!(peak_abs(&[0.1, -3.0, 2.0]), Some((1, -3.0)));
        assert_eq!(peak_abs(&[]), None);
        assert_eq!(peak_lag(&[], 0), (0, 0.0));
    }
}
