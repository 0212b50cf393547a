//! Export formats for analysis results.
//!
//! Plots are the primary output; these sidecar files carry the same numbers
//! for other tools:
//! - CSV with one row per frequency bin or window
//! - JSON for any result type

use crate::error::Result;
use crate::{Coherence, DelayAnalysis, FilterResponse};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Export coherence curves sharing a frequency axis to CSV.
///
/// The first column is frequency, followed by one column per labelled curve.
/// Curves of differing length are cut to the shortest.
///
/// # Example
///
/// ```rust,ignore
/// use frontscope_analysis::export::export_coherence_csv;
///
/// export_coherence_csv(&[("ch0-ch1".into(), coh)], "mic_coherence.csv")?;
/// ```
pub fn export_coherence_csv(
    curves: &[(String, Coherence)],
    path: impl AsRef<Path>,
) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    write!(file, "frequency_hz")?;
    for (label, _) in curves {
        write!(file, ",{label}")?;
    }
    writeln!(file)?;

    let Some((_, first)) = curves.first() else {
        return Ok(());
    };
    let rows = curves
        .iter()
        .map(|(_, c)| c.values.len())
        .min()
        .unwrap_or(0);

    for i in 0..rows {
        write!(file, "{:.3}", first.frequencies[i])?;
        for (_, curve) in curves {
            write!(file, ",{:.6}", curve.values[i])?;
        }
        writeln!(file)?;
    }

    Ok(())
}

/// Export per-window delay results to CSV.
///
/// Columns: `time_s,lag_samples,peak_to_average`.
pub fn export_delay_csv(analysis: &DelayAnalysis, path: impl AsRef<Path>) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "time_s,lag_samples,peak_to_average")?;
    for w in &analysis.windows {
        writeln!(file, "{:.6},{},{:.6}", w.time_s, w.lag_samples, w.peak_to_average)?;
    }

    Ok(())
}

/// Export a filter magnitude response to CSV.
///
/// Columns: `frequency_hz,magnitude_db`.
pub fn export_response_csv(response: &FilterResponse, path: impl AsRef<Path>) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "frequency_hz,magnitude_db")?;
    for (f, m) in response.frequencies.iter().zip(response.magnitude_db.iter()) {
        writeln!(file, "{f:.3},{m:.6}")?;
    }

    Ok(())
}

/// Export any result as pretty-printed JSON.
pub fn export_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
