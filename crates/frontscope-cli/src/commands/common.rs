//! Shared CLI helpers used across multiple commands.

use frontscope_config::{FrontscopeConfig, PlotConfig};
use frontscope_io::{Recording, Resampler, read_recording, read_wav_info};
use frontscope_plot::{Figure, open_in_viewer};
use std::path::Path;

/// Load a WAV file at the configured canonical rate.
///
/// Recordings below the minimum rate are rejected; anything else at a
/// different rate goes through the external resampler first.
pub fn load_canonical(path: &Path, config: &FrontscopeConfig) -> anyhow::Result<Recording> {
    if !path.is_file() {
        anyhow::bail!("Error: {} is not a file.", path.display());
    }

    let analysis = &config.analysis;
    let info = read_wav_info(path)?;
    if info.sample_rate < analysis.min_rate {
        anyhow::bail!(
            "{}: sample rate {} Hz is below the minimum of {} Hz",
            path.display(),
            info.sample_rate,
            analysis.min_rate
        );
    }

    let resampled = Resampler::new(&config.resampler).ensure_rate(path, analysis.canonical_rate)?;
    let recording = read_recording(&resampled)?;
    tracing::debug!(
        file = %resampled.display(),
        channels = recording.num_channels(),
        frames = recording.num_frames(),
        "loaded recording"
    );
    Ok(recording)
}

/// File name up to its first `.`, e.g. `aecfilt` for `aecfilt.bin.f0.m0`.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

/// Render `figure`, report where it went and optionally open it.
pub fn save_figure(
    figure: &Figure,
    path: &Path,
    plot: &PlotConfig,
    show: bool,
) -> anyhow::Result<()> {
    figure.render(path, plot.width, plot.height)?;
    println!("Plot saved in {}", path.display());
    if show {
        open_in_viewer(path)?;
    }
    Ok(())
}
