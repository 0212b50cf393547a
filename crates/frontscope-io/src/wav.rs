//! Multi-channel WAV recordings.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::{Path, PathBuf};

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Whether samples are IEEE 754 floats rather than integer PCM.
    pub is_float: bool,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = reader.len() as u64;

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames: total_samples / spec.channels.max(1) as u64,
        is_float: spec.sample_format == SampleFormat::Float,
    })
}

/// A named multi-channel recording, de-interleaved and normalized to `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    /// File stem, used for plot titles and output names.
    pub name: String,
    /// Source file.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// One sample vector per channel, all of equal length.
    pub channels: Vec<Vec<f32>>,
}

impl Recording {
    /// Build a recording from already de-interleaved channels.
    pub fn new(name: impl Into<String>, sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            sample_rate,
            channels,
        }
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of channel `index`, if present.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Drop frames beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        for channel in &mut self.channels {
            channel.truncate(len);
        }
    }
}

/// Read a WAV file into a [`Recording`].
///
/// Integer PCM of any bit depth is scaled by `2^(bits-1)`, float samples are
/// taken as-is.
pub fn read_recording<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(Error::invalid(path, "WAV header declares zero channels"));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut deinterleaved = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            deinterleaved[ch].push(sample);
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(
        file = %path.display(),
        channels,
        frames,
        sample_rate = spec.sample_rate,
        "read recording"
    );

    Ok(Recording {
        name,
        path: path.to_path_buf(),
        sample_rate: spec.sample_rate,
        channels: deinterleaved,
    })
}

/// Write a recording as interleaved WAV.
///
/// `bits_per_sample == 32` writes IEEE float, anything else integer PCM.
pub fn write_recording<P: AsRef<Path>>(
    path: P,
    recording: &Recording,
    bits_per_sample: u16,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: recording.num_channels() as u16,
        sample_rate: recording.sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)?;

    let max_val = (1i64 << (bits_per_sample - 1)) as f32;
    for frame in 0..recording.num_frames() {
        for channel in &recording.channels {
            let sample = channel[frame];
            if bits_per_sample == 32 {
                writer.write_sample(sample)?;
            } else {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                writer.write_sample(int_sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Truncate every recording to the shortest frame count among them.
///
/// Returns that common length.
pub fn truncate_to_common(recordings: &mut [Recording]) -> usize {
    let min_len = recordings
        .iter()
        .map(Recording::num_frames)
        .min()
        .unwrap_or(0);
    for recording in recordings.iter_mut() {
        recording.truncate(min_len);
    }
    min_len
}
