//! Input/output layer for the frontscope analysis tools.
//!
//! This crate provides:
//!
//! - **WAV recordings**: [`read_recording`] loads every channel, normalized to
//!   `[-1, 1]`, and [`truncate_to_common`] aligns a set of recordings
//! - **Resampling**: [`Resampler`] drives an external sox-compatible tool
//! - **Coefficient dumps**: raw little-endian float32 buffers, AEC filter sets
//!   and NLModel matrices
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frontscope_config::FrontscopeConfig;
//! use frontscope_io::{Resampler, read_recording};
//!
//! let config = FrontscopeConfig::default();
//! let resampler = Resampler::new(&config.resampler);
//! let path = resampler.ensure_rate("capture.wav", config.analysis.canonical_rate)?;
//! let recording = read_recording(&path)?;
//! println!("{} channels, {} frames", recording.num_channels(), recording.num_frames());
//! ```

mod aec;
mod dump;
mod nlmodel;
mod resample;
mod wav;

pub use aec::{AecFilter, read_aec_filters};
pub use dump::{read_f32_dump, write_f32_dump};
pub use nlmodel::{NlModel, NlModelLayout, dims_from_name, read_nlmodel};
pub use resample::Resampler;
pub use wav::{Recording, WavInfo, read_recording, read_wav_info, truncate_to_common, write_recording};

use std::path::PathBuf;

/// Error types for frontscope I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// A required input file does not exist.
    #[error("file {0} not found")]
    MissingFile(PathBuf),

    /// The resampler could not be started.
    #[error("failed to run resampler '{program}': {source}")]
    ResamplerSpawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The resampler ran but exited unsuccessfully.
    #[error("resampler '{program}' failed on {input}: {status}")]
    ResamplerFailed {
        /// Program that was invoked.
        program: String,
        /// File being resampled.
        input: PathBuf,
        /// Exit status reported by the OS.
        status: std::process::ExitStatus,
    },

    /// A binary dump does not have the expected size.
    #[error("{path}: expected {expected} values, found {actual}")]
    LengthMismatch {
        /// Offending file.
        path: PathBuf,
        /// Number of float32 values expected.
        expected: usize,
        /// Number of float32 values present.
        actual: usize,
    },

    /// Input content is structurally invalid.
    #[error("invalid input {path}: {reason}")]
    InvalidInput {
        /// Offending file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for frontscope I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
