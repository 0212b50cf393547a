//! Error types for analysis operations.

use thiserror::Error;

/// Errors raised by the analysis routines.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input is shorter than a single analysis window.
    #[error("signal of {len} samples is shorter than one {window}-sample analysis window")]
    SignalTooShort {
        /// Available samples.
        len: usize,
        /// Required window length.
        window: usize,
    },

    /// Two signals analysed together differ in length.
    #[error("signal lengths differ: {a} vs {b} samples")]
    LengthMismatch {
        /// Length of the first signal.
        a: usize,
        /// Length of the second signal.
        b: usize,
    },

    /// An analysis parameter is out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A channel index does not exist.
    #[error("channel {index} out of range for a {channels}-channel recording")]
    ChannelOutOfRange {
        /// Requested channel.
        index: usize,
        /// Channels available.
        channels: usize,
    },

    /// Writing an export file failed.
    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Create an invalid parameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
