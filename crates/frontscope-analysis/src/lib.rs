//! Frontscope Analysis - spectral and timing tools for microphone arrays
//!
//! This crate provides the numeric core of the frontscope tools:
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`xcorr`] - Full cross-correlation and peak lag detection
//! - [`coherence`] - Welch magnitude-squared coherence between two channels
//! - [`delay`] - Sliding-window delay tracking between a mic and a reference
//! - [`filter_response`] - Magnitude response of AEC filter taps
//! - [`pairs`] - Channel pair combinations
//! - [`export`] - CSV and JSON sidecar output
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use frontscope_analysis::{CoherenceAnalyzer, DelayEstimator, channel_pairs};
//!
//! // Coherence for every pair of a 4-mic capture
//! let analyzer = CoherenceAnalyzer::new(16000.0, 512)?;
//! for pair in channel_pairs(0, 4) {
//!     let coh = analyzer.analyze(&mics[pair.a], &mics[pair.b])?;
//!     println!("{pair}: mean coherence {:.3}", coh.mean());
//! }
//!
//! // Delay of channel 0 against the reference on channel 1
//! let estimator = DelayEstimator::new(32768, 16384, 16000)?;
//! let delay = estimator.analyze(&stereo[0], &stereo[1])?;
//! println!("dominant lag: {:?}", delay.dominant_lag());
//! ```

pub mod coherence;
pub mod delay;
mod error;
pub mod export;
pub mod fft;
pub mod filter_response;
pub mod pairs;
pub mod xcorr;

pub use coherence::{Coherence, CoherenceAnalyzer};
pub use delay::{CorrelationWindow, DelayAnalysis, DelayEstimator};
pub use error::{AnalysisError, Result};
pub use fft::{Fft, Window};
pub use filter_response::FilterResponse;
pub use pairs::{ChannelPair, channel_pairs, pairs_for_sources};
pub use xcorr::{correlate_full, peak_lag};
