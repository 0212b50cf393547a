//! Configuration for the frontscope analysis tools.
//!
//! Every constant the tools depend on (canonical sample rate, analysis window
//! sizes, the external resampler command, dump file naming conventions, plot
//! geometry) lives in [`FrontscopeConfig`] and is passed explicitly into each
//! operation. Nothing here is process-wide mutable state.
//!
//! # Example
//!
//! ```rust
//! use frontscope_config::FrontscopeConfig;
//!
//! let config = FrontscopeConfig::from_toml(
//!     r#"
//!     [analysis]
//!     canonical_rate = 16000
//!     correlation_window = 16384
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.analysis.correlation_window, 16384);
//! assert_eq!(config.analysis.coherence_window(48000), 1536);
//! assert_eq!(
//!     config.files.aec_filter_path("aecfilt.bin", 0, 3).to_str(),
//!     Some("aecfilt.bin.f0.m3")
//! );
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{AnalysisConfig, FileConfig, FrontscopeConfig, PlotConfig, ResamplerConfig};
pub use error::ConfigError;
pub use paths::{default_config_path, user_config_dir};
