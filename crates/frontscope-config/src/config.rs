//! Configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration.
///
/// # TOML Format
///
/// ```toml
/// [analysis]
/// canonical_rate = 16000
/// min_rate = 8000
/// coherence_base_window = 512
/// correlation_window = 32768
/// overlap = 0.5
///
/// [resampler]
/// program = "sox"
/// suffix = "_16khz"
///
/// [files]
/// aec_filter_pattern = "{base}.f{ref}.m{mic}"
/// nlmodel_pattern = "{base}.r{rows}.c{cols}"
/// nlmodel_file = "nlm_buffer.bin"
/// coherence_figure = "mic_coherence.png"
/// correlation_prefix = "plot_correlation_"
///
/// [plot]
/// width = 2800
/// height = 1400
/// ```
///
/// Every section and key is optional; missing values take the defaults above.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FrontscopeConfig {
    /// Analysis constants.
    pub analysis: AnalysisConfig,
    /// External resampler invocation.
    pub resampler: ResamplerConfig,
    /// Dump and output file naming conventions.
    pub files: FileConfig,
    /// Figure geometry.
    pub plot: PlotConfig,
}

/// Analysis constants shared by the coherence and correlation tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rate every recording is resampled to before analysis.
    pub canonical_rate: u32,
    /// Recordings below this rate are rejected.
    pub min_rate: u32,
    /// Coherence segment length at the canonical rate; scaled with the actual rate.
    pub coherence_base_window: usize,
    /// Cross-correlation window length in samples.
    pub correlation_window: usize,
    /// Fractional overlap between consecutive windows.
    pub overlap: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            canonical_rate: 16000,
            min_rate: 8000,
            coherence_base_window: 512,
            correlation_window: 32768,
            overlap: 0.5,
        }
    }
}

impl AnalysisConfig {
    /// Coherence segment length for a recording at `sample_rate`.
    ///
    /// `base_window * sample_rate / canonical_rate`, e.g. 512 at 16 kHz and
    /// 1536 at 48 kHz.
    pub fn coherence_window(&self, sample_rate: u32) -> usize {
        (self.coherence_base_window as u64 * sample_rate as u64 / self.canonical_rate as u64)
            as usize
    }

    /// Hop size between consecutive windows of length `window`.
    pub fn hop(&self, window: usize) -> usize {
        (((1.0 - self.overlap) * window as f32) as usize).max(1)
    }
}

/// External resampler invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Program name or path of a sox-compatible resampler.
    pub program: String,
    /// Suffix appended to the input stem to name the resampled file.
    pub suffix: String,
    /// Directory for resampled files; the working directory if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            program: "sox".to_string(),
            suffix: "_16khz".to_string(),
            output_dir: None,
        }
    }
}

impl ResamplerConfig {
    /// Path of the resampled copy of `input`: `<output_dir>/<stem><suffix>.wav`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{stem}{}.wav", self.suffix);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Dump and output file naming conventions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// AEC filter dump name; `{base}`, `{ref}` and `{mic}` are substituted.
    pub aec_filter_pattern: String,
    /// Explicit-layout NLModel dump name; `{base}`, `{rows}`, `{cols}` are substituted.
    pub nlmodel_pattern: String,
    /// Default NLModel dump read when no file is given.
    pub nlmodel_file: PathBuf,
    /// Default coherence figure name.
    pub coherence_figure: String,
    /// Prefix of correlation figure names.
    pub correlation_prefix: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            aec_filter_pattern: "{base}.f{ref}.m{mic}".to_string(),
            nlmodel_pattern: "{base}.r{rows}.c{cols}".to_string(),
            nlmodel_file: PathBuf::from("nlm_buffer.bin"),
            coherence_figure: "mic_coherence.png".to_string(),
            correlation_prefix: "plot_correlation_".to_string(),
        }
    }
}

impl FileConfig {
    /// File holding the filter between far-end `reference` and microphone `mic`.
    pub fn aec_filter_path(&self, base: &str, reference: usize, mic: usize) -> PathBuf {
        PathBuf::from(
            self.aec_filter_pattern
                .replace("{base}", base)
                .replace("{ref}", &reference.to_string())
                .replace("{mic}", &mic.to_string()),
        )
    }

    /// File holding an explicit-layout NLModel of `rows` x `cols`.
    pub fn nlmodel_path(&self, base: &str, rows: usize, cols: usize) -> PathBuf {
        PathBuf::from(
            self.nlmodel_pattern
                .replace("{base}", base)
                .replace("{rows}", &rows.to_string())
                .replace("{cols}", &cols.to_string()),
        )
    }

    /// Correlation figure name for a recording stem.
    pub fn correlation_figure(&self, stem: &str) -> String {
        format!("{}{stem}.png", self.correlation_prefix)
    }
}

/// Figure geometry in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    /// Figure width.
    pub width: u32,
    /// Figure height.
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        // 14x7 inches at 200 dpi
        Self {
            width: 2800,
            height: 1400,
        }
    }
}

impl FrontscopeConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load a configuration from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the configuration for a tool invocation.
    ///
    /// An explicit path must exist. Without one, the user config file is used
    /// when present, otherwise the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = crate::paths::default_config_path();
        if default_path.is_file() {
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.canonical_rate == 0 {
            return Err(ConfigError::invalid("analysis.canonical_rate", "must be non-zero"));
        }
        if a.min_rate > a.canonical_rate {
            return Err(ConfigError::invalid(
                "analysis.min_rate",
                format!("{} exceeds canonical rate {}", a.min_rate, a.canonical_rate),
            ));
        }
        if a.coherence_base_window < 2 {
            return Err(ConfigError::invalid(
                "analysis.coherence_base_window",
                "must be at least 2",
            ));
        }
        if a.correlation_window < 2 {
            return Err(ConfigError::invalid(
                "analysis.correlation_window",
                "must be at least 2",
            ));
        }
        if !(0.0..1.0).contains(&a.overlap) {
            return Err(ConfigError::invalid("analysis.overlap", "must be in [0, 1)"));
        }
        if self.resampler.program.trim().is_empty() {
            return Err(ConfigError::invalid("resampler.program", "must not be empty"));
        }
        for placeholder in ["{base}", "{ref}", "{mic}"] {
            if !self.files.aec_filter_pattern.contains(placeholder) {
                return Err(ConfigError::invalid(
                    "files.aec_filter_pattern",
                    format!("missing {placeholder}"),
                ));
            }
        }
        for placeholder in ["{base}", "{rows}", "{cols}"] {
            if !self.files.nlmodel_pattern.contains(placeholder) {
                return Err(ConfigError::invalid(
                    "files.nlmodel_pattern",
                    format!("missing {placeholder}"),
                ));
            }
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(ConfigError::invalid("plot", "figure size must be non-zero"));
        }
        Ok(())
    }
}
