//! Sample-rate conversion through an external sox-compatible tool.

use crate::wav::read_wav_info;
use crate::{Error, Result};
use frontscope_config::ResamplerConfig;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs `<program> <input> -r <rate> <output>` to bring recordings to a
/// common rate.
#[derive(Debug, Clone)]
pub struct Resampler {
    config: ResamplerConfig,
}

impl Resampler {
    /// Create a resampler from configuration.
    pub fn new(config: &ResamplerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Return a path to `input` at `target_rate`.
    ///
    /// Files already at the target rate are returned unchanged. Otherwise the
    /// external tool writes a converted copy and its path is returned.
    pub fn ensure_rate<P: AsRef<Path>>(&self, input: P, target_rate: u32) -> Result<PathBuf> {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(Error::MissingFile(input.to_path_buf()));
        }

        let info = read_wav_info(input)?;
        if info.sample_rate == target_rate {
            return Ok(input.to_path_buf());
        }

        let output = self.config.output_path(input);
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            from = info.sample_rate,
            to = target_rate,
            "resampling"
        );

        let status = Command::new(&self.config.program)
            .arg(input)
            .arg("-r")
            .arg(target_rate.to_string())
            .arg(&output)
            .status()
            .map_err(|source| Error::ResamplerSpawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::ResamplerFailed {
                program: self.config.program.clone(),
                input: input.to_path_buf(),
                status,
            });
        }

        Ok(output)
    }
}
