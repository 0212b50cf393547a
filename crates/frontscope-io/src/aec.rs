//! AEC filter coefficient sets.
//!
//! The host application writes one dump per (far-end reference, microphone)
//! pair, named after a base file by the configured pattern, by default
//! `<base>.f<ref>.m<mic>`.

use crate::dump::read_f32_dump;
use crate::{Error, Result};
use frontscope_config::FileConfig;
use std::path::PathBuf;

/// Time-domain AEC filter between one reference and one microphone.
#[derive(Debug, Clone, PartialEq)]
pub struct AecFilter {
    /// Far-end reference index.
    pub reference: usize,
    /// Microphone index.
    pub mic: usize,
    /// Dump file the coefficients came from.
    pub path: PathBuf,
    /// Impulse response coefficients.
    pub coefficients: Vec<f32>,
}

impl AecFilter {
    /// File name used for titles and log lines.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Read every filter dump for `num_ref` references and `num_mics` microphones.
///
/// All files are checked for existence before any is read, so a missing dump
/// is reported by name without partial work. Filters are ordered reference
/// major, microphone minor.
pub fn read_aec_filters(
    base: &str,
    num_ref: usize,
    num_mics: usize,
    files: &FileConfig,
) -> Result<Vec<AecFilter>> {
    let mut paths = Vec::with_capacity(num_ref * num_mics);
    for reference in 0..num_ref {
        for mic in 0..num_mics {
            let path = files.aec_filter_path(base, reference, mic);
            if !path.is_file() {
                return Err(Error::MissingFile(path));
            }
            paths.push((reference, mic, path));
        }
    }

    let mut filters = Vec::with_capacity(paths.len());
    for (reference, mic, path) in paths {
        let coefficients = read_f32_dump(&path)?;
        if coefficients.is_empty() {
            return Err(Error::invalid(&path, "filter dump is empty"));
        }
        filters.push(AecFilter {
            reference,
            mic,
            path,
            coefficients,
        });
    }

    tracing::info!(base, filters = filters.len(), "read AEC filter set");
    Ok(filters)
}
