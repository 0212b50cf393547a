//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/frontscope/config.toml`
//! - macOS: `~/Library/Application Support/frontscope/config.toml`
//! - Windows: `%APPDATA%\frontscope\config.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "frontscope";

/// File name of the user configuration.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path the tools look at when no `--config` is given.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}
