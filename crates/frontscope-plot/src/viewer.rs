//! Hand a rendered figure to the desktop image viewer.

use crate::Result;
use std::path::Path;
use std::process::{Child, Command};

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

/// Open `path` in the platform viewer without waiting for it to close.
pub fn open_in_viewer(path: impl AsRef<Path>) -> Result<Child> {
    let path = path.as_ref();
    tracing::debug!(file = %path.display(), "opening viewer");
    Ok(viewer_command(path).spawn()?)
}
