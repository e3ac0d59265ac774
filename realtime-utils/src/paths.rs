//! Where the realtime crates keep files on disk
//!
//! `config.toml` lives under the XDG config home and logs under the XDG
//! state home. Without a resolvable home directory both fall back to
//! `$HOME` (or `/tmp`) with the usual XDG suffixes.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const APP_NAME: &str = "realtime";

fn home_relative(parts: &[&str]) -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    parts.iter().fold(home, |path, part| path.join(part)).join(APP_NAME)
}

/// `~/.config/realtime` on Linux
pub fn config_dir() -> PathBuf {
    match ProjectDirs::from("", "", APP_NAME) {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => home_relative(&[".config"]),
    }
}

pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// `~/.local/state/realtime` on Linux
///
/// Platforms without a state directory (macOS, Windows) use the local data
/// directory instead.
pub fn state_dir() -> PathBuf {
    match ProjectDirs::from("", "", APP_NAME) {
        Some(dirs) => dirs
            .state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf(),
        None => home_relative(&[".local", "state"]),
    }
}

pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// `create_dir_all`, logged when something is actually created
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    tracing::debug!(path = %path.display(), "Creating directory");
    std::fs::create_dir_all(path)
}
