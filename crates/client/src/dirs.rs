//! Platform-specific directory utilities
//!
//! Follows platform conventions for cache and data directories.

use std::path::PathBuf;

const APP_NAME: &str = "explorer";

/// Root directory for session logs.
///
/// - macOS: `~/Library/Caches/explorer/logs`
/// - Linux: `~/.cache/explorer/logs` (or `$XDG_CACHE_HOME/explorer/logs`)
/// - Windows: `%LOCALAPPDATA%\explorer\logs`
/// - Fallback: `/tmp/explorer/logs`
pub fn log_dir() -> PathBuf {
    let base_dir = directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp").join(APP_NAME));

    base_dir.join("logs")
}

/// Default location of the explored-chunk log.
///
/// - macOS: `~/Library/Application Support/explorer`
/// - Linux: `~/.local/share/explorer` (or `$XDG_DATA_HOME/explorer`)
/// - Windows: `%APPDATA%\explorer`
/// - Fallback: `./save_data`
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
}
