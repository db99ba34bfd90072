//! Platform-specific directory utilities

use std::path::PathBuf;

/// Platform-specific log directory for the runner
///
/// - macOS: `~/Library/Caches/ability-sim/logs`
/// - Linux: `~/.cache/ability-sim/logs` (or `$XDG_CACHE_HOME/ability-sim/logs`)
/// - Windows: `%LOCALAPPDATA%\ability-sim\logs`
/// - Fallback: `/tmp/ability-sim/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ability-sim")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/ability-sim"))
        .join("logs")
}

/// Platform-specific directory where run reports are written by default
pub fn report_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ability-sim")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./reports"))
        .join("reports")
}
