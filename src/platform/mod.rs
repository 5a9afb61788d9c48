// Tabspace platform paths
// Where settings and the tab database live on each desktop OS.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as os;
#[cfg(target_os = "macos")]
use macos as os;
#[cfg(target_os = "windows")]
use windows as os;

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabspace` or `~/.config/tabspace`
/// - **macOS**: `~/Library/Application Support/Tabspace`
/// - **Windows**: `%APPDATA%/Tabspace`
pub fn get_config_dir() -> PathBuf {
    os::get_config_dir()
}

/// Directory holding the spaces and tabs database.
///
/// - **Linux**: `$XDG_DATA_HOME/tabspace` or `~/.local/share/tabspace`
/// - **macOS**: `~/Library/Application Support/Tabspace`
/// - **Windows**: `%APPDATA%/Tabspace`
pub fn get_data_dir() -> PathBuf {
    os::get_data_dir()
}

/// Default location of the tab database file.
pub fn default_database_path() -> PathBuf {
    get_data_dir().join("tabspace.db")
}
