// macOS: config and data share ~/Library/Application Support/Tabspace.

use std::env;
use std::path::PathBuf;

fn application_support() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("Tabspace")
}

pub fn get_config_dir() -> PathBuf {
    application_support()
}

pub fn get_data_dir() -> PathBuf {
    application_support()
}
