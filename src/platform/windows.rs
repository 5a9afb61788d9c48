// Windows: config and data share %APPDATA%/Tabspace.

use std::env;
use std::path::PathBuf;

fn roaming_app_data() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("Tabspace")
}

pub fn get_config_dir() -> PathBuf {
    roaming_app_data()
}

pub fn get_data_dir() -> PathBuf {
    roaming_app_data()
}
