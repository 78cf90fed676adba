//! Path resolution for gmail-watch config and credential files.
//!
//! Resolution order for the config file:
//!   1. .gmail-watch.toml in cwd (per-project setup)
//!   2. {user_config_dir}/gmail-watch/config.toml

use std::path::PathBuf;

pub const TOKEN_FILE: &str = "token.json";
pub const CLIENT_SECRETS_FILE: &str = "client_credentials.json";

/// Return the OS-native gmail-watch config directory.
pub fn app_config_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "gmail-watch") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        home_dir().join(".config").join("gmail-watch")
    }
}

/// Resolve the config file path, or None if neither location has one.
pub fn config_file() -> Option<PathBuf> {
    let local = PathBuf::from(".gmail-watch.toml");
    if local.is_file() {
        return Some(local);
    }
    let global = app_config_dir().join("config.toml");
    if global.is_file() {
        return Some(global);
    }
    None
}

/// Get the user's home directory.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand ~ to home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        home_dir().join(rest)
    } else if path == "~" {
        home_dir()
    } else {
        PathBuf::from(path)
    }
}
