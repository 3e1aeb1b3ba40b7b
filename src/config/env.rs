//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, merge};

/// Read a variable, treating empty and whitespace-only values as unset.
pub(super) fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse a variable. Unset is `Ok(None)`; unparsable is an error.
pub(super) fn env_parse<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid {name} value '{raw}': {e}")),
        None => Ok(None),
    }
}

pub(super) fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

impl ServerConfig {
    /// Load configuration from environment variables (and defaults).
    ///
    /// The .env file is loaded into the environment by `main` before this runs.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }
}
