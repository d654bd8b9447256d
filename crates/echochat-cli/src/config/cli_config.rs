//! CLI configuration file support
//!
//! Loads configuration from ~/.config/echochat/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CHUNK_TIMEOUT_SECS: u64 = 30;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Server base URL
    pub server_url: Option<String>,
    /// Seconds to wait for each chunk; 0 disables the timeout
    pub chunk_timeout_secs: Option<u64>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "Ignoring invalid config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("echochat").join("config.toml"))
    }
}

/// Effective settings after applying flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub chunk_timeout: Option<Duration>,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &CliConfig) -> Self {
        let server_url = cli
            .server
            .clone()
            .or_else(|| config.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let timeout_secs = cli
            .timeout
            .or(config.chunk_timeout_secs)
            .unwrap_or(DEFAULT_CHUNK_TIMEOUT_SECS);
        let chunk_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Self {
            server_url,
            chunk_timeout,
        }
    }
}
