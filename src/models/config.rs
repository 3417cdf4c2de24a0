use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from lab.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

/// GitLab API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// GitLab instance URL
    #[serde(default = "default_host")]
    pub host: String,
    /// Private access token sent as PRIVATE-TOKEN
    #[serde(default)]
    pub token: Option<String>,
    /// Timeout in seconds for API requests
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_host() -> String {
    "https://gitlab.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Trace polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Delay between trace polls, also applied before the first poll
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}

impl TraceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))
    }

    /// Try to load config from lab.toml in the given directory
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join("lab.toml");
        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge environment overrides into the config
    pub fn with_overrides(mut self, host: Option<String>, token: Option<String>) -> Self {
        if let Some(h) = host {
            self.gitlab.host = h;
        }
        if let Some(t) = token {
            self.gitlab.token = Some(t);
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, toml::de::Error),
}
