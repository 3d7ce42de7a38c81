//! Configuration management for SolveCam

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default SolveCam API host
pub const DEFAULT_API_HOST: &str = "https://api.solvecam.app";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL (scheme + host, no trailing slash)
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Where API data comes from
    #[serde(default)]
    pub data_source: DataSource,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connectivity retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Task polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

/// Data source selected when the client is constructed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Real SolveCam backend
    #[default]
    Backend,
    /// Built-in fixture data, no network
    Fixture,
}

/// Retry settings for connectivity failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

/// Polling settings for asynchronous tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// User preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    30
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            data_source: DataSource::default(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            polling: PollingConfig::default(),
            preferences: Preferences::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.solvecam/config.yaml)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".solvecam").join("config.yaml"))
    }

    /// Resolve the config path from an optional override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path override
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default_at(path: Option<&str>) -> Result<Self> {
        match Self::load_at(path) {
            Err(crate::error::Error::Config(ConfigError::NotFound)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Directory holding the config file; credentials live next to it
    pub fn state_dir(path: Option<&str>) -> Result<PathBuf> {
        let config_path = Self::resolve_path(path)?;
        Ok(config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check values a bad edit or override could break
    pub fn validate(&self) -> Result<()> {
        if !(self.api_host.starts_with("http://") || self.api_host.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_host must start with http:// or https:// (got '{}')",
                self.api_host
            ))
            .into());
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()).into());
        }
        if self.polling.max_attempts == 0 {
            return Err(
                ConfigError::Invalid("polling.max_attempts must be positive".to_string()).into(),
            );
        }
        Ok(())
    }
}

/// Set file permissions to 600 on Unix systems
pub fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}
