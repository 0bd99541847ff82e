//! Configuration module for gator.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{GatorError, Result};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gator")
}

fn default_db_path() -> String {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().join("gator.db").to_string_lossy().into_owned(),
        None => "gator.db".to_string(),
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, appended to in addition to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Aggregator and fetcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Polling interval used when `agg` is run without an argument.
    #[serde(default = "default_interval")]
    pub default_interval: String,
    /// User agent sent with every feed request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
}

fn default_interval() -> String {
    "1m".to_string()
}

fn default_user_agent() -> String {
    concat!("gator/", env!("CARGO_PKG_VERSION"), " (RSS aggregator)").to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_interval: default_interval(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_feed_size_bytes: default_max_feed_size(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Name of the user commands act as when no `--user` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

impl Config {
    /// Default location of the config file (`<config dir>/gator/config.toml`).
    pub fn default_path() -> PathBuf {
        match project_dirs() {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => PathBuf::from("gator.toml"),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatorError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration, falling back to defaults when the file does not exist.
    ///
    /// Environment variable overrides are applied either way.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(GatorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatorError::Config(format!("config parse error: {e}")))
    }

    /// Record `name` as the current user in the config file at `path`.
    ///
    /// Only `current_user_name` is touched. Everything else stays as the
    /// file had it, so env and command-line overrides and unset defaults
    /// are never written out. A missing file is created.
    pub fn save_current_user<P: AsRef<Path>>(path: P, name: &str) -> Result<()> {
        let path = path.as_ref();
        let mut table = match std::fs::read_to_string(path) {
            Ok(content) => content
                .parse::<toml::Table>()
                .map_err(|e| GatorError::Config(format!("config parse error: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => return Err(e.into()),
        };
        table.insert(
            "current_user_name".to_string(),
            toml::Value::String(name.to_string()),
        );

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(&table)
            .map_err(|e| GatorError::Config(format!("config serialize error: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATOR_DATABASE_PATH`: Override the database file
    /// - `GATOR_LOG_LEVEL`: Override the log level
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides looked up by variable name. Empty values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());
        if let Some(path) = lookup("GATOR_DATABASE_PATH") {
            self.database.path = path;
        }
        if let Some(level) = lookup("GATOR_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
