//! Runtime configuration
//!
//! Loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. JSON file named by `CINDERKV_CONFIG`
//! 3. `CINDERKV_*` environment variables

use crate::aof::AofConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_AOF_PATH: &str = "cinderkv.aof";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors, all reported at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the append-only log
    pub aof_path: PathBuf,
    /// Whether mutating commands are logged and replayed
    pub aof_enabled: bool,
    /// TCP address to serve on. Absent means interactive shell.
    pub listen: Option<String>,
    /// Default tracing filter directive
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            aof_path: PathBuf::from(DEFAULT_AOF_PATH),
            aof_enabled: true,
            listen: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load from `CINDERKV_CONFIG` (if set) then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `load`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CINDERKV_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CINDERKV_AOF_PATH") {
            self.aof_path = PathBuf::from(path);
        }

        if let Some(enabled) = lookup("CINDERKV_AOF_ENABLED") {
            self.aof_enabled = parse_bool(&enabled).ok_or(ConfigError::InvalidValue {
                name: "CINDERKV_AOF_ENABLED",
                value: enabled,
            })?;
        }

        if let Some(listen) = lookup("CINDERKV_LISTEN") {
            // An empty value switches back to the shell
            self.listen = Some(listen).filter(|addr| !addr.trim().is_empty());
        }

        if let Some(level) = lookup("CINDERKV_LOG") {
            self.log_level = level;
        }

        Ok(())
    }

    /// Persistence settings for the dispatcher
    pub fn aof_config(&self) -> AofConfig {
        AofConfig {
            path: self.aof_path.clone(),
            enabled: self.aof_enabled,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
