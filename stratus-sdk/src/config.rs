//! Configuration file for Stratus applications.
//!
//! All default values live in `config.default.toml`. This module embeds that file
//! at compile time and lets callers layer their own TOML on top of it.

use std::{fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use stratus_storage::StorageConfig;
use toml::{Table, Value};

use crate::{errors::ConfigError, toml_merge};

/// Embedded copy of the default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("config.default.toml");

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingToml {
    /// Default level, e.g. `"info"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-module directives such as `"stratus_storage=debug"`.
    #[serde(default)]
    pub module_levels: Vec<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingToml {
    fn default() -> Self {
        Self {
            level: default_level(),
            module_levels: Vec::new(),
        }
    }
}

/// The application configuration, one optional section per module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigToml {
    /// Object storage. Storage operations are unavailable without it.
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    /// Tracing output.
    #[serde(default)]
    pub logging: Option<LoggingToml>,
}

impl Default for ConfigToml {
    /// The embedded defaults.
    fn default() -> Self {
        ConfigToml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| ConfigToml {
            storage: None,
            logging: Some(LoggingToml::default()),
        })
    }
}

impl ConfigToml {
    /// Read and parse a configuration file, overlaying it on top of the embedded defaults.
    ///
    /// # Errors
    /// - [`ConfigError::NotFound`] if the file cannot be read.
    /// - [`ConfigError::Invalid`] / [`ConfigError::Merge`] as for
    ///   [`from_str_with_defaults`](Self::from_str_with_defaults).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_str_with_defaults(&raw)
    }

    /// Parse a raw TOML string, overlaying it on top of the embedded defaults.
    ///
    /// # Errors
    /// - [`ConfigError::Invalid`] if `raw` is not TOML or not a valid configuration.
    /// - [`ConfigError::Merge`] if a value has a different type than its default.
    pub fn from_str_with_defaults(raw: &str) -> Result<Self, ConfigError> {
        let defaults: Table = DEFAULT_CONFIG.parse()?;
        let user: Table = raw.parse()?;

        let merged = toml_merge::merge(defaults, user)?;
        Ok(Value::Table(merged).try_into()?)
    }

    /// The `[storage]` section.
    ///
    /// # Errors
    /// - [`ConfigError::MissingSection`] if there is none.
    pub fn storage(&self) -> Result<&StorageConfig, ConfigError> {
        self.storage
            .as_ref()
            .ok_or(ConfigError::MissingSection("storage"))
    }
}

impl FromStr for ConfigToml {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}
