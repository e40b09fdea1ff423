//! Errors raised while loading the bridge configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Why the bridge configuration could not be built.
///
/// Every variant is fatal at startup: the binary prints it and exits non-zero.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--config` or `MCUMGR_BRIDGE_CONFIG` names a file that does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read configuration file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a value of the wrong type
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value outside its allowed range, such as a zero baud rate
    #[error("Invalid configuration value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    /// A `MCUMGR_BRIDGE_*` override that does not parse
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError { var: String, message: String },
}

impl ConfigError {
    pub fn validation<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse<V: Into<String>, M: Into<String>>(var: V, message: M) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
