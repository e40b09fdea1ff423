//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "MCUMGR_BRIDGE";

/// Config file name in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "mcumgr-bridge.toml";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Per-user config directory name
const APP_DIR_NAME: &str = "mcumgr-bridge";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "MCUMGR_BRIDGE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `MCUMGR_BRIDGE_CONFIG` environment variable (explicit path)
    /// 2. `./mcumgr-bridge.toml` (current directory)
    /// 3. `<config dir>/mcumgr-bridge/config.toml` (XDG config home, `~/Library/Application
    ///    Support` or `%APPDATA%`)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override any file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file), env overrides applied.
    pub fn with_defaults() -> ConfigResult<Self> {
        let mut config = Config::default();
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config_path: None,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config file path for this user.
pub fn get_default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| {
        dirs.config_dir()
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    })
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read `MCUMGR_BRIDGE_<suffix>` and parse it, if set.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, suffix);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {}", what))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `MCUMGR_BRIDGE_<SECTION>_<KEY>`
/// For example:
/// - `MCUMGR_BRIDGE_SERIAL_DEVICE=/dev/ttyUSB0`
/// - `MCUMGR_BRIDGE_SERIAL_BAUD_RATE=921600`
/// - `MCUMGR_BRIDGE_BRIDGE_UDP_PORT=1337`
/// - `MCUMGR_BRIDGE_LOG_FORMAT=json`
pub fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(val) = env_value::<String>("SERIAL_DEVICE", "device path")? {
        config.serial.device = val;
    }
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_READ_TIMEOUT_MS", "timeout")? {
        config.serial.read_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_READ_BUFFER_SIZE", "buffer size")? {
        config.serial.read_buffer_size = val;
    }

    if let Some(val) = env_value("BRIDGE_UDP_PORT", "port number")? {
        config.bridge.udp_port = val;
    }
    if let Some(val) = env_value("BRIDGE_FORWARD_BUFFER_SIZE", "buffer size")? {
        config.bridge.forward_buffer_size = val;
    }
    if let Some(val) = env_value("BRIDGE_ENDPOINT_TIMEOUT_MS", "timeout")? {
        config.bridge.endpoint_timeout_ms = val;
    }

    if let Some(val) = env_value::<String>("LOG_LEVEL", "log level")? {
        config.logging.level = val;
    }
    if let Some(val) = env_value("LOG_FORMAT", "log format")? {
        config.logging.format = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().bridge.udp_port, 2167);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("MCUMGR_BRIDGE_BRIDGE_UDP_PORT", "9999");
        env::set_var("MCUMGR_BRIDGE_SERIAL_DEVICE", "/dev/ttyUSB3");
        env::set_var("MCUMGR_BRIDGE_LOG_FORMAT", "compact");

        let loader = ConfigLoader::with_defaults().unwrap();
        assert_eq!(loader.config().bridge.udp_port, 9999);
        assert_eq!(loader.config().serial.device, "/dev/ttyUSB3");
        assert_eq!(loader.config().logging.format, LogFormat::Compact);

        env::remove_var("MCUMGR_BRIDGE_BRIDGE_UDP_PORT");
        env::remove_var("MCUMGR_BRIDGE_SERIAL_DEVICE");
        env::remove_var("MCUMGR_BRIDGE_LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        env::set_var("MCUMGR_BRIDGE_SERIAL_BAUD_RATE", "fast");

        let result = ConfigLoader::with_defaults();
        env::remove_var("MCUMGR_BRIDGE_SERIAL_BAUD_RATE");

        match result {
            Err(ConfigError::EnvParseError { var, .. }) => {
                assert_eq!(var, "MCUMGR_BRIDGE_SERIAL_BAUD_RATE")
            }
            other => panic!("Expected EnvParseError, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file() {
        let result = ConfigLoader::load_from("/nonexistent/mcumgr-bridge.toml");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Some(path) = get_default_config_path() {
            assert!(path.ends_with("mcumgr-bridge/config.toml"));
        }
    }
}
