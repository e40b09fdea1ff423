//! Configuration schema definitions.
//!
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! changes.

use super::error::{ConfigError, ConfigResult};
use crate::channel::PortConfiguration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device settings
    pub serial: SerialConfig,
    /// Bridge loop settings
    pub bridge: BridgeConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.device.trim().is_empty() {
            return Err(ConfigError::validation("serial.device", "must not be empty"));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::validation("serial.baud_rate", "must be non-zero"));
        }
        if self.serial.read_buffer_size == 0 {
            return Err(ConfigError::validation(
                "serial.read_buffer_size",
                "must be non-zero",
            ));
        }
        if self.bridge.forward_buffer_size == 0 {
            return Err(ConfigError::validation(
                "bridge.forward_buffer_size",
                "must be non-zero",
            ));
        }
        if self.bridge.endpoint_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "bridge.endpoint_timeout_ms",
                "must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Serial device section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path
    pub device: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Poll timeout for reads in milliseconds
    pub read_timeout_ms: u64,
    /// Bytes requested per read
    pub read_buffer_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            read_buffer_size: 1024,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration {
            baud_rate: self.baud_rate,
            timeout: self.read_timeout(),
        }
    }
}

/// Bridge section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// UDP port reserved for the network-facing mcumgr bridge
    pub udp_port: u16,
    /// Scratch buffer size of the outbound forwarder
    pub forward_buffer_size: usize,
    /// Poll timeout for the virtual endpoint in milliseconds
    pub endpoint_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            udp_port: 2167,
            forward_buffer_size: 128,
            endpoint_timeout_ms: 250,
        }
    }
}

impl BridgeConfig {
    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_millis(self.endpoint_timeout_ms)
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "mcumgr_serial_bridge=debug"
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.device, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.read_buffer_size, 1024);
        assert_eq!(config.bridge.udp_port, 2167);
        assert_eq!(config.bridge.forward_buffer_size, 128);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_configuration() {
        let serial = SerialConfig {
            baud_rate: 9600,
            read_timeout_ms: 50,
            ..Default::default()
        };
        let port = serial.port_configuration();
        assert_eq!(port.baud_rate, 9600);
        assert_eq!(port.timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let toml_str = r#"
            [serial]
            device = "/dev/ttyUSB1"

            [logging]
            format = "json"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.bridge.udp_port, 2167);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.serial.baud_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { ref key, .. }) if key == "serial.baud_rate"
        ));

        let mut config = Config::default();
        config.bridge.forward_buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.serial.device = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("fancy".parse::<LogFormat>().is_err());
    }
}
