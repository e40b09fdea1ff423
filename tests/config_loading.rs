//! Integration tests for configuration files and environment overrides.

use mcumgr_serial_bridge::config::{Config, ConfigError, ConfigLoader, LogFormat};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    let file = write_config(
        r#"
        [serial]
        device = "/dev/ttyUSB0"
        baud_rate = 921600

        [bridge]
        udp_port = 1337
        forward_buffer_size = 256

        [logging]
        level = "debug"
        format = "compact"
        "#,
    );

    let loader = ConfigLoader::load_from(file.path()).unwrap();
    let config = loader.config();

    assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    assert_eq!(config.serial.device, "/dev/ttyUSB0");
    assert_eq!(config.serial.baud_rate, 921_600);
    assert_eq!(config.serial.read_buffer_size, 1024);
    assert_eq!(config.bridge.udp_port, 1337);
    assert_eq!(config.bridge.forward_buffer_size, 256);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = write_config("[serial]\nbaud_rate = 9600\n");
    env::set_var("MCUMGR_BRIDGE_SERIAL_BAUD_RATE", "57600");

    let result = ConfigLoader::load_from(file.path());
    env::remove_var("MCUMGR_BRIDGE_SERIAL_BAUD_RATE");

    assert_eq!(result.unwrap().config().serial.baud_rate, 57_600);
}

#[test]
#[serial]
fn test_explicit_path_env_is_resolved() {
    let file = write_config("[bridge]\nudp_port = 4000\n");
    env::set_var("MCUMGR_BRIDGE_CONFIG", file.path());

    let result = ConfigLoader::load();
    env::remove_var("MCUMGR_BRIDGE_CONFIG");

    let loader = result.unwrap();
    assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    assert_eq!(loader.config().bridge.udp_port, 4000);
}

#[test]
#[serial]
fn test_malformed_file_is_parse_error() {
    let file = write_config("[serial\ndevice = ");
    assert!(matches!(
        ConfigLoader::load_from(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
#[serial]
fn test_wrong_type_is_parse_error() {
    let file = write_config("[serial]\nbaud_rate = \"fast\"\n");
    assert!(matches!(
        ConfigLoader::load_from(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_round_trip_through_toml() {
    let mut config = Config::default();
    config.serial.device = "/dev/cu.usbmodem1101".to_string();
    config.logging.format = LogFormat::Json;

    let text = toml::to_string_pretty(&config).unwrap();
    assert!(text.contains("[serial]"));
    assert!(text.contains("format = \"json\""));

    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
