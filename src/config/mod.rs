//! Configuration module.
//!
//! TOML configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `MCUMGR_BRIDGE_CONFIG` environment variable (explicit path)
//! 2. `./mcumgr-bridge.toml` (current directory)
//! 3. `<config dir>/mcumgr-bridge/config.toml`
//! 4. Built-in defaults (no file required)
//!
//! The binary's `--config` flag bypasses this search, and its other flags
//! override whatever the file and environment produced.
//!
//! # Environment Overrides
//!
//! The pattern is `MCUMGR_BRIDGE_<SECTION>_<KEY>`, e.g.
//! `MCUMGR_BRIDGE_SERIAL_DEVICE=/dev/ttyUSB0` or `MCUMGR_BRIDGE_LOG_LEVEL=debug`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! device = "/dev/ttyACM0"
//! baud_rate = 115200
//!
//! [bridge]
//! udp_port = 2167
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{BridgeConfig, Config, LogFormat, LoggingConfig, SerialConfig};
