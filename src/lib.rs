//! mcumgr serial bridge library
//!
//! A microcontroller shares one UART between its console and the mcumgr
//! device-management protocol, prefixing each mcumgr frame with a two-byte
//! marker. This crate splits that stream: console text goes to stdout, frames
//! go to a pseudo-terminal that mcumgr client software can open as if it were
//! a dedicated serial device. Requests the client writes to the
//! pseudo-terminal are passed through to the device unchanged.
//!
//! # Modules
//!
//! - `demux`: the byte-level state machine separating frames from console text
//! - `channel`: serial, pseudo-terminal and mock channels behind one trait
//! - `bridge`: the serial read loop and thread orchestration
//! - `forwarder`: the outbound passthrough loop
//! - `config`: configuration with TOML and environment support
//! - `logging`: tracing subscriber setup
//! - `error`: bridge error taxonomy

pub mod bridge;
pub mod channel;
pub mod config;
pub mod demux;
pub mod error;
pub mod forwarder;
pub mod logging;

// Re-export commonly used types for convenience
pub use bridge::{run_demux_loop, Bridge, BridgeOptions};
pub use channel::{ChannelAdapter, ChannelError, MockChannel, PortConfiguration, SerialChannel};
#[cfg(unix)]
pub use channel::PtyChannel;
pub use config::{Config, ConfigError, ConfigLoader};
pub use demux::{DemuxState, DemuxStats, Demultiplexer, Marker, MarkerTable, Segment};
pub use error::{BridgeError, BridgeResult};
pub use forwarder::run_forwarder;
