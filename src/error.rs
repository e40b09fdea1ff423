//! Bridge-level error taxonomy.
//!
//! Open failures are fatal at startup. Read failures end only the loop that
//! hit them. Delivery failures to the console or the virtual endpoint never
//! become a `BridgeError`; they are logged where they happen.

use crate::channel::ChannelError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors that stop a part of the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Unable to open serial device: {0}")]
    SerialOpen(#[source] ChannelError),

    #[error("Unable to allocate virtual endpoint: {0}")]
    EndpointOpen(#[source] ChannelError),

    #[error("Serial read failed: {0}")]
    SerialRead(#[source] ChannelError),

    #[error("Serial write failed: {0}")]
    SerialWrite(#[source] ChannelError),

    #[error("Virtual endpoint read failed: {0}")]
    EndpointRead(#[source] ChannelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Bridge task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A specialized `Result` type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
