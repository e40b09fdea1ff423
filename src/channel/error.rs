//! Channel-level error types.
//!
//! Kept separate from [`crate::error::BridgeError`] so channel implementations
//! do not need to know which side of the bridge they are serving.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur on a serial or virtual endpoint channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The device path does not exist.
    #[error("Device not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel could not be configured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No data could be transferred within the poll timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The peer went away (a read returned zero bytes).
    #[error("Channel closed")]
    Closed,

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl ChannelError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether the operation may simply be retried.
    ///
    /// Timeouts only mean nothing arrived yet; the read loops poll so they can
    /// notice a shutdown request.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChannelError::not_found("/dev/ttyACM0");
        assert_eq!(err.to_string(), "Device not found: /dev/ttyACM0");

        let err = ChannelError::config("baud rate must be non-zero");
        assert_eq!(
            err.to_string(),
            "Configuration error: baud rate must be non-zero"
        );

        assert_eq!(ChannelError::Closed.to_string(), "Channel closed");
    }

    #[test]
    fn test_timeout_error() {
        let err = ChannelError::timeout(Duration::from_millis(500));
        assert!(err.to_string().contains("500ms"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        let interrupted = ChannelError::Io(std::io::Error::from(std::io::ErrorKind::Interrupted));
        assert!(interrupted.is_transient());
        assert!(interrupted.is_interrupted());

        let would_block = ChannelError::Io(std::io::Error::from(std::io::ErrorKind::WouldBlock));
        assert!(!would_block.is_transient());

        let broken = ChannelError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(!broken.is_transient());
        assert!(!ChannelError::Closed.is_transient());
    }
}
