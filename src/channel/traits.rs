//! Core traits for channel abstraction.
//!
//! Defines the `ChannelAdapter` trait so the serial device, the pseudo-terminal
//! and in-memory fakes can all drive the bridge loops interchangeably.

use super::error::ChannelError;
use std::time::Duration;

/// Line settings for the serial device.
///
/// Framing is always 8N1 without flow control; only the rate and the poll
/// timeout vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read/write poll timeout.
    pub timeout: Duration,
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Byte-oriented duplex channel.
///
/// Both the serial device and the virtual endpoint are driven through this
/// trait, which keeps the bridge loops testable against [`super::MockChannel`].
pub trait ChannelAdapter: Send + std::fmt::Debug {
    /// Write bytes to the channel.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, ChannelError>;

    /// Read bytes from the channel into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Zero means the peer is gone.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ChannelError>;

    /// Get the name/path of this channel.
    fn name(&self) -> &str;

    /// Set the read/write poll timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError>;

    /// Open an independent handle to the same channel.
    ///
    /// The bridge reads a channel on one thread and writes it on another.
    fn try_clone_box(&self) -> Result<Box<dyn ChannelAdapter>, ChannelError>;

    /// Write all of `data`, retrying short writes.
    fn write_all_bytes(&mut self, mut data: &[u8]) -> Result<(), ChannelError> {
        while !data.is_empty() {
            match self.write_bytes(data) {
                Ok(0) => return Err(ChannelError::Closed),
                Ok(n) => data = &data[n..],
                Err(e) if e.is_interrupted() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
