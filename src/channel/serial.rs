//! Serial device channel.
//!
//! Wraps the `serialport` crate's `SerialPort` trait with our own
//! `ChannelAdapter` trait so the bridge loops never touch the device directly.

use super::error::ChannelError;
use super::traits::{ChannelAdapter, PortConfiguration};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Serial channel wrapping `serialport::SerialPort`.
pub struct SerialChannel {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The device path for identification.
    name: String,
    /// Current poll timeout, reported back in `ChannelError::Timeout`.
    timeout: Duration,
}

impl SerialChannel {
    /// Open a serial device at 8N1 with the given rate and timeout.
    ///
    /// # Example
    /// ```no_run
    /// use mcumgr_serial_bridge::channel::{PortConfiguration, SerialChannel};
    ///
    /// let port = SerialChannel::open("/dev/ttyACM0", PortConfiguration::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, config: PortConfiguration) -> Result<Self, ChannelError> {
        if config.baud_rate == 0 {
            return Err(ChannelError::config("baud rate must be non-zero"));
        }

        let port = serialport::new(path, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .flow_control(serialport::FlowControl::None)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => ChannelError::not_found(path),
                serialport::ErrorKind::Io(ErrorKind::NotFound) => ChannelError::not_found(path),
                serialport::ErrorKind::InvalidInput => ChannelError::config(e.to_string()),
                _ => ChannelError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: path.to_string(),
            timeout: config.timeout,
        })
    }

    fn map_io(&self, err: std::io::Error) -> ChannelError {
        if err.kind() == ErrorKind::TimedOut {
            ChannelError::timeout(self.timeout)
        } else {
            ChannelError::Io(err)
        }
    }
}

impl ChannelAdapter for SerialChannel {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, ChannelError> {
        self.port.write(data).map_err(|e| self.map_io(e))
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ChannelError> {
        self.port.read(buffer).map_err(|e| self.map_io(e))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.port.set_timeout(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    fn try_clone_box(&self) -> Result<Box<dyn ChannelAdapter>, ChannelError> {
        Ok(Box::new(Self {
            port: self.port.try_clone()?,
            name: self.name.clone(),
            timeout: self.timeout,
        }))
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .field("timeout", &self.timeout)
            .finish()
    }
}
