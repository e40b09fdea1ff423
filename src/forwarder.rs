//! Outbound passthrough: virtual endpoint to serial device.
//!
//! Requests written by the management client are already framed, so they are
//! copied to the device untouched.

use crate::channel::{ChannelAdapter, ChannelError};
use crate::error::BridgeError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// Copy everything read from `endpoint` to `serial` until an error or shutdown.
///
/// Each read is written out in full before the next read, using one scratch
/// buffer of `buffer_size` bytes. Returns the number of bytes forwarded when
/// `shutdown` is raised.
pub fn run_forwarder(
    endpoint: &mut dyn ChannelAdapter,
    serial: &mut dyn ChannelAdapter,
    buffer_size: usize,
    shutdown: &AtomicBool,
) -> Result<u64, BridgeError> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut forwarded = 0u64;

    while !shutdown.load(Ordering::Relaxed) {
        let n = match endpoint.read_bytes(&mut buffer) {
            Ok(0) => return Err(BridgeError::EndpointRead(ChannelError::Closed)),
            Ok(n) => n,
            Err(e) if e.is_transient() => continue,
            Err(e) => return Err(BridgeError::EndpointRead(e)),
        };

        serial
            .write_all_bytes(&buffer[..n])
            .map_err(BridgeError::SerialWrite)?;
        forwarded += n as u64;
        trace!(bytes = n, "forwarded to serial");
    }

    Ok(forwarded)
}
