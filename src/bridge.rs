//! Bridge orchestration.
//!
//! ```text
//! serial ──> run_demux_loop ──┬──> console (stdout)
//!                             └──> virtual endpoint
//! virtual endpoint ──> run_forwarder ──> serial
//! ```
//!
//! The two directions run on separate threads and share nothing but the
//! shutdown flag; each owns its own handle to either channel.

use crate::channel::{ChannelAdapter, ChannelError};
use crate::config::Config;
use crate::demux::{DemuxStats, Demultiplexer, Segment};
use crate::error::BridgeError;
use crate::forwarder::run_forwarder;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Log target carrying one event per completed frame.
pub const PACKET_TARGET: &str = "mcumgr";

/// Buffer sizes for the two loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Bytes requested per serial read.
    pub read_buffer_size: usize,
    /// Scratch buffer of the outbound forwarder.
    pub forward_buffer_size: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: 1024,
            forward_buffer_size: 128,
        }
    }
}

impl From<&Config> for BridgeOptions {
    fn from(config: &Config) -> Self {
        Self {
            read_buffer_size: config.serial.read_buffer_size,
            forward_buffer_size: config.bridge.forward_buffer_size,
        }
    }
}

/// Read the serial device, classify, and deliver until an error or shutdown.
///
/// Console text goes to `console`, one write per plain segment. Completed
/// frames are logged at `info` on [`PACKET_TARGET`] and written to `endpoint`.
/// Delivery failures on either sink are logged and skipped; only a failed
/// serial read ends the loop.
///
/// The frame report is an ordinary event: a `RUST_LOG` that disables
/// `mcumgr=info` hides it. The configured level keeps it, see
/// [`crate::logging::build_filter`].
pub fn run_demux_loop(
    demux: &mut Demultiplexer,
    serial: &mut dyn ChannelAdapter,
    endpoint: &mut dyn ChannelAdapter,
    console: &mut dyn Write,
    read_buffer_size: usize,
    shutdown: &AtomicBool,
) -> Result<(), BridgeError> {
    let mut buffer = vec![0u8; read_buffer_size.max(1)];

    while !shutdown.load(Ordering::Relaxed) {
        let n = match serial.read_bytes(&mut buffer) {
            Ok(0) => return Err(BridgeError::SerialRead(ChannelError::Closed)),
            Ok(n) => n,
            Err(e) if e.is_transient() => continue,
            Err(e) => return Err(BridgeError::SerialRead(e)),
        };
        trace!(bytes = n, "serial read");

        for segment in demux.feed(&buffer[..n]) {
            match segment {
                Segment::Plain(text) => write_console(console, &text),
                Segment::Packet(packet) => deliver_packet(endpoint, &packet),
            }
        }
    }

    Ok(())
}

fn write_console(console: &mut dyn Write, text: &[u8]) {
    if let Err(e) = console.write_all(text).and_then(|()| console.flush()) {
        warn!(error = %e, bytes = text.len(), "Error writing to console");
    }
}

fn deliver_packet(endpoint: &mut dyn ChannelAdapter, packet: &[u8]) {
    info!(target: PACKET_TARGET, len = packet.len(), "{}", packet.escape_ascii());
    if let Err(e) = endpoint.write_all_bytes(packet) {
        warn!(error = %e, endpoint = endpoint.name(), "Error sending packet to virtual endpoint");
    }
}

/// Both channels plus the demultiplexer state, ready to run.
#[derive(Debug)]
pub struct Bridge {
    serial: Box<dyn ChannelAdapter>,
    endpoint: Box<dyn ChannelAdapter>,
    demux: Demultiplexer,
    options: BridgeOptions,
}

impl Bridge {
    pub fn new(
        serial: Box<dyn ChannelAdapter>,
        endpoint: Box<dyn ChannelAdapter>,
        options: BridgeOptions,
    ) -> Self {
        Self {
            serial,
            endpoint,
            demux: Demultiplexer::new(),
            options,
        }
    }

    /// Start the outbound forwarder on its own thread.
    ///
    /// The thread logs how it ended; its error never reaches the demux loop.
    pub fn spawn_forwarder(
        &self,
        shutdown: Arc<AtomicBool>,
    ) -> Result<JoinHandle<Option<u64>>, BridgeError> {
        let mut endpoint = self
            .endpoint
            .try_clone_box()
            .map_err(BridgeError::EndpointOpen)?;
        let mut serial = self
            .serial
            .try_clone_box()
            .map_err(BridgeError::SerialOpen)?;
        let buffer_size = self.options.forward_buffer_size;

        std::thread::Builder::new()
            .name("endpoint-forwarder".into())
            .spawn(move || {
                match run_forwarder(&mut *endpoint, &mut *serial, buffer_size, &shutdown) {
                    Ok(bytes) => {
                        debug!(bytes, "forwarder stopped");
                        Some(bytes)
                    }
                    Err(e) => {
                        warn!(error = %e, "outbound forwarder stopped");
                        None
                    }
                }
            })
            .map_err(|source| BridgeError::Spawn {
                name: "endpoint-forwarder",
                source,
            })
    }

    /// Run both directions; blocks until the demux loop ends.
    ///
    /// The forwarder thread is left running if it has not stopped by then.
    pub fn run(
        mut self,
        console: &mut dyn Write,
        shutdown: Arc<AtomicBool>,
    ) -> Result<DemuxStats, BridgeError> {
        self.spawn_forwarder(Arc::clone(&shutdown))?;

        info!(
            serial = self.serial.name(),
            endpoint = self.endpoint.name(),
            "bridge running"
        );

        let result = run_demux_loop(
            &mut self.demux,
            &mut *self.serial,
            &mut *self.endpoint,
            console,
            self.options.read_buffer_size,
            &shutdown,
        );

        let stats = self.demux.stats();
        info!(
            packets = stats.packets,
            plain_bytes = stats.plain_bytes,
            recoveries = stats.recoveries,
            "demultiplexer stopped"
        );
        result.map(|()| stats)
    }
}
