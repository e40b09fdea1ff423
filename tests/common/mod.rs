//! Shared test utilities for bridge integration tests.
//!
//! - Mock channels preloaded with chunked reads
//! - A console sink that records each write separately
//! - A tracing layer that records emitted events

#![allow(dead_code)]

use mcumgr_serial_bridge::demux::{Demultiplexer, Segment};
use mcumgr_serial_bridge::MockChannel;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Create a mock channel that serves `chunks`, one per read.
///
/// # Example
/// ```ignore
/// let serial = mock_with_chunks("serial", &[b"\x06\x09O", b"K\n"]);
/// ```
pub fn mock_with_chunks(name: &str, chunks: &[&[u8]]) -> MockChannel {
    let mut mock = MockChannel::new(name);
    for chunk in chunks {
        mock.enqueue_read(chunk);
    }
    mock
}

/// Console sink keeping every `write_all` call as its own entry.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    pub pending: Vec<u8>,
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    /// Fail this many upcoming writes.
    pub fail_next: usize,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written, concatenated.
    pub fn contents(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

impl Write for RecordingConsole {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"));
        }
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        if !self.pending.is_empty() {
            self.writes.push(std::mem::take(&mut self.pending));
        }
        Ok(())
    }
}

/// Feed `chunks` through a fresh demultiplexer and collect the output.
///
/// Returns (concatenated console text, packets in order).
pub fn demux_all<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> (Vec<u8>, Vec<Vec<u8>>) {
    let mut demux = Demultiplexer::new();
    let mut plain = Vec::new();
    let mut packets = Vec::new();
    for chunk in chunks {
        for segment in demux.feed(chunk) {
            match segment {
                Segment::Plain(text) => plain.extend_from_slice(&text),
                Segment::Packet(packet) => packets.push(packet),
            }
        }
    }
    (plain, packets)
}

/// One event seen by [`EventCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub target: String,
    pub level: Level,
    pub message: String,
}

/// Layer keeping every event it sees, for assertions on diagnostics.
#[derive(Debug, Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn for_target(&self, target: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.target == target).collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}
