//! Inline stream demultiplexer.
//!
//! The device multiplexes two logical streams onto one UART: human-readable
//! console text, and mcumgr frames. A frame starts with a two-byte marker
//! (see [`MarkerTable`]) and ends with, and includes, a single `\n`. Everything
//! else on the wire is console text.
//!
//! [`Demultiplexer`] keeps its state across calls to [`Demultiplexer::feed`], so
//! a marker or a frame may straddle any number of reads.
//!
//! ```
//! use mcumgr_serial_bridge::demux::{Demultiplexer, Segment};
//!
//! let mut demux = Demultiplexer::new();
//! let out = demux.feed(b"ab\x04\x14x\nc");
//! assert_eq!(
//!     out,
//!     vec![
//!         Segment::Plain(b"ab".to_vec()),
//!         Segment::Packet(b"\x04\x14x\n".to_vec()),
//!         Segment::Plain(b"c".to_vec()),
//!     ]
//! );
//! ```

use memchr::{memchr, memchr2};
use std::mem;

/// Terminates every frame.
pub const NEWLINE: u8 = 0x0A;

/// A two-byte frame start marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// First byte on the wire.
    pub head: u8,
    /// Byte that must immediately follow `head`.
    pub tail: u8,
}

impl Marker {
    pub const fn new(head: u8, tail: u8) -> Self {
        Self { head, tail }
    }
}

/// Fixed mapping from a marker head to its required tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTable {
    entries: [Marker; 2],
}

impl MarkerTable {
    /// The two markers used by the mcumgr serial transport.
    pub const MCUMGR: MarkerTable =
        MarkerTable::new(Marker::new(0x06, 0x09), Marker::new(0x04, 0x14));

    pub const fn new(first: Marker, second: Marker) -> Self {
        Self {
            entries: [first, second],
        }
    }

    /// The tail byte required after `head`, if `head` starts a marker.
    pub fn tail_for(&self, head: u8) -> Option<u8> {
        self.entries.iter().find(|m| m.head == head).map(|m| m.tail)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.entries
    }

    /// Position of the first marker head in `haystack`, with its tail.
    fn find_head(&self, haystack: &[u8]) -> Option<(usize, u8)> {
        let [a, b] = self.entries;
        let pos = memchr2(a.head, b.head, haystack)?;
        let tail = if haystack[pos] == a.head { a.tail } else { b.tail };
        Some((pos, tail))
    }
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self::MCUMGR
    }
}

/// Classification state carried between reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemuxState {
    /// Between frames; bytes are console text.
    #[default]
    Idle,
    /// A marker head was seen; the next byte must be `expected`.
    AwaitingTail { expected: u8 },
    /// Inside a frame, accumulating until the newline.
    InPacket,
}

/// One ordered unit of demultiplexer output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Console text, to be written to the console sink in one write.
    Plain(Vec<u8>),
    /// A complete frame, marker and newline included.
    Packet(Vec<u8>),
}

/// Running counters, mostly for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    /// Frames emitted.
    pub packets: u64,
    /// Bytes classified as console text.
    pub plain_bytes: u64,
    /// Marker heads that turned out to be plain text.
    pub recoveries: u64,
}

/// Byte-level state machine splitting console text from mcumgr frames.
#[derive(Debug, Clone, Default)]
pub struct Demultiplexer {
    markers: MarkerTable,
    state: DemuxState,
    packet: Vec<u8>,
    stats: DemuxStats,
}

impl Demultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: MarkerTable) -> Self {
        Self {
            markers,
            ..Self::default()
        }
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    /// Bytes of the frame currently being assembled, marker included.
    ///
    /// Empty while [`DemuxState::Idle`].
    pub fn pending(&self) -> &[u8] {
        &self.packet
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Classify one read's worth of bytes.
    ///
    /// Returns the output in wire order. Console text is coalesced: a call
    /// produces one [`Segment::Plain`] before each completed frame that had
    /// text ahead of it, plus one for any text after the last frame.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Segment> {
        let mut out = Vec::new();
        let mut plain = Vec::new();
        let mut rest = chunk;

        while !rest.is_empty() {
            match self.state {
                DemuxState::Idle => match self.markers.find_head(rest) {
                    Some((pos, tail)) => {
                        plain.extend_from_slice(&rest[..pos]);
                        self.packet.clear();
                        self.packet.push(rest[pos]);
                        self.state = DemuxState::AwaitingTail { expected: tail };
                        rest = &rest[pos + 1..];
                    }
                    None => {
                        plain.extend_from_slice(rest);
                        rest = &[];
                    }
                },
                DemuxState::AwaitingTail { expected } => {
                    let byte = rest[0];
                    rest = &rest[1..];
                    if byte == expected {
                        self.packet.push(byte);
                        self.state = DemuxState::InPacket;
                    } else {
                        // False marker: the held head and this byte are both text.
                        plain.extend_from_slice(&self.packet);
                        plain.push(byte);
                        self.packet.clear();
                        self.state = DemuxState::Idle;
                        self.stats.recoveries += 1;
                    }
                }
                DemuxState::InPacket => match memchr(NEWLINE, rest) {
                    Some(pos) => {
                        self.packet.extend_from_slice(&rest[..=pos]);
                        rest = &rest[pos + 1..];
                        self.state = DemuxState::Idle;
                        self.flush_plain(&mut plain, &mut out);
                        self.stats.packets += 1;
                        out.push(Segment::Packet(mem::take(&mut self.packet)));
                    }
                    None => {
                        self.packet.extend_from_slice(rest);
                        rest = &[];
                    }
                },
            }
        }

        self.flush_plain(&mut plain, &mut out);
        out
    }

    fn flush_plain(&mut self, plain: &mut Vec<u8>, out: &mut Vec<Segment>) {
        if plain.is_empty() {
            return;
        }
        self.stats.plain_bytes += plain.len() as u64;
        out.push(Segment::Plain(mem::take(plain)));
    }
}
