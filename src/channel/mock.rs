//! Mock channel implementation for testing.
//!
//! Provides a `MockChannel` that stands in for either the serial device or the
//! virtual endpoint without real hardware or pseudo-terminal allocation.
//! Reads are served chunk by chunk so tests control exactly how the stream is
//! split across reads.

use super::error::ChannelError;
use super::traits::ChannelAdapter;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Inner state of the mock channel, shared between clones.
#[derive(Debug, Default)]
struct MockChannelState {
    /// Chunks to be returned by read operations, one chunk per read.
    read_queue: VecDeque<Vec<u8>>,
    /// Log of all writes, one entry per successful write call.
    write_log: Vec<Vec<u8>>,
    /// Number of upcoming reads that should time out.
    pending_timeouts: usize,
    /// Whether writes fail with a broken pipe.
    fail_writes: bool,
    /// Whether reads report end of stream once the queue is drained.
    closed: bool,
    /// Configured timeout duration.
    timeout: Duration,
}

/// Mock channel for testing.
///
/// - Enqueue chunks to be returned by read operations
/// - Inspect what was written, write by write
/// - Inject read timeouts and write failures
///
/// Clones share state, so a clone handed to one loop observes what another
/// loop wrote. An empty read queue reports `WouldBlock`, which the bridge
/// loops treat as fatal; that is how tests bring a loop to an end.
///
/// # Example
/// ```
/// use mcumgr_serial_bridge::channel::{ChannelAdapter, MockChannel};
///
/// let mut port = MockChannel::new("MOCK0");
/// port.enqueue_read(b"Hello");
/// port.enqueue_read(b", World!");
///
/// let mut buffer = [0u8; 64];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
#[derive(Clone)]
pub struct MockChannel {
    name: String,
    state: Arc<Mutex<MockChannelState>>,
}

impl MockChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockChannelState {
                timeout: Duration::from_secs(1),
                ..Default::default()
            })),
        }
    }

    /// Enqueue one chunk to be returned by a subsequent read.
    ///
    /// Empty chunks are ignored.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.state.lock().read_queue.push_back(data.to_vec());
    }

    /// Get a copy of all data written to the channel.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// All written bytes, concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().write_log.concat()
    }

    pub fn clear_write_log(&mut self) {
        self.state.lock().write_log.clear();
    }

    /// Make the next `count` reads time out before any queued data is served.
    pub fn enqueue_timeouts(&mut self, count: usize) {
        self.state.lock().pending_timeouts += count;
    }

    /// Make every write fail with a broken pipe until turned off again.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Report end of stream (a zero-byte read) once the queue is drained.
    pub fn close(&mut self) {
        self.state.lock().closed = true;
    }

    /// Number of chunks still waiting to be read.
    pub fn pending_reads(&self) -> usize {
        self.state.lock().read_queue.len()
    }
}

impl ChannelAdapter for MockChannel {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, ChannelError> {
        let mut state = self.state.lock();

        if state.fail_writes {
            return Err(ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ChannelError> {
        let mut state = self.state.lock();

        if state.pending_timeouts > 0 {
            state.pending_timeouts -= 1;
            return Err(ChannelError::timeout(state.timeout));
        }

        let Some(mut chunk) = state.read_queue.pop_front() else {
            if state.closed {
                return Ok(0);
            }
            return Err(ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )));
        };

        let n = chunk.len().min(buffer.len());
        buffer[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            // Serve the remainder on the next read.
            state.read_queue.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn try_clone_box(&self) -> Result<Box<dyn ChannelAdapter>, ChannelError> {
        Ok(Box::new(self.clone()))
    }
}

impl std::fmt::Debug for MockChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChannel")
            .field("name", &self.name)
            .field("pending_reads", &self.pending_reads())
            .finish()
    }
}
