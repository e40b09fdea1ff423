//! Channel abstraction for the two sides of the bridge.
//!
//! The serial device and the virtual endpoint expose the same blocking
//! read/write contract through [`ChannelAdapter`], so the bridge loops can be
//! driven by [`MockChannel`] in tests.

pub mod error;
pub mod mock;
#[cfg(unix)]
pub mod pty;
pub mod serial;
pub mod traits;

pub use error::ChannelError;
pub use mock::MockChannel;
#[cfg(unix)]
pub use pty::PtyChannel;
pub use serial::SerialChannel;
pub use traits::*;
