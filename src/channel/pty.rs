//! Pseudo-terminal channel serving as the virtual endpoint.
//!
//! The bridge owns the master side. The subordinate side's path is advertised
//! to the operator so an mcumgr client can open it like a serial device.
//!
//! One subordinate descriptor is kept open for the lifetime of the channel.
//! Without it, Linux reports `EIO` on the master whenever no client is
//! attached, which would end the outbound forwarder as soon as a client
//! disconnects.

use super::error::ChannelError;
use super::traits::ChannelAdapter;
use std::ffi::CStr;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, FromRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Master side of a pseudo-terminal pair.
pub struct PtyChannel {
    master: File,
    subordinate_path: PathBuf,
    /// Held open so the master never sees a hang-up; shared between clones.
    _subordinate: Arc<File>,
    name: String,
    timeout: Duration,
}

impl PtyChannel {
    /// Allocate a pseudo-terminal pair and put the subordinate side in raw mode.
    ///
    /// Reads and writes on the master wait at most `timeout` before failing
    /// with [`ChannelError::Timeout`].
    pub fn open(timeout: Duration) -> Result<Self, ChannelError> {
        // SAFETY: posix_openpt has no pointer arguments; a negative return is
        // checked before the descriptor is used.
        let fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
        if fd < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        // SAFETY: `fd` was just returned by posix_openpt and is owned by nobody else.
        let master = unsafe { File::from_raw_fd(fd) };

        // SAFETY: `fd` is a valid master pseudo-terminal descriptor.
        if unsafe { libc::grantpt(fd) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        // SAFETY: as above.
        if unsafe { libc::unlockpt(fd) } != 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        let subordinate_path = subordinate_name(fd)?;
        let subordinate = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&subordinate_path)?;
        make_raw(&subordinate)?;

        Ok(Self {
            master,
            name: subordinate_path.display().to_string(),
            subordinate_path,
            _subordinate: Arc::new(subordinate),
            timeout,
        })
    }

    /// Path the management client should open.
    pub fn subordinate_path(&self) -> &Path {
        &self.subordinate_path
    }

    /// Wait until the master is ready for `events`, or time out.
    fn wait_for(&self, events: libc::c_short) -> Result<(), ChannelError> {
        let mut pfd = libc::pollfd {
            fd: self.master.as_raw_fd(),
            events,
            revents: 0,
        };
        let millis = self.timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

        loop {
            // SAFETY: `pfd` is a single valid pollfd and nfds is 1.
            let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
            if rc < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err.into());
            }
            if rc == 0 {
                return Err(ChannelError::timeout(self.timeout));
            }
            // Readiness, hang-up and errors all surface through the next read/write.
            return Ok(());
        }
    }
}

#[cfg(target_os = "linux")]
fn subordinate_name(fd: libc::c_int) -> Result<PathBuf, ChannelError> {
    let mut buf = [0 as libc::c_char; 128];
    // SAFETY: `buf` is writable for `buf.len()` bytes; ptsname_r NUL-terminates on success.
    let rc = unsafe { libc::ptsname_r(fd, buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return Err(std::io::Error::from_raw_os_error(rc).into());
    }
    // SAFETY: ptsname_r succeeded, so `buf` holds a NUL-terminated string.
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Ok(PathBuf::from(name.to_string_lossy().into_owned()))
}

#[cfg(not(target_os = "linux"))]
fn subordinate_name(fd: libc::c_int) -> Result<PathBuf, ChannelError> {
    // SAFETY: `fd` is a valid, unlocked master descriptor.
    let ptr = unsafe { libc::ptsname(fd) };
    if ptr.is_null() {
        return Err(std::io::Error::last_os_error().into());
    }
    // SAFETY: a non-null ptsname result points at a NUL-terminated static buffer,
    // copied out before any other ptsname call.
    let name = unsafe { CStr::from_ptr(ptr) };
    Ok(PathBuf::from(name.to_string_lossy().into_owned()))
}

/// Disable echo, line editing and byte translation on the subordinate side.
fn make_raw(file: &File) -> Result<(), ChannelError> {
    let fd = file.as_raw_fd();
    // SAFETY: termios is plain data; tcgetattr fully initialises it on success.
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `fd` is an open terminal and `termios` is a valid out-pointer.
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    // SAFETY: `termios` was initialised by tcgetattr.
    unsafe { libc::cfmakeraw(&mut termios) };
    // SAFETY: `fd` is an open terminal and `termios` is a valid settings struct.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

impl ChannelAdapter for PtyChannel {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, ChannelError> {
        self.wait_for(libc::POLLOUT)?;
        Ok(self.master.write(data)?)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, ChannelError> {
        self.wait_for(libc::POLLIN)?;
        Ok(self.master.read(buffer)?)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        self.timeout = timeout;
        Ok(())
    }

    fn try_clone_box(&self) -> Result<Box<dyn ChannelAdapter>, ChannelError> {
        Ok(Box::new(Self {
            master: self.master.try_clone()?,
            subordinate_path: self.subordinate_path.clone(),
            _subordinate: Arc::clone(&self._subordinate),
            name: self.name.clone(),
            timeout: self.timeout,
        }))
    }
}

impl std::fmt::Debug for PtyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyChannel")
            .field("subordinate_path", &self.subordinate_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_or_skip() -> Option<PtyChannel> {
        match PtyChannel::open(Duration::from_millis(200)) {
            Ok(pty) => Some(pty),
            Err(e) => {
                eprintln!("skipping: no pseudo-terminal support here ({e})");
                None
            }
        }
    }

    #[test]
    fn test_open_advertises_subordinate_path() {
        let Some(pty) = open_or_skip() else { return };
        assert!(pty.subordinate_path().exists());
        assert_eq!(pty.name(), pty.subordinate_path().display().to_string());
    }

    #[test]
    fn test_bytes_cross_in_both_directions_unmodified() {
        let Some(mut pty) = open_or_skip() else { return };
        let mut client = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(pty.subordinate_path())
            .unwrap();

        // Raw mode: no CR/LF translation, no echo.
        client.write_all(b"\x06\x09req\n").unwrap();
        let mut buffer = [0u8; 64];
        let mut got = Vec::new();
        while got.len() < 6 {
            let n = pty.read_bytes(&mut buffer).unwrap();
            got.extend_from_slice(&buffer[..n]);
        }
        assert_eq!(got, b"\x06\x09req\n");

        pty.write_all_bytes(b"\x06\x09rsp\n").unwrap();
        let mut got = vec![0u8; 6];
        client.read_exact(&mut got).unwrap();
        assert_eq!(got, b"\x06\x09rsp\n");
    }

    #[test]
    fn test_idle_read_times_out() {
        let Some(mut pty) = open_or_skip() else { return };
        pty.set_timeout(Duration::from_millis(20)).unwrap();
        let mut buffer = [0u8; 8];
        assert!(matches!(
            pty.read_bytes(&mut buffer),
            Err(ChannelError::Timeout(_))
        ));
    }
}
