//! UM-series meter interfaces
//!
//! The meters expose a plain byte channel: a USB/UART serial line, or the
//! Bluetooth serial profile (RFCOMM) on the UM25C/UM34C. This crate wraps
//! both behind the [`MeterInterface`] trait so the protocol engine does not
//! care which one it talks to.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use ummeter_interface::{MeterInterface, TtyInterface};
//!
//! let mut tty = TtyInterface::new("/dev/rfcomm0")?;
//! tty.open()?;
//! tty.set_timeout(Duration::from_secs(1))?;
//! tty.send(&[0xF0])?;
//! let dump = tty.receive(130)?;
//! ```

#[cfg(target_os = "linux")]
mod bluetooth;
mod error;
mod serial;

#[cfg(target_os = "linux")]
pub use bluetooth::*;
pub use error::*;
pub use serial::*;

use std::io::{self, Read};
use std::time::{Duration, Instant};

/// Receive timeout used until [`MeterInterface::set_timeout`] is called.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// A byte channel to a meter.
///
/// Implementations open lazily: constructing one never touches the device.
pub trait MeterInterface {
    /// Whether the channel is currently open.
    fn is_open(&self) -> bool;

    /// Establish the channel. Does nothing if already open.
    fn open(&mut self) -> InterfaceResult<()>;

    /// Release the channel. Does nothing if already closed.
    fn close(&mut self);

    /// How long a subsequent [`receive`](Self::receive) may block.
    fn set_timeout(&mut self, timeout: Duration) -> InterfaceResult<()>;

    /// Write raw bytes, returning how many were written.
    fn send(&mut self, data: &[u8]) -> InterfaceResult<usize>;

    /// Read up to `len` bytes.
    ///
    /// Blocks until `len` bytes arrived or the timeout elapsed, and returns
    /// whatever was read. The timeout bounds the whole call, not each
    /// underlying read. A timeout yields a short (possibly empty) buffer,
    /// not an error. A zero timeout only collects bytes already buffered.
    fn receive(&mut self, len: usize) -> InterfaceResult<Vec<u8>>;
}

impl<T: MeterInterface + ?Sized> MeterInterface for Box<T> {
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn open(&mut self) -> InterfaceResult<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn set_timeout(&mut self, timeout: Duration) -> InterfaceResult<()> {
        (**self).set_timeout(timeout)
    }

    fn send(&mut self, data: &[u8]) -> InterfaceResult<usize> {
        (**self).send(data)
    }

    fn receive(&mut self, len: usize) -> InterfaceResult<Vec<u8>> {
        (**self).receive(len)
    }
}

/// A byte source whose blocking reads can be bounded.
pub(crate) trait TimedRead: Read {
    /// Limit how long the next `read` may block. Zero means do not wait.
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// Fill a buffer of `len` bytes from `reader` within `timeout`, stopping
/// early when the deadline passes or the stream ends.
pub(crate) fn read_up_to<R: TimedRead + ?Sized>(
    reader: &mut R,
    len: usize,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() && filled > 0 {
            break;
        }
        reader.set_read_timeout(remaining)?;
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                break
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}
