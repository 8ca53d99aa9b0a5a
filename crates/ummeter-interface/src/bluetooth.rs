//! Bluetooth RFCOMM interface (Linux / BlueZ).
//!
//! Talks to the meter's serial port profile through a raw
//! `AF_BLUETOOTH` stream socket, without binding an `/dev/rfcomm*` node.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::str::FromStr;
use std::time::Duration;

use crate::{read_up_to, InterfaceError, InterfaceResult, MeterInterface, TimedRead, DEFAULT_TIMEOUT};

const KIND: &str = "BT";

/// RFCOMM channel the meters listen on.
pub const RFCOMM_CHANNEL: u8 = 1;

const BTPROTO_RFCOMM: libc::c_int = 3;

/// Shortest receive timeout handed to the kernel. `SO_RCVTIMEO` treats
/// zero as "block forever".
const MIN_RECEIVE_TIMEOUT: Duration = Duration::from_micros(1);

/// `struct sockaddr_rc` from `<bluetooth/rfcomm.h>`.
#[repr(C)]
struct SockaddrRc {
    rc_family: libc::sa_family_t,
    rc_bdaddr: [u8; 6],
    rc_channel: u8,
}

/// A Bluetooth device address, most significant byte first as written
/// (`11:22:33:44:55:66`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// Byte order used by the kernel (`bdaddr_t` is little-endian).
    fn to_kernel_bytes(self) -> [u8; 6] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl FromStr for BdAddr {
    type Err = InterfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InterfaceError::InvalidAddress(s.to_string());
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(BdAddr(bytes))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Meter connected over Bluetooth RFCOMM.
#[derive(Debug)]
pub struct BluetoothInterface {
    address: BdAddr,
    channel: u8,
    timeout: Duration,
    socket: Option<File>,
}

impl BluetoothInterface {
    /// Create an interface for the device at `address` (`XX:XX:XX:XX:XX:XX`).
    /// Nothing is connected until [`MeterInterface::open`].
    pub fn new(address: &str) -> InterfaceResult<Self> {
        Ok(BluetoothInterface {
            address: address.parse()?,
            channel: RFCOMM_CHANNEL,
            timeout: DEFAULT_TIMEOUT,
            socket: None,
        })
    }

    /// Device address.
    pub fn address(&self) -> BdAddr {
        self.address
    }

    fn socket_mut(&mut self) -> InterfaceResult<&mut File> {
        self.socket
            .as_mut()
            .ok_or(InterfaceError::NotOpen { kind: KIND })
    }
}

impl fmt::Display for BluetoothInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<BT: path={} open={}>", self.address, self.is_open())
    }
}

impl MeterInterface for BluetoothInterface {
    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn open(&mut self) -> InterfaceResult<()> {
        if self.is_open() {
            return Ok(());
        }
        let fd = connect_rfcomm(self.address, self.channel).map_err(|source| {
            InterfaceError::Open {
                kind: KIND,
                target: self.address.to_string(),
                source,
            }
        })?;
        log::debug!("connected to {} channel {}", self.address, self.channel);
        let socket = File::from(fd);
        set_receive_timeout(&socket, self.timeout).map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            log::debug!("disconnected from {}", self.address);
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> InterfaceResult<()> {
        let socket = self.socket_mut()?;
        set_receive_timeout(socket, timeout)
            .map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        self.timeout = timeout;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> InterfaceResult<usize> {
        let socket = self.socket_mut()?;
        socket
            .write_all(data)
            .map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        log::trace!("bt tx {:02X?}", data);
        Ok(data.len())
    }

    fn receive(&mut self, len: usize) -> InterfaceResult<Vec<u8>> {
        let timeout = self.timeout;
        let socket = self.socket_mut()?;
        let data = read_up_to(socket, len, timeout)
            .map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        log::trace!("bt rx {} of {} bytes", data.len(), len);
        Ok(data)
    }
}

fn connect_rfcomm(address: BdAddr, channel: u8) -> io::Result<OwnedFd> {
    // SAFETY: plain socket(2) call, the descriptor is checked before use.
    let raw = unsafe {
        libc::socket(
            libc::AF_BLUETOOTH,
            libc::SOCK_STREAM | libc::SOCK_CLOEXEC,
            BTPROTO_RFCOMM,
        )
    };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `raw` is a fresh descriptor nobody else owns.
    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let addr = SockaddrRc {
        rc_family: libc::AF_BLUETOOTH as libc::sa_family_t,
        rc_bdaddr: address.to_kernel_bytes(),
        rc_channel: channel,
    };
    // SAFETY: `addr` is a valid sockaddr_rc that outlives the call.
    let ret = unsafe {
        libc::connect(
            fd.as_raw_fd(),
            &addr as *const SockaddrRc as *const libc::sockaddr,
            std::mem::size_of::<SockaddrRc>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

impl TimedRead for File {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        set_receive_timeout(self, timeout)
    }
}

fn set_receive_timeout(socket: &File, timeout: Duration) -> io::Result<()> {
    let timeout = timeout.max(MIN_RECEIVE_TIMEOUT);
    let tv = libc::timeval {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    };
    // SAFETY: `tv` is a valid timeval for the duration of the call.
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_RCVTIMEO,
            &tv as *const libc::timeval as *const libc::c_void,
            std::mem::size_of::<libc::timeval>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
