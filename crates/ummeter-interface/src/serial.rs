//! Serial line interface.
//!
//! Covers the USB serial adapter as well as an RFCOMM device node bound
//! with `rfcomm bind` (e.g. `/dev/rfcomm0`).

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{read_up_to, InterfaceError, InterfaceResult, MeterInterface, TimedRead, DEFAULT_TIMEOUT};

const KIND: &str = "TTY";

/// Default line speed of the UM-series meters.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Configuration for the serial line. The meters always use 8N1.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Initial receive timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Meter connected through a serial port.
pub struct TtyInterface {
    path: String,
    config: SerialConfig,
    port: Option<Box<dyn SerialPort>>,
}

impl TtyInterface {
    /// Create an interface for `path` with the default configuration.
    /// The port is not opened until [`MeterInterface::open`].
    pub fn new(path: impl Into<String>) -> InterfaceResult<Self> {
        Self::with_config(path, SerialConfig::default())
    }

    /// Create an interface with a custom configuration.
    pub fn with_config(path: impl Into<String>, config: SerialConfig) -> InterfaceResult<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(InterfaceError::InvalidPath(path));
        }
        Ok(TtyInterface {
            path,
            config,
            port: None,
        })
    }

    /// Device path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Active configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn port_mut(&mut self) -> InterfaceResult<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or(InterfaceError::NotOpen { kind: KIND })
    }
}

impl fmt::Display for TtyInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TTY: path={} open={}>", self.path, self.is_open())
    }
}

impl fmt::Debug for TtyInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtyInterface")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

impl MeterInterface for TtyInterface {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn open(&mut self) -> InterfaceResult<()> {
        if self.is_open() {
            return Ok(());
        }
        let port = serialport::new(&self.path, self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.timeout)
            .open()
            .map_err(|e| InterfaceError::Open {
                kind: KIND,
                target: self.path.clone(),
                source: e.into(),
            })?;
        log::debug!("opened {} at {} baud", self.path, self.config.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            log::debug!("closed {}", self.path);
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> InterfaceResult<()> {
        self.port_mut()?
            .set_timeout(timeout)
            .map_err(|e| InterfaceError::Io {
                kind: KIND,
                source: e.into(),
            })?;
        self.config.timeout = timeout;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> InterfaceResult<usize> {
        let port = self.port_mut()?;
        port.write_all(data)
            .and_then(|_| port.flush())
            .map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        log::trace!("tty tx {:02X?}", data);
        Ok(data.len())
    }

    fn receive(&mut self, len: usize) -> InterfaceResult<Vec<u8>> {
        let timeout = self.config.timeout;
        let port = self.port_mut()?;
        let data = read_up_to(port, len, timeout)
            .map_err(|source| InterfaceError::Io { kind: KIND, source })?;
        log::trace!("tty rx {} of {} bytes", data.len(), len);
        Ok(data)
    }
}

impl TimedRead for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        SerialPort::set_timeout(self.as_mut(), timeout).map_err(io::Error::from)
    }
}
