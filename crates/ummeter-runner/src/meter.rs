//! Meter protocol engine.
//!
//! [`Meter`] drives one [`MeterInterface`]: it requests data dumps, decodes
//! them into [`Reading`]s and sends the single-byte control commands. It
//! keeps no state between calls besides the interface itself.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace};
use ummeter_interface::{InterfaceError, MeterInterface};
use ummeter_protocol::{Command, CommandError, ProtocolError, Reading, FRAME_SIZE};

use crate::telemetry::metric_defs;

/// Errors raised by the engine.
#[derive(Debug, Error)]
pub enum MeterError {
    /// The byte channel failed.
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    /// A command parameter was rejected before sending.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// A full-length data dump could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result type alias for engine operations.
pub type MeterResult<T> = Result<T, MeterError>;

/// A UM24C/UM25C/UM34C meter behind some interface.
#[derive(Debug)]
pub struct Meter<I: MeterInterface> {
    interface: I,
}

impl<I: MeterInterface> Meter<I> {
    /// Wrap an interface. Nothing is opened.
    pub fn new(interface: I) -> Self {
        Meter { interface }
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    /// Give back the interface.
    pub fn into_inner(self) -> I {
        self.interface
    }

    pub fn is_open(&self) -> bool {
        self.interface.is_open()
    }

    /// Open the interface. Does nothing if it is already open.
    pub fn open(&mut self) -> MeterResult<()> {
        self.interface.open()?;
        Ok(())
    }

    /// Close the interface. Does nothing if it is already closed.
    pub fn close(&mut self) {
        self.interface.close();
    }

    /// Open the interface and return a guard closing it on drop.
    ///
    /// ```rust,ignore
    /// let mut session = meter.session()?;
    /// let reading = session.poll()?;
    /// // interface closed here, also on early return or panic
    /// ```
    pub fn session(&mut self) -> MeterResult<MeterSession<'_, I>> {
        self.open()?;
        Ok(MeterSession { meter: self })
    }

    /// Set the receive timeout.
    ///
    /// Only applied when the interface is open; ignored otherwise.
    pub fn set_timeout(&mut self, timeout: Duration) -> MeterResult<()> {
        if self.interface.is_open() {
            self.interface.set_timeout(timeout)?;
        } else {
            trace!("ignoring timeout {:?} on closed interface", timeout);
        }
        Ok(())
    }

    /// Request one data dump.
    ///
    /// Returns `Ok(None)` when fewer than [`FRAME_SIZE`] bytes arrived
    /// before the timeout.
    pub fn poll(&mut self) -> MeterResult<Option<Reading>> {
        metrics::counter!(metric_defs::POLLS.name).increment(1);
        self.transmit(Command::RequestData)?;

        let frame = self.interface.receive(FRAME_SIZE)?;
        if frame.len() < FRAME_SIZE {
            metrics::counter!(metric_defs::POLLS_INCOMPLETE.name).increment(1);
            debug!("incomplete data dump: {} of {} bytes", frame.len(), FRAME_SIZE);
            return Ok(None);
        }

        let reading = Reading::decode(&frame)?;
        metrics::gauge!(metric_defs::VOLTAGE.name).set(reading.voltage);
        metrics::gauge!(metric_defs::INTENSITY.name).set(reading.intensity);
        metrics::gauge!(metric_defs::POWER.name).set(reading.power);
        Ok(Some(reading))
    }

    /// Validate and send a control command. Nothing is sent if a parameter
    /// is out of range.
    pub fn send_command(&mut self, command: Command) -> MeterResult<()> {
        self.transmit(command)?;
        if command != Command::RequestData {
            metrics::counter!(metric_defs::COMMANDS_SENT.name).increment(1);
        }
        Ok(())
    }

    fn transmit(&mut self, command: Command) -> MeterResult<()> {
        let byte = command.encode()?;
        debug!("sending {} (0x{:02X})", command.name(), byte);
        self.interface.send(&[byte])?;
        Ok(())
    }

    pub fn screen_next(&mut self) -> MeterResult<()> {
        self.send_command(Command::ScreenNext)
    }

    /// UM25C/UM34C only.
    pub fn screen_previous(&mut self) -> MeterResult<()> {
        self.send_command(Command::ScreenPrevious)
    }

    pub fn screen_rotate(&mut self) -> MeterResult<()> {
        self.send_command(Command::ScreenRotate)
    }

    /// Minutes before the screen turns off, 0 to 9.
    pub fn screen_timeout(&mut self, minutes: i32) -> MeterResult<()> {
        self.send_command(Command::ScreenTimeout { minutes })
    }

    /// Brightness, 0 to 5.
    pub fn screen_brightness(&mut self, level: i32) -> MeterResult<()> {
        self.send_command(Command::ScreenBrightness { level })
    }

    /// Current above which recording runs, 0 to 300 mA in 10 mA steps.
    pub fn record_threshold(&mut self, milliamps: i32) -> MeterResult<()> {
        self.send_command(Command::RecordThreshold { milliamps })
    }

    /// UM25C/UM34C only.
    pub fn data_group_select(&mut self, group: i32) -> MeterResult<()> {
        self.send_command(Command::SelectDataGroup { group })
    }

    /// UM24C only. Same wire byte as [`screen_previous`](Self::screen_previous).
    pub fn data_group_next(&mut self) -> MeterResult<()> {
        self.send_command(Command::NextDataGroup)
    }

    pub fn data_group_clear(&mut self) -> MeterResult<()> {
        self.send_command(Command::ClearDataGroup)
    }
}

impl<I: MeterInterface + fmt::Display> fmt::Display for Meter<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<UM-Meter: com={}>", self.interface)
    }
}

/// An open meter, closed again when dropped.
pub struct MeterSession<'a, I: MeterInterface> {
    meter: &'a mut Meter<I>,
}

impl<I: MeterInterface> Deref for MeterSession<'_, I> {
    type Target = Meter<I>;

    fn deref(&self) -> &Self::Target {
        self.meter
    }
}

impl<I: MeterInterface> DerefMut for MeterSession<'_, I> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.meter
    }
}

impl<I: MeterInterface> Drop for MeterSession<'_, I> {
    fn drop(&mut self) {
        self.meter.close();
    }
}
