//! Data dump layout.
//!
//! The meter answers [`CMD_REQUEST_DATA`] with a fixed 130-byte record. All
//! multi-byte fields are big-endian:
//!
//! ```text
//! offset  width  field
//!      0    u16  model code
//!      2    u16  voltage
//!      4    u16  intensity
//!      6    u32  power
//!     10    u16  temperature (C)
//!     12    u16  temperature (F)
//!     14    u16  selected data group
//!     16  10x8   data groups: capacity u32, energy u32
//!     96    u16  USB D+
//!     98    u16  USB D-
//!    100    u16  charging mode
//!    102    u32  record capacity threshold
//!    106    u32  record energy threshold
//!    110    u16  record intensity threshold
//!    112    u32  record duration (s)
//!    116    u16  record enabled
//!    118    u16  screen timeout (min)
//!    120    u16  screen brightness
//!    122    u32  resistance
//!    126    u16  screen index
//!    128     u8  reserved
//!    129     u8  checksum
//! ```

use bytes::{Buf, BufMut};

use crate::constants::*;
use crate::error::ProtocolError;

/// Raw capacity/energy registers of one data group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawDataGroup {
    /// Capacity (mAh).
    pub capacity: u32,
    /// Energy (mWh).
    pub energy: u32,
}

/// A data dump as stored on the wire, before any unit conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub model_code: u16,
    pub voltage: u16,
    pub intensity: u16,
    pub power: u32,
    pub temperature_celsius: u16,
    pub temperature_fahrenheit: u16,
    pub data_group_selected: u16,
    pub data_groups: [RawDataGroup; DATA_GROUP_COUNT],
    pub usb_voltage_dp: u16,
    pub usb_voltage_dn: u16,
    pub charging_mode: u16,
    pub record_capacity_threshold: u32,
    pub record_energy_threshold: u32,
    pub record_intensity_threshold: u16,
    pub record_duration: u32,
    pub record_enabled: u16,
    pub screen_timeout: u16,
    pub screen_brightness: u16,
    pub resistance: u32,
    pub screen_index: u16,
    pub reserved: u8,
    pub checksum: u8,
}

impl RawFrame {
    /// Decode a data dump. The slice must be exactly [`FRAME_SIZE`] bytes.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: FRAME_SIZE,
                actual: frame.len(),
            });
        }
        if frame.len() > FRAME_SIZE {
            return Err(ProtocolError::FrameTooLong {
                max: FRAME_SIZE,
                actual: frame.len(),
            });
        }

        let mut buf = frame;
        let model_code = buf.get_u16();
        let voltage = buf.get_u16();
        let intensity = buf.get_u16();
        let power = buf.get_u32();
        let temperature_celsius = buf.get_u16();
        let temperature_fahrenheit = buf.get_u16();
        let data_group_selected = buf.get_u16();

        let mut data_groups = [RawDataGroup::default(); DATA_GROUP_COUNT];
        for group in data_groups.iter_mut() {
            group.capacity = buf.get_u32();
            group.energy = buf.get_u32();
        }

        let raw = RawFrame {
            model_code,
            voltage,
            intensity,
            power,
            temperature_celsius,
            temperature_fahrenheit,
            data_group_selected,
            data_groups,
            usb_voltage_dp: buf.get_u16(),
            usb_voltage_dn: buf.get_u16(),
            charging_mode: buf.get_u16(),
            record_capacity_threshold: buf.get_u32(),
            record_energy_threshold: buf.get_u32(),
            record_intensity_threshold: buf.get_u16(),
            record_duration: buf.get_u32(),
            record_enabled: buf.get_u16(),
            screen_timeout: buf.get_u16(),
            screen_brightness: buf.get_u16(),
            resistance: buf.get_u32(),
            screen_index: buf.get_u16(),
            reserved: buf.get_u8(),
            checksum: buf.get_u8(),
        };
        debug_assert!(!buf.has_remaining());

        log::trace!("decoded raw frame: {:?}", raw);
        Ok(raw)
    }

    /// Encode back to the 130-byte wire layout.
    ///
    /// Handy for simulating a meter; the checksum is written as-is.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_SIZE);
        buf.put_u16(self.model_code);
        buf.put_u16(self.voltage);
        buf.put_u16(self.intensity);
        buf.put_u32(self.power);
        buf.put_u16(self.temperature_celsius);
        buf.put_u16(self.temperature_fahrenheit);
        buf.put_u16(self.data_group_selected);
        for group in &self.data_groups {
            buf.put_u32(group.capacity);
            buf.put_u32(group.energy);
        }
        buf.put_u16(self.usb_voltage_dp);
        buf.put_u16(self.usb_voltage_dn);
        buf.put_u16(self.charging_mode);
        buf.put_u32(self.record_capacity_threshold);
        buf.put_u32(self.record_energy_threshold);
        buf.put_u16(self.record_intensity_threshold);
        buf.put_u32(self.record_duration);
        buf.put_u16(self.record_enabled);
        buf.put_u16(self.screen_timeout);
        buf.put_u16(self.screen_brightness);
        buf.put_u32(self.resistance);
        buf.put_u16(self.screen_index);
        buf.put_u8(self.reserved);
        buf.put_u8(self.checksum);
        buf
    }
}
