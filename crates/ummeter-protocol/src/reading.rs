//! Unit-converted readings.

use std::time::Duration;

use crate::constants::*;
use crate::error::ProtocolError;
use crate::frame::RawFrame;
use crate::types::*;

/// One decoded data dump with values in physical units.
///
/// Quantities that depend on the model's scaling are `0.0` when the model
/// is [`Model::Unknown`]; raw integer fields are kept regardless of model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub model: Model,
    /// Bus voltage (V).
    pub voltage: f64,
    /// Current (A).
    pub intensity: f64,
    /// Power (W).
    pub power: f64,
    /// Load resistance (Ohm).
    pub resistance: f64,
    /// USB D+ line voltage (V).
    pub usb_voltage_dp: f64,
    /// USB D- line voltage (V).
    pub usb_voltage_dn: f64,
    pub charging_mode: ChargingMode,
    pub temperature_celsius: u16,
    pub temperature_fahrenheit: u16,
    /// Index into `data_group` of the group currently shown.
    pub data_group_selected: u16,
    pub data_group: [DataGroup; DATA_GROUP_COUNT],
    /// Capacity threshold of the recording (Ah).
    pub record_capacity_threshold: f64,
    /// Energy threshold of the recording (Wh).
    pub record_energy_threshold: f64,
    /// Current above which recording runs (A).
    pub record_intensity_threshold: f64,
    #[cfg_attr(feature = "serde", serde(serialize_with = "as_secs"))]
    pub record_duration: Duration,
    pub record_enabled: bool,
    pub screen_index: u16,
    #[cfg_attr(feature = "serde", serde(serialize_with = "as_minutes"))]
    pub screen_timeout: Duration,
    /// 0 (dim) to 5 (full).
    pub screen_brightness: u16,
    /// Trailing byte of the frame, not validated.
    pub checksum: u8,
}

impl Reading {
    /// Decode and convert a 130-byte data dump.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        RawFrame::decode(frame).map(|raw| Reading::from_raw(&raw))
    }

    /// Apply the model's unit conversions to a raw frame.
    pub fn from_raw(raw: &RawFrame) -> Self {
        let model = Model::from_code(raw.model_code);
        let scale = model.scale();
        if scale.is_none() {
            log::debug!("unknown model code 0x{:04X}", raw.model_code);
        }

        let mut data_group = [DataGroup::default(); DATA_GROUP_COUNT];
        for (group, raw_group) in data_group.iter_mut().zip(raw.data_groups.iter()) {
            group.capacity = scaled(scale, raw_group.capacity, |s| s.group_capacity);
            group.energy = scaled(scale, raw_group.energy, |s| s.group_energy);
        }

        Reading {
            model,
            voltage: scaled(scale, raw.voltage.into(), |s| s.voltage),
            intensity: scaled(scale, raw.intensity.into(), |s| s.intensity),
            power: scaled(scale, raw.power, |s| s.power),
            resistance: scaled(scale, raw.resistance, |s| s.resistance),
            usb_voltage_dp: scaled(scale, raw.usb_voltage_dp.into(), |s| s.usb_voltage),
            usb_voltage_dn: scaled(scale, raw.usb_voltage_dn.into(), |s| s.usb_voltage),
            charging_mode: ChargingMode::from(raw.charging_mode),
            temperature_celsius: raw.temperature_celsius,
            temperature_fahrenheit: raw.temperature_fahrenheit,
            data_group_selected: raw.data_group_selected,
            data_group,
            record_capacity_threshold: scaled(scale, raw.record_capacity_threshold, |s| {
                s.record_capacity
            }),
            record_energy_threshold: scaled(scale, raw.record_energy_threshold, |s| {
                s.record_energy
            }),
            record_intensity_threshold: scaled(scale, raw.record_intensity_threshold.into(), |s| {
                s.record_intensity
            }),
            record_duration: Duration::from_secs(raw.record_duration.into()),
            record_enabled: raw.record_enabled == 1,
            screen_index: raw.screen_index,
            screen_timeout: Duration::from_secs(u64::from(raw.screen_timeout) * 60),
            screen_brightness: raw.screen_brightness,
            checksum: raw.checksum,
        }
    }

    /// The data group currently selected on the meter.
    ///
    /// `None` if the meter reported an index outside `0..10`.
    pub fn selected_data_group(&self) -> Option<&DataGroup> {
        self.data_group.get(usize::from(self.data_group_selected))
    }
}

fn scaled(scale: Option<&Scale>, raw: u32, divisor: impl Fn(&Scale) -> f64) -> f64 {
    match scale {
        Some(scale) => f64::from(raw) / divisor(scale),
        None => 0.0,
    }
}

#[cfg(feature = "serde")]
fn as_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

#[cfg(feature = "serde")]
fn as_minutes<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs() / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::fixtures::*;

    fn empty_groups_after_first(reading: &Reading) -> bool {
        reading.data_group[1..]
            .iter()
            .all(|g| *g == DataGroup { capacity: 0.0, energy: 0.0 })
    }

    #[test]
    fn test_decode_um25c() {
        let reading = Reading::decode(&UM25C_FRAME).expect("should decode");

        assert_eq!(reading.model, Model::Um25c);
        assert_eq!(reading.voltage, 0.51);
        assert_eq!(reading.intensity, 0.0328);
        assert_eq!(reading.power, 1.672);
        assert_eq!(reading.resistance, 9999.9);
        assert_eq!(reading.usb_voltage_dp, 0.01);
        assert_eq!(reading.usb_voltage_dn, 0.02);
        assert_eq!(reading.charging_mode.tag(), "DCP1.5A");
        assert_eq!(
            reading.charging_mode.description(),
            "Dedicated Charging Port (max. 1.5 A)"
        );
        assert_eq!(reading.temperature_celsius, 20);
        assert_eq!(reading.temperature_fahrenheit, 68);
        assert_eq!(reading.data_group_selected, 8);
        assert_eq!(reading.data_group[0], DataGroup { capacity: 0.011, energy: 0.056 });
        assert!(empty_groups_after_first(&reading));
        assert_eq!(reading.record_capacity_threshold, 0.016);
        assert_eq!(reading.record_energy_threshold, 0.256);
        assert_eq!(reading.record_intensity_threshold, 0.1);
        assert_eq!(reading.record_duration, Duration::from_secs(240));
        assert!(!reading.record_enabled);
        assert_eq!(reading.screen_index, 2);
        assert_eq!(reading.screen_timeout, Duration::from_secs(120));
        assert_eq!(reading.screen_brightness, 4);
        assert_eq!(reading.checksum, 0x8c);
    }

    #[test]
    fn test_decode_um34c() {
        let reading = Reading::decode(&with_model(MODEL_CODE_UM34C)).unwrap();

        assert_eq!(reading.model, Model::Um34c);
        assert_eq!(reading.voltage, 5.1);
        assert_eq!(reading.intensity, 0.328);
        assert_eq!(reading.power, 1.672);
        assert_eq!(reading.resistance, 9999.9);
        assert_eq!(reading.data_group[0], DataGroup { capacity: 0.011, energy: 0.056 });
        assert_eq!(reading.record_intensity_threshold, 0.1);
    }

    #[test]
    fn test_decode_um24c() {
        let reading = Reading::decode(&with_model(MODEL_CODE_UM24C)).unwrap();

        assert_eq!(reading.model, Model::Um24c);
        assert_eq!(reading.voltage, 5.1);
        assert_eq!(reading.intensity, 0.328);
    }

    #[test]
    fn test_decode_unknown_model_zeroes_scaled_fields() {
        let mut frame = with_model(0xFFFF);
        // Unmapped charging mode as well.
        frame[100..102].copy_from_slice(&0x00FFu16.to_be_bytes());
        let reading = Reading::decode(&frame).unwrap();

        assert_eq!(reading.model, Model::Unknown);
        assert_eq!(reading.voltage, 0.0);
        assert_eq!(reading.intensity, 0.0);
        assert_eq!(reading.power, 0.0);
        assert_eq!(reading.resistance, 0.0);
        assert_eq!(reading.usb_voltage_dp, 0.0);
        assert_eq!(reading.usb_voltage_dn, 0.0);
        assert_eq!(reading.charging_mode.tag(), "Unknown");
        assert_eq!(reading.charging_mode.description(), "Unknown");
        assert_eq!(reading.data_group[0], DataGroup::default());
        assert_eq!(reading.record_capacity_threshold, 0.0);
        assert_eq!(reading.record_energy_threshold, 0.0);
        assert_eq!(reading.record_intensity_threshold, 0.0);

        // Model independent.
        assert_eq!(reading.temperature_celsius, 20);
        assert_eq!(reading.temperature_fahrenheit, 68);
        assert_eq!(reading.data_group_selected, 8);
        assert_eq!(reading.record_duration, Duration::from_secs(240));
        assert_eq!(reading.screen_index, 2);
        assert_eq!(reading.screen_timeout, Duration::from_secs(120));
        assert_eq!(reading.screen_brightness, 4);
        assert_eq!(reading.checksum, 0x8c);
    }

    #[test]
    fn test_record_enabled_requires_exactly_one() {
        let mut raw = RawFrame::decode(&UM25C_FRAME).unwrap();
        raw.record_enabled = 1;
        assert!(Reading::from_raw(&raw).record_enabled);
        raw.record_enabled = 2;
        assert!(!Reading::from_raw(&raw).record_enabled);
        raw.record_enabled = 0x0100;
        assert!(!Reading::from_raw(&raw).record_enabled);
    }

    #[test]
    fn test_selected_data_group() {
        let mut raw = RawFrame::decode(&UM25C_FRAME).unwrap();
        raw.data_group_selected = 0;
        let reading = Reading::from_raw(&raw);
        assert_eq!(
            reading.selected_data_group(),
            Some(&DataGroup { capacity: 0.011, energy: 0.056 })
        );

        raw.data_group_selected = 10;
        assert!(Reading::from_raw(&raw).selected_data_group().is_none());
    }

    #[test]
    fn test_decode_short_frame_is_error() {
        assert!(matches!(
            Reading::decode(&UM25C_FRAME[..64]),
            Err(ProtocolError::FrameTooShort { actual: 64, .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_reading() {
        let reading = Reading::decode(&UM25C_FRAME).unwrap();
        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["model"], "UM25C");
        assert_eq!(json["charging_mode"], "DCP1.5A");
        assert_eq!(json["record_duration"], 240);
        assert_eq!(json["screen_timeout"], 2);
        assert_eq!(json["data_group"][0]["energy"], 0.056);
    }
}
