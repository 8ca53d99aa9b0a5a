//! Common types used in the protocol.

use crate::constants::*;

/// Meter model, derived from the 16-bit code at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Model {
    /// RDTech UM24C.
    #[cfg_attr(feature = "serde", serde(rename = "UM24C"))]
    Um24c,
    /// RDTech UM25C (higher resolution voltage and current).
    #[cfg_attr(feature = "serde", serde(rename = "UM25C"))]
    Um25c,
    /// RDTech UM34C.
    #[cfg_attr(feature = "serde", serde(rename = "UM34C"))]
    Um34c,
    /// Unmapped model code.
    Unknown,
}

impl Model {
    /// Look up the model for a raw model code.
    pub fn from_code(code: u16) -> Self {
        match code {
            MODEL_CODE_UM24C => Model::Um24c,
            MODEL_CODE_UM25C => Model::Um25c,
            MODEL_CODE_UM34C => Model::Um34c,
            _ => Model::Unknown,
        }
    }

    /// Model name as printed on the device.
    pub const fn name(&self) -> &'static str {
        match self {
            Model::Um24c => "UM24C",
            Model::Um25c => "UM25C",
            Model::Um34c => "UM34C",
            Model::Unknown => "Unknown",
        }
    }

    /// Conversion divisors for this model, `None` for [`Model::Unknown`].
    pub const fn scale(&self) -> Option<&'static Scale> {
        match self {
            Model::Um25c => Some(&UM25C_SCALE),
            Model::Um24c | Model::Um34c => Some(&UM24C_SCALE),
            Model::Unknown => None,
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Divisors turning raw frame integers into physical units.
///
/// Each converted value is `raw / divisor`. Voltages are in volts, currents
/// in amps, power in watts, resistance in ohms, capacity in amp-hours and
/// energy in watt-hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    /// Bus voltage.
    pub voltage: f64,
    /// Current.
    pub intensity: f64,
    /// Power.
    pub power: f64,
    /// Load resistance.
    pub resistance: f64,
    /// USB D+ and D- line voltages.
    pub usb_voltage: f64,
    /// Recording current threshold.
    pub record_intensity: f64,
    /// Recorded capacity.
    pub record_capacity: f64,
    /// Recorded energy.
    pub record_energy: f64,
    /// Data group capacity.
    pub group_capacity: f64,
    /// Data group energy.
    pub group_energy: f64,
}

/// Divisors for the UM25C.
pub const UM25C_SCALE: Scale = Scale {
    voltage: 1000.0,
    intensity: 10000.0,
    power: 1000.0,
    resistance: 10.0,
    usb_voltage: 100.0,
    record_intensity: 100.0,
    record_capacity: 1000.0,
    record_energy: 1000.0,
    group_capacity: 1000.0,
    group_energy: 1000.0,
};

/// Divisors shared by the UM24C and UM34C.
pub const UM24C_SCALE: Scale = Scale {
    voltage: 100.0,
    intensity: 1000.0,
    ..UM25C_SCALE
};

/// Fast-charge protocol detected on the data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargingMode {
    /// No protocol detected (code 0).
    Unknown,
    /// Qualcomm Quick Charge 2.0.
    QuickCharge2,
    /// Qualcomm Quick Charge 3.0.
    QuickCharge3,
    /// Apple, 2.4 A.
    Apple2_4A,
    /// Apple, 2.1 A.
    Apple2_1A,
    /// Apple, 1.0 A.
    Apple1_0A,
    /// Apple, 0.5 A.
    Apple0_5A,
    /// Dedicated charging port, 1.5 A.
    Dcp1_5A,
    /// Samsung.
    Samsung,
    /// Code outside of the known table.
    Unrecognized(u16),
}

impl ChargingMode {
    /// Short tag, e.g. `"QC3"`.
    pub const fn tag(&self) -> &'static str {
        match self {
            ChargingMode::Unknown | ChargingMode::Unrecognized(_) => "Unknown",
            ChargingMode::QuickCharge2 => "QC2",
            ChargingMode::QuickCharge3 => "QC3",
            ChargingMode::Apple2_4A => "APP2.4A",
            ChargingMode::Apple2_1A => "APP2.1A",
            ChargingMode::Apple1_0A => "APP1.0A",
            ChargingMode::Apple0_5A => "APP0.5A",
            ChargingMode::Dcp1_5A => "DCP1.5A",
            ChargingMode::Samsung => "Samsung",
        }
    }

    /// Full description, e.g. `"Qualcomm Quick Charge 3.0"`.
    pub const fn description(&self) -> &'static str {
        match self {
            ChargingMode::Unknown | ChargingMode::Unrecognized(_) => "Unknown",
            ChargingMode::QuickCharge2 => "Qualcomm Quick Charge 2.0",
            ChargingMode::QuickCharge3 => "Qualcomm Quick Charge 3.0",
            ChargingMode::Apple2_4A => "Apple (max. 2.4 A)",
            ChargingMode::Apple2_1A => "Apple (max. 2.1 A)",
            ChargingMode::Apple1_0A => "Apple (max. 1.0 A)",
            ChargingMode::Apple0_5A => "Apple (max. 0.5 A)",
            ChargingMode::Dcp1_5A => "Dedicated Charging Port (max. 1.5 A)",
            ChargingMode::Samsung => "Samsung",
        }
    }
}

impl From<u16> for ChargingMode {
    fn from(code: u16) -> Self {
        match code {
            0 => ChargingMode::Unknown,
            1 => ChargingMode::QuickCharge2,
            2 => ChargingMode::QuickCharge3,
            3 => ChargingMode::Apple2_4A,
            4 => ChargingMode::Apple2_1A,
            5 => ChargingMode::Apple1_0A,
            6 => ChargingMode::Apple0_5A,
            7 => ChargingMode::Dcp1_5A,
            8 => ChargingMode::Samsung,
            _ => ChargingMode::Unrecognized(code),
        }
    }
}

impl From<ChargingMode> for u16 {
    fn from(mode: ChargingMode) -> Self {
        match mode {
            ChargingMode::Unknown => 0,
            ChargingMode::QuickCharge2 => 1,
            ChargingMode::QuickCharge3 => 2,
            ChargingMode::Apple2_4A => 3,
            ChargingMode::Apple2_1A => 4,
            ChargingMode::Apple1_0A => 5,
            ChargingMode::Apple0_5A => 6,
            ChargingMode::Dcp1_5A => 7,
            ChargingMode::Samsung => 8,
            ChargingMode::Unrecognized(code) => code,
        }
    }
}

impl std::fmt::Display for ChargingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ChargingMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// One accumulated-usage register.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DataGroup {
    /// Accumulated capacity (Ah).
    pub capacity: f64,
    /// Accumulated energy (Wh).
    pub energy: f64,
}
