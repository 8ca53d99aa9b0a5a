//! End-to-end tests of the engine against a scripted meter.
//!
//! The frames below are captured data dumps; the engine is driven through
//! [`MockInterface`] so no hardware is needed.

use std::time::Duration;

use chrono::NaiveDate;
use ummeter_interface::MeterInterface;
use ummeter_protocol::{ChargingMode, DataGroup, Model};
use ummeter_runner::{CsvExporter, Meter, MeterError, MockInterface};

/// Data dump captured from a UM25C.
const UM25C_FRAME: [u8; 130] = [
    0x09, 0xc9, 0x01, 0xfe, 0x01, 0x48, 0x00, 0x00, 0x06, 0x88, 0x00, 0x14, 0x00, 0x44, 0x00, 0x08,
    0x00, 0x00, 0x00, 0x0b, 0x00, 0x00, 0x00, 0x38, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x02, 0x00, 0x07, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x01, 0x00, 0x00, 0x0a,
    0x00, 0x00, 0x00, 0xf0, 0x00, 0x00, 0x00, 0x02, 0x00, 0x04, 0x00, 0x01, 0x86, 0x9f, 0x00, 0x02,
    0x68, 0x8c,
];

fn with_model(code: u16) -> Vec<u8> {
    let mut frame = UM25C_FRAME.to_vec();
    frame[..2].copy_from_slice(&code.to_be_bytes());
    frame
}

// ============================================================================
// Polling
// ============================================================================

#[test]
fn test_poll_um25c_reference_frame() {
    let mut meter = Meter::new(MockInterface::new().with_response(UM25C_FRAME));
    let mut session = meter.session().expect("open");
    let reading = session.poll().expect("poll").expect("full frame");

    assert_eq!(reading.model, Model::Um25c);
    assert_eq!(reading.voltage, 0.51);
    assert_eq!(reading.intensity, 0.0328);
    assert_eq!(reading.power, 1.672);
    assert_eq!(reading.resistance, 9999.9);
    assert_eq!(reading.usb_voltage_dp, 0.01);
    assert_eq!(reading.usb_voltage_dn, 0.02);
    assert_eq!(reading.charging_mode, ChargingMode::Dcp1_5A);
    assert_eq!(reading.temperature_celsius, 20);
    assert_eq!(reading.temperature_fahrenheit, 68);
    assert_eq!(reading.data_group_selected, 8);
    assert_eq!(reading.data_group[0], DataGroup { capacity: 0.011, energy: 0.056 });
    assert_eq!(reading.record_capacity_threshold, 0.016);
    assert_eq!(reading.record_energy_threshold, 0.256);
    assert_eq!(reading.record_intensity_threshold, 0.1);
    assert_eq!(reading.record_duration, Duration::from_secs(240));
    assert!(!reading.record_enabled);
    assert_eq!(reading.screen_index, 2);
    assert_eq!(reading.screen_timeout, Duration::from_secs(120));
    assert_eq!(reading.screen_brightness, 4);
    assert_eq!(reading.checksum, 0x8c);

    assert_eq!(session.interface().sent(), &[0xF0]);
}

#[test]
fn test_poll_um34c_scaling() {
    let mut meter = Meter::new(MockInterface::new().with_response(with_model(0x0D4C)));
    meter.open().unwrap();
    let reading = meter.poll().unwrap().unwrap();

    assert_eq!(reading.model, Model::Um34c);
    assert_eq!(reading.voltage, 5.1);
    assert_eq!(reading.intensity, 0.328);
    assert_eq!(reading.power, 1.672);
}

#[test]
fn test_poll_unknown_model() {
    let mut meter = Meter::new(MockInterface::new().with_response(with_model(0x1234)));
    meter.open().unwrap();
    let reading = meter.poll().unwrap().unwrap();

    assert_eq!(reading.model, Model::Unknown);
    assert_eq!(reading.voltage, 0.0);
    assert_eq!(reading.intensity, 0.0);
    assert_eq!(reading.power, 0.0);
    assert_eq!(reading.temperature_celsius, 20);
}

#[test]
fn test_poll_sequence_with_timeouts() {
    let mock = MockInterface::new()
        .with_response(UM25C_FRAME)
        .with_response(&UM25C_FRAME[..10])
        .with_response(Vec::new())
        .with_response(UM25C_FRAME);
    let mut meter = Meter::new(mock);
    meter.open().unwrap();

    let results: Vec<bool> = (0..4).map(|_| meter.poll().unwrap().is_some()).collect();
    assert_eq!(results, vec![true, false, false, true]);
    assert_eq!(meter.interface().sent(), &[0xF0; 4]);
    assert_eq!(meter.interface().pending_responses(), 0);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[test]
fn test_session_applies_timeout_and_closes() {
    let mut meter = Meter::new(MockInterface::new());
    {
        let mut session = meter.session().unwrap();
        session.set_timeout(Duration::from_millis(250)).unwrap();
        session.screen_brightness(2).unwrap();
        session.record_threshold(12).unwrap();
    }

    let mock = meter.into_inner();
    assert!(!mock.is_open());
    assert_eq!(mock.timeout(), Some(Duration::from_millis(250)));
    assert_eq!(mock.sent(), &[0xD2, 0xB1]);
    assert_eq!(mock.connects(), 1);
    assert_eq!(mock.disconnects(), 1);
}

#[test]
fn test_session_closes_on_command_error() {
    let mut meter = Meter::new(MockInterface::new());
    let result = (|| -> Result<(), MeterError> {
        let mut session = meter.session()?;
        session.screen_next()?;
        session.data_group_select(-1)?;
        session.screen_next()?;
        Ok(())
    })();

    assert!(matches!(result, Err(MeterError::Command(_))));
    assert!(!meter.is_open());
    assert_eq!(meter.interface().sent(), &[0xF1]);
}

#[test]
fn test_sessions_can_be_reopened() {
    let mut meter = Meter::new(MockInterface::new());
    for _ in 0..3 {
        let mut session = meter.session().unwrap();
        session.screen_rotate().unwrap();
    }
    assert_eq!(meter.interface().connects(), 3);
    assert_eq!(meter.interface().disconnects(), 3);
    assert_eq!(meter.interface().sent(), &[0xF2; 3]);
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_poll_and_export() {
    let mut frame = with_model(0x0D4C);
    // Select data group 0.
    frame[14..16].copy_from_slice(&0u16.to_be_bytes());

    let mut meter = Meter::new(MockInterface::new().with_response(frame));
    let mut exporter = CsvExporter::new(Vec::new()).unwrap();
    {
        let mut session = meter.session().unwrap();
        let reading = session.poll().unwrap().unwrap();
        let timestamp = NaiveDate::from_ymd_opt(2023, 11, 2)
            .and_then(|d| d.and_hms_micro_opt(8, 30, 0, 123456))
            .unwrap();
        exporter.update(timestamp, &reading).unwrap();
    }

    let text = String::from_utf8(exporter.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Date;Voltage (V);"));
    assert_eq!(
        lines[1],
        "2023-11-02 08:30:00.123456;5.1;0.328;1.672;9999.9;0.01;0.02;DCP1.5A;20;UM34C;0;240;0.1;0.016;0.256;0.011;0.056"
    );
    assert_eq!(lines[2], "");
}
