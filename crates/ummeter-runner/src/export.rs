//! CSV export of readings.
//!
//! One `;`-separated row per reading, CRLF line endings, with a header
//! written as soon as the exporter is created.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;
use ummeter_protocol::Reading;

/// Column headers, in row order.
pub const CSV_HEADER: [&str; 17] = [
    "Date",
    "Voltage (V)",
    "Intensity (A)",
    "Power (W)",
    "Resistance (Ohm)",
    "USB D+ (V)",
    "USB D- (V)",
    "Charging Mode",
    "Temperature (°C)",
    "Model",
    "Recording",
    "Record duration (sec)",
    "Record intensity (A)",
    "Record capacity (Ah)",
    "Record energy (Wh)",
    "Capacity (Ah)",
    "Energy (Wh)",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Format a decimal value, keeping a fractional part on integral values
/// (`0.0`, `5.0`).
pub fn format_decimal(value: f64) -> String {
    let mut text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS[.ffffff]`; the fraction is
/// omitted when the microseconds are zero.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    with_micros(timestamp.format(DATE_FORMAT).to_string(), timestamp.nanosecond())
}

/// Format a time of day as `HH:MM:SS[.ffffff]`, with the same fraction rule
/// as [`format_timestamp`].
pub fn format_time(time: NaiveTime) -> String {
    with_micros(time.format(TIME_FORMAT).to_string(), time.nanosecond())
}

fn with_micros(mut text: String, nanos: u32) -> String {
    // chrono stores leap seconds as nanos >= 1e9.
    let micros = (nanos % 1_000_000_000) / 1_000;
    if micros != 0 {
        text.push_str(&format!(".{micros:06}"));
    }
    text
}

/// Errors raised while exporting.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing export")]
    Io(#[from] io::Error),

    #[error("CSV error writing export")]
    Csv(#[from] csv::Error),
}

/// Appends readings to a CSV sink.
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvExporter<File> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let file = File::create(path.as_ref())?;
        tracing::debug!("exporting readings to {}", path.as_ref().display());
        Self::new(file)
    }
}

impl<W: Write> CsvExporter<W> {
    /// Wrap `writer` and write the header.
    pub fn new(writer: W) -> Result<Self, ExportError> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(CsvExporter { writer })
    }

    /// Append one row for `reading`, stamped with `timestamp`.
    pub fn update(&mut self, timestamp: NaiveDateTime, reading: &Reading) -> Result<(), ExportError> {
        let (capacity, energy) = match reading.selected_data_group() {
            Some(group) => (format_decimal(group.capacity), format_decimal(group.energy)),
            None => (String::new(), String::new()),
        };
        let recording = if reading.record_enabled { "1" } else { "0" };

        self.writer.write_record([
            format_timestamp(timestamp),
            format_decimal(reading.voltage),
            format_decimal(reading.intensity),
            format_decimal(reading.power),
            format_decimal(reading.resistance),
            format_decimal(reading.usb_voltage_dp),
            format_decimal(reading.usb_voltage_dn),
            reading.charging_mode.tag().to_string(),
            reading.temperature_celsius.to_string(),
            reading.model.name().to_string(),
            recording.to_string(),
            reading.record_duration.as_secs().to_string(),
            format_decimal(reading.record_intensity_threshold),
            format_decimal(reading.record_capacity_threshold),
            format_decimal(reading.record_energy_threshold),
            capacity,
            energy,
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}
