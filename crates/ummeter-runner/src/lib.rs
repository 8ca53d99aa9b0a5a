//! UM-series meter runner
//!
//! Ties the protocol and interface crates together: [`Meter`] polls and
//! controls a device, [`CsvExporter`] logs readings to disk and
//! [`telemetry`] declares the metrics the engine records.

pub mod export;
pub mod meter;
pub mod mock;
pub mod telemetry;

pub use export::{format_decimal, format_time, format_timestamp, CsvExporter, ExportError, CSV_HEADER};
pub use meter::{Meter, MeterError, MeterResult, MeterSession};
pub use mock::MockInterface;
