//! Metric declarations for the meter engine.
//!
//! Metrics go through the `metrics` facade; without an installed recorder
//! every call is a no-op. Call [`describe_metrics`] once at startup when a
//! recorder is installed.
//!
//! ```rust,ignore
//! use ummeter_runner::telemetry::metric_defs;
//!
//! metrics::counter!(metric_defs::POLLS.name).increment(1);
//! ```

use metrics::{describe_counter, describe_gauge, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
}

impl Metric {
    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
        }
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Gauge,
            description: "",
            unit: None,
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Register this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
        }
    }
}

/// All metrics recorded by the engine.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Data dumps requested.
    pub const POLLS: Metric = Metric::counter("ummeter.polls")
        .with_description("Data dumps requested from the meter")
        .with_unit(Unit::Count);

    /// Data dumps that came back short or empty.
    pub const POLLS_INCOMPLETE: Metric = Metric::counter("ummeter.polls_incomplete")
        .with_description("Data dumps shorter than a full frame")
        .with_unit(Unit::Count);

    /// Control commands sent (excluding data requests).
    pub const COMMANDS_SENT: Metric = Metric::counter("ummeter.commands_sent")
        .with_description("Control commands sent to the meter")
        .with_unit(Unit::Count);

    /// Last bus voltage in volts.
    pub const VOLTAGE: Metric =
        Metric::gauge("ummeter.voltage_volts").with_description("Last measured bus voltage");

    /// Last current in amps.
    pub const INTENSITY: Metric =
        Metric::gauge("ummeter.intensity_amps").with_description("Last measured current");

    /// Last power in watts.
    pub const POWER: Metric =
        Metric::gauge("ummeter.power_watts").with_description("Last measured power");

    /// Every declared metric.
    pub const ALL: &[Metric] = &[POLLS, POLLS_INCOMPLETE, COMMANDS_SENT, VOLTAGE, INTENSITY, POWER];
}

/// Register descriptions for every metric in [`metric_defs::ALL`].
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
