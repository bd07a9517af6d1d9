use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::utils;

// Measurement names as they appear in ingested observation records
pub const AIR_TEMP: &str = "air_temp";
pub const WIND_SPEED: &str = "wind_speed";
pub const WIND_GUST: &str = "wind_gust";
pub const WIND_DIRECTION: &str = "wind_direction";
pub const SNOW_DEPTH: &str = "snow_depth";
pub const SNOW_DEPTH_24H: &str = "snow_depth_24h";
pub const PRECIP_ACCUM_ONE_HOUR: &str = "precip_accum_one_hour";
pub const RELATIVE_HUMIDITY: &str = "relative_humidity";

/// One station's readings for one timestamp.
///
/// `None` is the only "no data" marker; a stored `0.0` is a real zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub station_id: String,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub measurements: HashMap<String, Option<f64>>,
}

impl Observation {
    pub fn new(station_id: impl Into<String>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp,
            measurements: HashMap::new(),
        }
    }

    /// Builder-style helper, mostly used when assembling fixtures.
    pub fn with(mut self, measurement: &str, value: Option<f64>) -> Self {
        self.measurements.insert(measurement.to_string(), value);
        self
    }

    /// Value of a measurement, `None` when absent or recorded as missing
    pub fn value(&self, measurement: &str) -> Option<f64> {
        self.measurements.get(measurement).copied().flatten()
    }

    /// Convert a raw ingestion record, coercing every measurement best-effort.
    ///
    /// Returns `None` only when the timestamp cannot be parsed, since such a
    /// record cannot be placed in any period.
    pub fn from_raw(raw: RawObservation) -> Option<Self> {
        let timestamp = match DateTime::parse_from_rfc3339(raw.timestamp.trim()) {
            Ok(ts) => ts,
            Err(e) => {
                warn!(
                    "Dropping observation for station {}: bad timestamp '{}' ({})",
                    raw.station_id, raw.timestamp, e
                );
                return None;
            }
        };

        let measurements = raw
            .measurements
            .iter()
            .map(|(name, value)| {
                let parsed = utils::coerce_measurement(value);
                if parsed.is_malformed() {
                    warn!(
                        "Malformed {} value for station {} at {}: {}",
                        name, raw.station_id, timestamp, value
                    );
                }
                (name.clone(), parsed.value())
            })
            .collect();

        Some(Self {
            station_id: raw.station_id,
            timestamp,
            measurements,
        })
    }
}

/// An observation as delivered by ingestion, before any value coercion.
///
/// Upstream sources mix numbers, numeric strings and assorted "missing"
/// markers ("", "-", "NaN", null) in the same field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    pub station_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub measurements: serde_json::Map<String, serde_json::Value>,
}

/// Static per-station metadata used for the identity part of a summary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMetadata {
    pub station_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Elevation in feet
    pub elevation: Option<f64>,
}

/// A single point of a snow-depth series after projection out of an observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnowDepthSample {
    pub timestamp: DateTime<FixedOffset>,
    pub depth: Option<f64>,
}

impl SnowDepthSample {
    pub fn new(timestamp: DateTime<FixedOffset>, depth: Option<f64>) -> Self {
        Self { timestamp, depth }
    }
}

/// Project one measurement of a time-ordered observation slice into a sample series
pub fn measurement_series(
    observations: &[Observation],
    measurement: &str,
) -> Vec<SnowDepthSample> {
    observations
        .iter()
        .map(|obs| SnowDepthSample::new(obs.timestamp, obs.value(measurement)))
        .collect()
}

// Aggregation output DTOs (rendering lives in services::formatting)

/// Statistic set for one measurement over one period, in source units.
///
/// Every statistic is `None` when the period has no usable sample, which keeps
/// "no data" apart from a genuine zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeasurementStatistics {
    pub measurement: String,
    /// Number of usable samples
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Arithmetic mean, or the circular mean for bearings
    pub avg: Option<f64>,
    pub first: Option<f64>,
    pub last: Option<f64>,
    /// `last - first`
    pub change: Option<f64>,
    /// Sum of every sample after the first one
    pub sum: Option<f64>,
    /// Cumulative new-snow total, only for accumulating measurements
    pub total: Option<f64>,
}

/// A rendered output value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    NoData,
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) | FieldValue::NoData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryField {
    pub name: &'static str,
    pub value: FieldValue,
}

/// One (station, period) summary, ready for persistence or rendering
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub station_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Elevation in output units
    pub elevation: Option<f64>,
    pub period_start: DateTime<FixedOffset>,
    pub period_end: DateTime<FixedOffset>,
    pub observation_count: usize,
    pub statistics: Vec<MeasurementStatistics>,
    /// Named output fields in rule-table order
    pub fields: Vec<SummaryField>,
}

impl AggregatedRecord {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn statistics_for(&self, measurement: &str) -> Option<&MeasurementStatistics> {
        self.statistics.iter().find(|s| s.measurement == measurement)
    }
}
