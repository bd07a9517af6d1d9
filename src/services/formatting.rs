//! Output formatting for aggregated records
//!
//! Statistics are computed in source units (inches, °F, mph, feet). Conversion
//! and rounding happen here, right before rendering, through the
//! [`UnitConverter`] seam so callers can plug in their own conversion tables.
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

use crate::config::UnitSystem;
use crate::error::{ConfigError, PipelineError};
use crate::models::{AggregatedRecord, FieldValue};
use crate::utils;

/// Physical kind of a value, which decides how it converts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Snow depth and precipitation, inches
    Length,
    /// Station elevation, feet
    Elevation,
    /// Degrees Fahrenheit
    Temperature,
    /// Miles per hour
    Speed,
    Percent,
    /// Bearings in degrees
    Angle,
}

pub trait UnitConverter: Send + Sync {
    fn convert(&self, quantity: Quantity, value: f64) -> f64;
}

/// Source units, no conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct Imperial;

impl UnitConverter for Imperial {
    fn convert(&self, _quantity: Quantity, value: f64) -> f64 {
        value
    }
}

/// Centimeters, meters, °C and km/h
#[derive(Debug, Clone, Copy, Default)]
pub struct Metric;

impl UnitConverter for Metric {
    fn convert(&self, quantity: Quantity, value: f64) -> f64 {
        match quantity {
            Quantity::Length => value * 2.54,
            Quantity::Elevation => value * 0.3048,
            Quantity::Temperature => (value - 32.0) * 5.0 / 9.0,
            Quantity::Speed => value * 1.609_344,
            Quantity::Percent | Quantity::Angle => value,
        }
    }
}

pub fn converter_for(units: UnitSystem) -> Box<dyn UnitConverter> {
    match units {
        UnitSystem::Imperial => Box::new(Imperial),
        UnitSystem::Metric => Box::new(Metric),
    }
}

/// Convert and round one statistic; `None` becomes [`FieldValue::NoData`]
pub fn render_number(
    value: Option<f64>,
    quantity: Quantity,
    decimals: u32,
    converter: &dyn UnitConverter,
) -> FieldValue {
    match value {
        Some(v) => FieldValue::Number(utils::round_to(converter.convert(quantity, v), decimals)),
        None => FieldValue::NoData,
    }
}

/// Fixed identity columns preceding the measurement fields
pub const IDENTITY_COLUMNS: [&str; 8] = [
    "Station",
    "Name",
    "Latitude",
    "Longitude",
    "Elevation",
    "Period Start",
    "Period End",
    "Observations",
];

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(v) => serializer.serialize_f64(*v),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::NoData => serializer.serialize_none(),
        }
    }
}

/// Flat JSON object: identity keys, then every field in rule-table order
impl Serialize for AggregatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(IDENTITY_COLUMNS.len() + self.fields.len()))?;
        map.serialize_entry("Station", &self.station_id)?;
        map.serialize_entry("Name", &self.name)?;
        map.serialize_entry("Latitude", &self.latitude)?;
        map.serialize_entry("Longitude", &self.longitude)?;
        map.serialize_entry("Elevation", &self.elevation)?;
        map.serialize_entry("Period Start", &self.period_start.to_rfc3339())?;
        map.serialize_entry("Period End", &self.period_end.to_rfc3339())?;
        map.serialize_entry("Observations", &self.observation_count)?;
        for field in &self.fields {
            map.serialize_entry(field.name, &field.value)?;
        }
        map.end()
    }
}

fn cell(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(v) => v.to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::NoData => String::new(),
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl AggregatedRecord {
    /// Column names matching [`AggregatedRecord::to_row`]
    pub fn csv_header(&self) -> Vec<String> {
        IDENTITY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.fields.iter().map(|f| f.name.to_string()))
            .collect()
    }

    /// Tabular rendering; missing values become empty cells
    pub fn to_row(&self) -> Vec<String> {
        let identity = [
            self.station_id.clone(),
            self.name.clone(),
            optional_cell(self.latitude),
            optional_cell(self.longitude),
            optional_cell(self.elevation),
            self.period_start.to_rfc3339(),
            self.period_end.to_rfc3339(),
            self.observation_count.to_string(),
        ];
        identity
            .into_iter()
            .chain(self.fields.iter().map(|f| cell(&f.value)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(ConfigError::InvalidFormat(s.to_string())),
        }
    }
}

/// Render records in the requested format
pub fn write_records<W: Write>(
    records: &[AggregatedRecord],
    format: OutputFormat,
    writer: W,
) -> Result<(), PipelineError> {
    match format {
        OutputFormat::Json => write_json(records, writer),
        OutputFormat::Csv => write_csv(records, writer),
    }
}

pub fn write_json<W: Write>(
    records: &[AggregatedRecord],
    mut writer: W,
) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    debug!("Wrote {} records as JSON", records.len());
    Ok(())
}

/// Write records as CSV. All records share the rule table, so the first
/// record's header applies to every row.
pub fn write_csv<W: Write>(records: &[AggregatedRecord], writer: W) -> Result<(), PipelineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if let Some(first) = records.first() {
        csv_writer.write_record(first.csv_header())?;
    }
    for record in records {
        csv_writer.write_record(record.to_row())?;
    }
    csv_writer.flush()?;
    debug!("Wrote {} records as CSV", records.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryField;
    use chrono::DateTime;

    fn record() -> AggregatedRecord {
        let start = DateTime::parse_from_rfc3339("2024-01-01T08:00:00-07:00").unwrap();
        AggregatedRecord {
            station_id: "ALTA".to_string(),
            name: "Alta Collins".to_string(),
            latitude: Some(40.58),
            longitude: Some(-111.63),
            elevation: None,
            period_start: start,
            period_end: start + chrono::Duration::seconds(86_399),
            observation_count: 24,
            statistics: Vec::new(),
            fields: vec![
                SummaryField {
                    name: "Total Snow Depth",
                    value: FieldValue::Number(52.5),
                },
                SummaryField {
                    name: "Wind Direction",
                    value: FieldValue::Text("NW".to_string()),
                },
                SummaryField {
                    name: "Max Wind Gust",
                    value: FieldValue::NoData,
                },
            ],
        }
    }

    #[test]
    fn test_metric_conversion() {
        assert!((Metric.convert(Quantity::Length, 10.0) - 25.4).abs() < 1e-9);
        assert!((Metric.convert(Quantity::Temperature, 32.0)).abs() < 1e-9);
        assert!((Metric.convert(Quantity::Speed, 10.0) - 16.09344).abs() < 1e-9);
        assert!((Metric.convert(Quantity::Elevation, 1000.0) - 304.8).abs() < 1e-9);
        assert_eq!(Metric.convert(Quantity::Angle, 270.0), 270.0);
        assert_eq!(Imperial.convert(Quantity::Temperature, 14.0), 14.0);
    }

    #[test]
    fn test_render_number() {
        assert_eq!(
            render_number(Some(1.256), Quantity::Length, 1, &Imperial),
            FieldValue::Number(1.3)
        );
        assert_eq!(
            render_number(Some(23.0), Quantity::Temperature, 1, &Metric),
            FieldValue::Number(-5.0)
        );
        assert_eq!(
            render_number(None, Quantity::Length, 1, &Metric),
            FieldValue::NoData
        );
    }

    #[test]
    fn test_json_is_flat_with_null_for_no_data() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["Station"], "ALTA");
        assert_eq!(json["Total Snow Depth"], 52.5);
        assert_eq!(json["Wind Direction"], "NW");
        assert!(json["Max Wind Gust"].is_null());
        assert!(json["Elevation"].is_null());
        assert_eq!(json["Period Start"], "2024-01-01T08:00:00-07:00");
        assert_eq!(json["Observations"], 24);
    }

    #[test]
    fn test_row_matches_header() {
        let record = record();
        let header = record.csv_header();
        let row = record.to_row();
        assert_eq!(header.len(), row.len());
        assert_eq!(header[8], "Total Snow Depth");
        assert_eq!(row[8], "52.5");
        assert_eq!(row[10], "");
        assert_eq!(row[4], "");
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        write_csv(&[record(), record()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Station,Name,Latitude"));
        assert!(lines[1].starts_with("ALTA,Alta Collins,40.58,-111.63,,"));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!(" CSV ".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!(
            "xlsx".parse::<OutputFormat>(),
            Err(ConfigError::InvalidFormat("xlsx".to_string()))
        );
    }

    #[test]
    fn test_write_records_dispatches_on_format() {
        let mut csv_out = Vec::new();
        write_records(&[record()], OutputFormat::Csv, &mut csv_out).unwrap();
        assert!(String::from_utf8(csv_out).unwrap().starts_with("Station,Name"));

        let mut json_out = Vec::new();
        write_records(&[record()], OutputFormat::Json, &mut json_out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json_out).unwrap();
        assert_eq!(parsed[0]["Station"], "ALTA");
    }

    #[test]
    fn test_write_json_empty() {
        let mut out = Vec::new();
        write_json(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}
