use thiserror::Error;

/// Invalid aggregation settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown aggregation mode: {0} (expected 'summary' or 'daily')")]
    InvalidMode(String),

    #[error("Unknown day range type: {0} (expected 'rolling' or 'calendar')")]
    InvalidDayRangeType(String),

    #[error("Unknown unit system: {0} (expected 'imperial' or 'metric')")]
    InvalidUnits(String),

    #[error("Unknown output format: {0} (expected 'json' or 'csv')")]
    InvalidFormat(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: String, value: String },

    #[error("Hour out of range: {0} (expected 0-24)")]
    HourOutOfRange(u32),

    #[error("Empty hour window: start {start} must be before end {end}")]
    EmptyHourWindow { start: u32, end: u32 },
}

/// A single (station, period) group that could not be aggregated.
///
/// Group failures are collected next to the successful records; they never
/// abort the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupError {
    #[error("No metadata for station {0}")]
    UnknownStation(String),

    #[error("Group {0} has no observations")]
    EmptyGroup(String),
}

/// Hard failures that stop a batch before any group is processed
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No station metadata supplied")]
    NoStations,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
