// Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset};
use snow_tracker::models::{Observation, SnowDepthSample, StationMetadata};

/// Parse an RFC 3339 timestamp
pub fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).expect("valid test timestamp")
}

/// Hourly depth samples starting at `start`
pub fn hourly_samples(start: &str, depths: &[Option<f64>]) -> Vec<SnowDepthSample> {
    let start = ts(start);
    depths
        .iter()
        .enumerate()
        .map(|(i, d)| SnowDepthSample::new(start + Duration::hours(i as i64), *d))
        .collect()
}

/// `hours` empty hourly observations for one station
pub fn hourly_observations(station: &str, start: &str, hours: i64) -> Vec<Observation> {
    let start = ts(start);
    (0..hours)
        .map(|h| Observation::new(station, start + Duration::hours(h)))
        .collect()
}

/// Hourly observations carrying one measurement
pub fn hourly_with(
    station: &str,
    start: &str,
    measurement: &str,
    values: &[Option<f64>],
) -> Vec<Observation> {
    let start = ts(start);
    values
        .iter()
        .enumerate()
        .map(|(i, v)| Observation::new(station, start + Duration::hours(i as i64)).with(measurement, *v))
        .collect()
}

pub fn station(id: &str, name: &str) -> StationMetadata {
    StationMetadata {
        station_id: id.to_string(),
        name: name.to_string(),
        latitude: Some(40.59),
        longitude: Some(-111.64),
        elevation: Some(9600.0),
    }
}

pub fn stations() -> Vec<StationMetadata> {
    vec![
        station("ALTA", "Alta Collins"),
        station("BRIGHTON", "Brighton Crest"),
    ]
}
