//! Period grouping
//!
//! Splits a batch of observations into independent (station, period) groups.
//! Each group is sorted ascending by timestamp and can be processed without
//! looking at any other group.
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::Observation;

/// Length of a rolling period minus one second (23:59:59)
const ROLLING_PERIOD_SECONDS: i64 = 24 * 60 * 60 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum GroupingMode {
    /// One bucket per station covering everything supplied
    Summary,
    /// 24h windows anchored at each station's first observation
    Rolling24h,
    /// Calendar dates, keeping only hours in `[start_hour, end_hour)`
    CalendarDay { start_hour: u32, end_hour: u32 },
}

/// A (station, time window) group key.
///
/// Ordering is by station, then period start, which is also the output order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub station_id: String,
    pub start: DateTime<FixedOffset>,
    /// Inclusive end of the window
    pub end: DateTime<FixedOffset>,
}

impl Period {
    pub fn contains(&self, timestamp: &DateTime<FixedOffset>) -> bool {
        self.start <= *timestamp && *timestamp <= self.end
    }
}

pub type PeriodGroups = BTreeMap<Period, Vec<Observation>>;

/// Group observations according to `mode`.
pub fn group_observations(observations: &[Observation], mode: GroupingMode) -> PeriodGroups {
    let by_station = group_by_station(observations);

    let groups: PeriodGroups = match mode {
        GroupingMode::Summary => by_station
            .into_iter()
            .filter_map(|(station_id, readings)| {
                let start = readings.first()?.timestamp;
                let end = readings.last()?.timestamp;
                Some((
                    Period {
                        station_id,
                        start,
                        end,
                    },
                    readings,
                ))
            })
            .collect(),
        GroupingMode::Rolling24h => by_station
            .into_iter()
            .flat_map(|(station_id, readings)| rolling_periods(&station_id, readings))
            .collect(),
        GroupingMode::CalendarDay {
            start_hour,
            end_hour,
        } => by_station
            .into_iter()
            .flat_map(|(station_id, readings)| {
                calendar_days(&station_id, readings, start_hour, end_hour)
            })
            .collect(),
    };

    debug!(
        "Grouped {} observations into {} periods ({:?})",
        observations.len(),
        groups.len(),
        mode
    );

    groups
}

/// Group by station id, each station's readings sorted ascending
pub fn group_by_station(observations: &[Observation]) -> BTreeMap<String, Vec<Observation>> {
    let mut by_station: BTreeMap<String, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        by_station
            .entry(obs.station_id.clone())
            .or_default()
            .push(obs.clone());
    }

    for readings in by_station.values_mut() {
        readings.sort_by_key(|obs| obs.timestamp);
    }

    by_station
}

/// Split one station's ascending readings into contiguous 24h windows.
///
/// The first window starts at the first reading. Each following window starts
/// one second after the previous one ends, so boundaries stay on whole-day
/// offsets from the anchor no matter how irregular the sampling is. Windows
/// with no readings are skipped.
fn rolling_periods(station_id: &str, readings: Vec<Observation>) -> Vec<(Period, Vec<Observation>)> {
    let mut periods: Vec<(Period, Vec<Observation>)> = Vec::new();
    let Some(anchor) = readings.first().map(|obs| obs.timestamp) else {
        return periods;
    };

    let span = Duration::seconds(ROLLING_PERIOD_SECONDS);
    let step = Duration::seconds(ROLLING_PERIOD_SECONDS + 1);

    for obs in readings {
        let needs_new_period = periods
            .last()
            .map_or(true, |(period, _)| obs.timestamp > period.end);

        if needs_new_period {
            let steps = (obs.timestamp - anchor).num_seconds() / step.num_seconds();
            let start = anchor + step * steps as i32;
            periods.push((
                Period {
                    station_id: station_id.to_string(),
                    start,
                    end: start + span,
                },
                Vec::new(),
            ));
        }

        if let Some((_, bucket)) = periods.last_mut() {
            bucket.push(obs);
        }
    }

    periods
}

/// Bucket one station's readings by local calendar date, dropping readings
/// whose local hour falls outside `[start_hour, end_hour)`.
fn calendar_days(
    station_id: &str,
    readings: Vec<Observation>,
    start_hour: u32,
    end_hour: u32,
) -> Vec<(Period, Vec<Observation>)> {
    let total = readings.len();
    let mut by_date: BTreeMap<NaiveDate, Vec<Observation>> = BTreeMap::new();
    for obs in readings {
        let hour = obs.timestamp.hour();
        if (start_hour..end_hour).contains(&hour) {
            by_date.entry(obs.timestamp.date_naive()).or_default().push(obs);
        }
    }

    let kept: usize = by_date.values().map(Vec::len).sum();
    if kept < total {
        debug!(
            "Station {}: dropped {} readings outside hours {}-{}",
            station_id,
            total - kept,
            start_hour,
            end_hour
        );
    }

    by_date
        .into_iter()
        .filter_map(|(date, bucket)| {
            let offset = *bucket.first()?.timestamp.offset();
            let midnight = date.and_time(NaiveTime::MIN);
            let start = at_offset(midnight + Duration::hours(start_hour as i64), offset);
            let end = at_offset(
                midnight + Duration::hours(end_hour as i64) - Duration::seconds(1),
                offset,
            );
            Some((
                Period {
                    station_id: station_id.to_string(),
                    start,
                    end,
                },
                bucket,
            ))
        })
        .collect()
}

/// Interpret a naive local time in a fixed offset
fn at_offset(local: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = local - Duration::seconds(offset.local_minus_utc() as i64);
    DateTime::from_naive_utc_and_offset(utc, offset)
}
