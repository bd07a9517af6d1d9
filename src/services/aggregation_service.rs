//! Per-station, per-period statistics
//!
//! Which statistics each measurement gets, and under which output name, is
//! declared in [`AGGREGATION_RULES`]. Adding a measurement means adding a row,
//! not another branch.
use serde::Serialize;
use tracing::debug;

use crate::filters::{accumulate, filter_snow_depth, Accumulation, FilterPreset, ReferenceMode};
use crate::grouping::Period;
use crate::models::{
    self, AggregatedRecord, FieldValue, MeasurementStatistics, Observation, SnowDepthSample,
    StationMetadata, SummaryField,
};
use crate::services::formatting::{render_number, Quantity, UnitConverter};
use crate::wind;

/// What a rendered field reads out of [`MeasurementStatistics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Min,
    Max,
    Avg,
    /// Circular average in degrees, kept in `[0, 360)` after rounding
    Bearing,
    Last,
    Change,
    /// Sum excluding the first sample
    Sum,
    /// Cumulative new snow
    Total,
    /// 16-point label of the (circular) average
    Compass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Averaging {
    Arithmetic,
    Circular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputField {
    pub name: &'static str,
    pub statistic: Statistic,
    pub decimals: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationRule {
    pub measurement: &'static str,
    pub quantity: Quantity,
    pub averaging: Averaging,
    /// Outlier filter applied to the series before any statistic
    pub filter: Option<FilterPreset>,
    /// Feed the filtered series through the accumulation calculator
    pub accumulate: bool,
    pub fields: &'static [OutputField],
}

const fn field(name: &'static str, statistic: Statistic, decimals: u32) -> OutputField {
    OutputField {
        name,
        statistic,
        decimals,
    }
}

pub const AIR_TEMP_MIN: &str = "Air Temp Min";
pub const AIR_TEMP_MAX: &str = "Air Temp Max";
pub const AIR_TEMP: &str = "Air Temp";
pub const WIND_SPEED_AVG: &str = "Wind Speed Avg";
pub const WIND_SPEED: &str = "Wind Speed";
pub const MAX_WIND_GUST: &str = "Max Wind Gust";
pub const WIND_DIRECTION: &str = "Wind Direction";
pub const WIND_DIRECTION_DEGREES: &str = "Wind Direction Degrees";
pub const TOTAL_SNOW_DEPTH: &str = "Total Snow Depth";
pub const TOTAL_SNOW_DEPTH_CHANGE: &str = "Total Snow Depth Change";
pub const SNOW_ACCUMULATION_24H: &str = "24h Snow Accumulation";
pub const PRECIP_ACCUM_ONE_HOUR: &str = "Precip Accum One Hour";
pub const RELATIVE_HUMIDITY: &str = "Relative Humidity";

pub const AGGREGATION_RULES: &[AggregationRule] = &[
    AggregationRule {
        measurement: models::AIR_TEMP,
        quantity: Quantity::Temperature,
        averaging: Averaging::Arithmetic,
        filter: None,
        accumulate: false,
        fields: &[
            field(AIR_TEMP_MIN, Statistic::Min, 1),
            field(AIR_TEMP_MAX, Statistic::Max, 1),
            field(AIR_TEMP, Statistic::Last, 1),
        ],
    },
    AggregationRule {
        measurement: models::WIND_SPEED,
        quantity: Quantity::Speed,
        averaging: Averaging::Arithmetic,
        filter: None,
        accumulate: false,
        fields: &[
            field(WIND_SPEED_AVG, Statistic::Avg, 1),
            field(WIND_SPEED, Statistic::Last, 1),
        ],
    },
    AggregationRule {
        measurement: models::WIND_GUST,
        quantity: Quantity::Speed,
        averaging: Averaging::Arithmetic,
        filter: None,
        accumulate: false,
        fields: &[field(MAX_WIND_GUST, Statistic::Max, 1)],
    },
    AggregationRule {
        measurement: models::WIND_DIRECTION,
        quantity: Quantity::Angle,
        averaging: Averaging::Circular,
        filter: None,
        accumulate: false,
        fields: &[
            field(WIND_DIRECTION, Statistic::Compass, 0),
            field(WIND_DIRECTION_DEGREES, Statistic::Bearing, 0),
        ],
    },
    AggregationRule {
        measurement: models::SNOW_DEPTH,
        quantity: Quantity::Length,
        averaging: Averaging::Arithmetic,
        filter: Some(FilterPreset::TotalDepth),
        accumulate: false,
        fields: &[
            field(TOTAL_SNOW_DEPTH, Statistic::Last, 1),
            field(TOTAL_SNOW_DEPTH_CHANGE, Statistic::Change, 1),
        ],
    },
    AggregationRule {
        measurement: models::SNOW_DEPTH_24H,
        quantity: Quantity::Length,
        averaging: Averaging::Arithmetic,
        filter: Some(FilterPreset::Board24h),
        accumulate: true,
        fields: &[field(SNOW_ACCUMULATION_24H, Statistic::Total, 1)],
    },
    AggregationRule {
        measurement: models::PRECIP_ACCUM_ONE_HOUR,
        quantity: Quantity::Length,
        averaging: Averaging::Arithmetic,
        filter: None,
        accumulate: false,
        fields: &[field(PRECIP_ACCUM_ONE_HOUR, Statistic::Sum, 2)],
    },
    AggregationRule {
        measurement: models::RELATIVE_HUMIDITY,
        quantity: Quantity::Percent,
        averaging: Averaging::Arithmetic,
        filter: None,
        accumulate: false,
        fields: &[field(RELATIVE_HUMIDITY, Statistic::Avg, 0)],
    },
];

/// Cleaned and derived snow series for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSeries {
    pub snow_depth: Vec<SnowDepthSample>,
    pub snow_depth_24h: Vec<SnowDepthSample>,
    pub accumulation: Accumulation,
}

/// Sum of present values after index 0.
///
/// The first reading of a period is the carry-over from the previous period's
/// last hour, so it is excluded.
pub fn sum_excluding_first(values: &[Option<f64>]) -> Option<f64> {
    let rest: Vec<f64> = values.iter().skip(1).flatten().copied().collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.iter().sum())
    }
}

/// Apply a rule's filter (if any) to one measurement's series
fn series(rule: &AggregationRule, observations: &[Observation]) -> Vec<SnowDepthSample> {
    let raw = models::measurement_series(observations, rule.measurement);
    match rule.filter {
        Some(preset) => filter_snow_depth(&raw, &preset.params()),
        None => raw,
    }
}

/// Compute the full statistic set for one measurement.
///
/// `observations` must be sorted ascending.
pub fn measurement_statistics(
    rule: &AggregationRule,
    observations: &[Observation],
) -> MeasurementStatistics {
    let samples = series(rule, observations);
    let values: Vec<Option<f64>> = samples.iter().map(|s| s.depth).collect();
    let present: Vec<f64> = values.iter().flatten().copied().collect();

    let first = present.first().copied();
    let last = present.last().copied();
    let avg = match rule.averaging {
        Averaging::Arithmetic if !present.is_empty() => {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
        Averaging::Arithmetic => None,
        Averaging::Circular => wind::circular_mean(&present),
    };
    let total = if rule.accumulate {
        accumulate(&samples, ReferenceMode::LastValid).total()
    } else {
        None
    };

    MeasurementStatistics {
        measurement: rule.measurement.to_string(),
        count: present.len(),
        min: present.iter().copied().reduce(f64::min),
        max: present.iter().copied().reduce(f64::max),
        avg,
        first,
        last,
        change: first.zip(last).map(|(f, l)| l - f),
        sum: sum_excluding_first(&values),
        total,
    }
}

fn render_field(
    output: &OutputField,
    rule: &AggregationRule,
    stats: &MeasurementStatistics,
    converter: &dyn UnitConverter,
) -> FieldValue {
    let number = |value: Option<f64>| render_number(value, rule.quantity, output.decimals, converter);
    match output.statistic {
        Statistic::Min => number(stats.min),
        Statistic::Max => number(stats.max),
        Statistic::Avg => number(stats.avg),
        // 359.7 rounds to 360, which is north again
        Statistic::Bearing => match number(stats.avg) {
            FieldValue::Number(degrees) => FieldValue::Number(degrees.rem_euclid(360.0)),
            other => other,
        },
        Statistic::Last => number(stats.last),
        Statistic::Change => number(stats.change),
        Statistic::Sum => number(stats.sum),
        Statistic::Total => number(stats.total),
        Statistic::Compass => stats
            .avg
            .map(|degrees| FieldValue::Text(wind::compass_label(degrees).to_string()))
            .unwrap_or(FieldValue::NoData),
    }
}

/// Applies a rule table to (station, period) groups
#[derive(Debug, Clone, Copy)]
pub struct StationAggregator {
    rules: &'static [AggregationRule],
}

impl Default for StationAggregator {
    fn default() -> Self {
        Self::new(AGGREGATION_RULES)
    }
}

impl StationAggregator {
    pub fn new(rules: &'static [AggregationRule]) -> Self {
        Self { rules }
    }

    /// Build the summary record for one group of ascending observations
    pub fn aggregate(
        &self,
        station: &StationMetadata,
        period: &Period,
        observations: &[Observation],
        converter: &dyn UnitConverter,
    ) -> AggregatedRecord {
        let mut statistics = Vec::with_capacity(self.rules.len());
        let mut fields = Vec::new();

        for rule in self.rules {
            let stats = measurement_statistics(rule, observations);
            if stats.count == 0 {
                debug!(
                    "Station {}: no {} data for period starting {}",
                    station.station_id, rule.measurement, period.start
                );
            }
            fields.extend(rule.fields.iter().map(|output| SummaryField {
                name: output.name,
                value: render_field(output, rule, &stats, converter),
            }));
            statistics.push(stats);
        }

        AggregatedRecord {
            station_id: station.station_id.clone(),
            name: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            elevation: station
                .elevation
                .map(|e| converter.convert(Quantity::Elevation, e).round()),
            period_start: period.start,
            period_end: period.end,
            observation_count: observations.len(),
            statistics,
            fields,
        }
    }

    /// Cleaned snow depth, cleaned board depth and the board's accumulation
    pub fn filtered_series(observations: &[Observation]) -> FilteredSeries {
        let snow_depth = filter_snow_depth(
            &models::measurement_series(observations, models::SNOW_DEPTH),
            &FilterPreset::TotalDepth.params(),
        );
        let snow_depth_24h = filter_snow_depth(
            &models::measurement_series(observations, models::SNOW_DEPTH_24H),
            &FilterPreset::Board24h.params(),
        );
        let accumulation = accumulate(&snow_depth_24h, ReferenceMode::LastValid);

        FilteredSeries {
            snow_depth,
            snow_depth_24h,
            accumulation,
        }
    }
}
