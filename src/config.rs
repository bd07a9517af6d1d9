use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::grouping::GroupingMode;

pub const ENV_MODE: &str = "SNOW_AGGREGATION_MODE";
pub const ENV_DAY_RANGE_TYPE: &str = "SNOW_DAY_RANGE_TYPE";
pub const ENV_START_HOUR: &str = "SNOW_START_HOUR";
pub const ENV_END_HOUR: &str = "SNOW_END_HOUR";
pub const ENV_UNITS: &str = "SNOW_UNITS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// One record per station over the whole input
    Summary,
    /// One record per station per day
    #[default]
    Daily,
}

/// How "a day" is cut in daily mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayRangeType {
    /// 24h windows anchored at the first observation
    #[default]
    Rolling,
    /// Calendar dates restricted to `[start_hour, end_hour)`
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub mode: AggregationMode,
    pub day_range_type: DayRangeType,
    pub start_hour: u32,
    pub end_hour: u32,
    pub units: UnitSystem,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            mode: AggregationMode::Daily,
            day_range_type: DayRangeType::Rolling,
            start_hour: 0,
            end_hour: 24,
            units: UnitSystem::Imperial,
        }
    }
}

impl AggregationConfig {
    /// Load from `SNOW_*` environment variables, defaulting anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key/value source (environment, `.env`, test fixtures)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            mode: lookup(ENV_MODE)
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.mode),
            day_range_type: lookup(ENV_DAY_RANGE_TYPE)
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.day_range_type),
            start_hour: lookup(ENV_START_HOUR)
                .map(|v| parse_hour(ENV_START_HOUR, &v))
                .transpose()?
                .unwrap_or(defaults.start_hour),
            end_hour: lookup(ENV_END_HOUR)
                .map(|v| parse_hour(ENV_END_HOUR, &v))
                .transpose()?
                .unwrap_or(defaults.end_hour),
            units: lookup(ENV_UNITS)
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(defaults.units),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for hour in [self.start_hour, self.end_hour] {
            if hour > 24 {
                return Err(ConfigError::HourOutOfRange(hour));
            }
        }

        let calendar =
            self.mode == AggregationMode::Daily && self.day_range_type == DayRangeType::Calendar;
        if calendar && self.start_hour >= self.end_hour {
            return Err(ConfigError::EmptyHourWindow {
                start: self.start_hour,
                end: self.end_hour,
            });
        }

        Ok(())
    }

    /// Resolve mode and day range type into a concrete grouping
    pub fn grouping(&self) -> GroupingMode {
        match (self.mode, self.day_range_type) {
            (AggregationMode::Summary, _) => GroupingMode::Summary,
            (AggregationMode::Daily, DayRangeType::Rolling) => GroupingMode::Rolling24h,
            (AggregationMode::Daily, DayRangeType::Calendar) => GroupingMode::CalendarDay {
                start_hour: self.start_hour,
                end_hour: self.end_hour,
            },
        }
    }
}

fn parse_hour(name: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber {
            name: name.to_string(),
            value: value.to_string(),
        })
}

impl FromStr for AggregationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "daily" => Ok(Self::Daily),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl FromStr for DayRangeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rolling" | "rolling-24h" => Ok(Self::Rolling),
            "calendar" | "calendar-day" => Ok(Self::Calendar),
            _ => Err(ConfigError::InvalidDayRangeType(s.to_string())),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" | "english" => Ok(Self::Imperial),
            "metric" => Ok(Self::Metric),
            _ => Err(ConfigError::InvalidUnits(s.to_string())),
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Daily => write!(f, "daily"),
        }
    }
}
