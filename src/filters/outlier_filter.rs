//! Outlier filter for ultrasonic snow-depth series
//!
//! An overhead ranging sensor reports plenty of readings that are not snow:
//! bare ground before the season starts, echoes off animals or blowing snow,
//! ice build-up on the transducer, and board resets. The filter walks a
//! time-ordered series once and marks such samples as "no value". Accepted
//! samples are passed through untouched; nothing is smoothed.
//!
//! Two gates are applied in order:
//! 1. Early season: while the trailing rolling average of the raw series has
//!    never exceeded `threshold`, every sample is rejected. Once the average
//!    crosses the threshold the gate stays open for the rest of the series.
//! 2. Rate of change: the candidate is compared with the last *accepted* value
//!    (not the previous index). Rises above `max_positive_change` or drops
//!    beyond `max_negative_change` are rejected and do not move the reference.
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

use crate::models::SnowDepthSample;

/// Tuning for one sensor type. Only the named presets are used in production.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlierFilterParams {
    /// Rolling average (inches) that marks the start of the snow season
    pub threshold: f64,
    /// Largest accepted rise from the last valid value (inches per sample)
    pub max_positive_change: f64,
    /// Largest accepted drop from the last valid value (inches per sample)
    pub max_negative_change: f64,
    /// Number of trailing samples in the rolling average
    pub window_size: usize,
    pub early_season_filter: bool,
}

/// Total snow depth: never reset, so large drops are sensor faults
pub const TOTAL_DEPTH_PARAMS: OutlierFilterParams = OutlierFilterParams {
    threshold: 10.0,
    max_positive_change: 3.0,
    max_negative_change: 10.0,
    window_size: 12,
    early_season_filter: true,
};

/// 24h snow board: cleared by hand every morning, so big drops are legitimate
/// and the board reads near zero all season long.
pub const BOARD_24H_PARAMS: OutlierFilterParams = OutlierFilterParams {
    threshold: 10.0,
    max_positive_change: 3.0,
    max_negative_change: 36.0,
    window_size: 12,
    early_season_filter: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    TotalDepth,
    Board24h,
}

impl FilterPreset {
    pub const fn params(self) -> OutlierFilterParams {
        match self {
            FilterPreset::TotalDepth => TOTAL_DEPTH_PARAMS,
            FilterPreset::Board24h => BOARD_24H_PARAMS,
        }
    }
}

/// Why a sample was kept or masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    /// No reading in the input
    Absent,
    EarlySeason,
    RisingTooFast,
    FallingTooFast,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Accumulator threaded through the fold over one series.
///
/// Nothing outlives a single call, so each station/period is filtered
/// independently of every other.
#[derive(Debug)]
struct FilterState {
    window: VecDeque<Option<f64>>,
    window_size: usize,
    season_started: bool,
    last_valid: Option<f64>,
}

impl FilterState {
    fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            season_started: false,
            last_valid: None,
        }
    }

    /// Mean of the present values in the window, 0 when there are none
    fn rolling_average(&self) -> f64 {
        let (sum, count) = self
            .window
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    fn advance(mut self, depth: Option<f64>, params: &OutlierFilterParams) -> (Self, Verdict) {
        self.window.push_back(depth);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }

        let Some(value) = depth else {
            return (self, Verdict::Absent);
        };

        if params.early_season_filter && !self.season_started {
            if self.rolling_average() > params.threshold {
                self.season_started = true;
            } else {
                return (self, Verdict::EarlySeason);
            }
        }

        // First accepted sample has no predecessor: change is 0
        let change = self.last_valid.map_or(0.0, |previous| value - previous);

        let verdict = if change > params.max_positive_change {
            Verdict::RisingTooFast
        } else if change < -params.max_negative_change {
            Verdict::FallingTooFast
        } else {
            self.last_valid = Some(value);
            Verdict::Accepted
        };

        (self, verdict)
    }
}

/// Classify every sample of an ascending series.
///
/// The returned vector has the same length as `samples`.
pub fn classify(samples: &[SnowDepthSample], params: &OutlierFilterParams) -> Vec<Verdict> {
    let initial = (
        FilterState::new(params.window_size),
        Vec::with_capacity(samples.len()),
    );

    let (_, verdicts) = samples
        .iter()
        .fold(initial, |(state, mut verdicts), sample| {
            let (state, verdict) = state.advance(sample.depth, params);
            verdicts.push(verdict);
            (state, verdicts)
        });

    verdicts
}

/// Mask invalid samples of an ascending series.
///
/// Length and timestamps are preserved; accepted depths are returned unchanged
/// and everything else becomes `None`.
pub fn filter_snow_depth(
    samples: &[SnowDepthSample],
    params: &OutlierFilterParams,
) -> Vec<SnowDepthSample> {
    let verdicts = classify(samples, params);

    let filtered: Vec<SnowDepthSample> = samples
        .iter()
        .zip(&verdicts)
        .map(|(sample, verdict)| SnowDepthSample {
            timestamp: sample.timestamp,
            depth: sample.depth.filter(|_| verdict.is_accepted()),
        })
        .collect();

    let masked = verdicts
        .iter()
        .filter(|v| !matches!(v, Verdict::Accepted | Verdict::Absent))
        .count();
    if masked > 0 {
        debug!(
            "Masked {} of {} snow depth samples (early season: {}, rising: {}, falling: {})",
            masked,
            samples.len(),
            count(&verdicts, Verdict::EarlySeason),
            count(&verdicts, Verdict::RisingTooFast),
            count(&verdicts, Verdict::FallingTooFast),
        );
    }

    filtered
}

fn count(verdicts: &[Verdict], kind: Verdict) -> usize {
    verdicts.iter().filter(|v| **v == kind).count()
}
