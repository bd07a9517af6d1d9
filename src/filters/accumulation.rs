//! New-snow accumulation from a filtered depth series
//!
//! Only positive changes count as new snow: settling, melt and board resets
//! never subtract from the running total.
use serde::Serialize;

use crate::models::SnowDepthSample;

/// What a sample's depth is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Last non-missing depth. A run of masked samples is bridged, so a gap is
    /// never read as the depth dropping to zero.
    #[default]
    LastValid,
    /// The literal previous index, with a missing value counted as 0. Kept for
    /// comparison against historically produced totals; it over-counts after
    /// every gap.
    PreviousIndex,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulation {
    /// New snow attributed to each sample (0 for missing samples)
    pub new_snow: Vec<f64>,
    /// Running sum of `new_snow`
    pub cumulative: Vec<f64>,
    pub valid_samples: usize,
}

impl Accumulation {
    /// Final cumulative total, `None` when the series had no valid depth at all
    pub fn total(&self) -> Option<f64> {
        if self.valid_samples == 0 {
            return None;
        }
        self.cumulative.last().copied()
    }
}

/// Compute per-sample new snow and its running total.
///
/// The first valid sample contributes nothing since it has no predecessor.
pub fn accumulate(samples: &[SnowDepthSample], mode: ReferenceMode) -> Accumulation {
    let mut new_snow = Vec::with_capacity(samples.len());
    let mut cumulative = Vec::with_capacity(samples.len());
    let mut running_total = 0.0;
    let mut last_valid: Option<f64> = None;
    let mut valid_samples = 0;

    for (i, sample) in samples.iter().enumerate() {
        let reference = match mode {
            ReferenceMode::LastValid => last_valid,
            ReferenceMode::PreviousIndex if i == 0 => None,
            ReferenceMode::PreviousIndex => Some(samples[i - 1].depth.unwrap_or(0.0)),
        };

        let added = match (sample.depth, reference) {
            (Some(depth), Some(previous)) => (depth - previous).max(0.0),
            _ => 0.0,
        };

        if let Some(depth) = sample.depth {
            last_valid = Some(depth);
            valid_samples += 1;
        }

        running_total += added;
        new_snow.push(added);
        cumulative.push(running_total);
    }

    Accumulation {
        new_snow,
        cumulative,
        valid_samples,
    }
}
