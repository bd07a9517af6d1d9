// Behavioral properties of the snow-depth outlier filter and accumulation

mod common;

use common::hourly_samples;
use snow_tracker::filters::{
    accumulate, classify, filter_snow_depth, OutlierFilterParams, ReferenceMode, Verdict,
    BOARD_24H_PARAMS, TOTAL_DEPTH_PARAMS,
};
use snow_tracker::models::SnowDepthSample;

const START: &str = "2024-11-15T00:00:00-07:00";

fn depths(samples: &[SnowDepthSample]) -> Vec<Option<f64>> {
    samples.iter().map(|s| s.depth).collect()
}

/// Early-season noise, season onset, a spike, a drop, a gap
fn season_onset() -> Vec<SnowDepthSample> {
    hourly_samples(
        START,
        &[
            Some(0.0),
            Some(0.5),
            Some(0.0),
            Some(12.0),
            Some(13.0),
            Some(13.5),
            Some(30.0),
            Some(14.0),
            Some(14.0),
            Some(1.0),
            Some(14.5),
            None,
            Some(15.0),
        ],
    )
}

#[test]
fn test_season_onset_sequence() {
    let filtered = filter_snow_depth(&season_onset(), &TOTAL_DEPTH_PARAMS);
    let mut expected = vec![None; 7];
    expected.extend([Some(14.0), Some(14.0), None, Some(14.5), None, Some(15.0)]);
    assert_eq!(depths(&filtered), expected);
}

#[test]
fn test_filter_preserves_length_and_timestamps() {
    let samples = season_onset();
    let filtered = filter_snow_depth(&samples, &TOTAL_DEPTH_PARAMS);
    assert_eq!(filtered.len(), samples.len());
    for (before, after) in samples.iter().zip(&filtered) {
        assert_eq!(before.timestamp, after.timestamp);
        // Either masked or untouched, never adjusted
        assert!(after.depth.is_none() || after.depth == before.depth);
    }
}

#[test]
fn test_filter_is_idempotent_on_onset_sequences() {
    for (samples, params) in [
        (season_onset(), TOTAL_DEPTH_PARAMS),
        (season_onset(), BOARD_24H_PARAMS),
        (
            hourly_samples(
                START,
                &[Some(0.0), Some(2.0), Some(9.0), Some(3.0), Some(0.0), Some(1.5)],
            ),
            BOARD_24H_PARAMS,
        ),
    ] {
        let once = filter_snow_depth(&samples, &params);
        let twice = filter_snow_depth(&once, &params);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_early_season_latch_depends_on_masked_history() {
    // The sample that opens the gate is below the threshold on its own. The
    // first pass averages it with the masked 10.9s; once those are absent the
    // average is 10.0 and the gate opens one sample later.
    let mut raw = vec![Some(0.0)];
    raw.extend([Some(10.9); 11]);
    raw.extend([Some(10.0), Some(10.2)]);
    let samples = hourly_samples(START, &raw);

    let once = filter_snow_depth(&samples, &TOTAL_DEPTH_PARAMS);
    let mut expected = vec![None; 12];
    expected.extend([Some(10.0), Some(10.2)]);
    assert_eq!(depths(&once), expected);

    let twice = filter_snow_depth(&once, &TOTAL_DEPTH_PARAMS);
    let mut expected = vec![None; 13];
    expected.push(Some(10.2));
    assert_eq!(depths(&twice), expected);
}

#[test]
fn test_spike_rejected_relative_to_last_valid() {
    let params = OutlierFilterParams {
        early_season_filter: false,
        ..TOTAL_DEPTH_PARAMS
    };
    let samples = hourly_samples(
        START,
        &[Some(5.0), Some(5.0), Some(5.0), Some(20.0), Some(6.0), Some(6.0)],
    );
    let filtered = filter_snow_depth(&samples, &params);
    assert_eq!(
        depths(&filtered),
        vec![Some(5.0), Some(5.0), Some(5.0), None, Some(6.0), Some(6.0)]
    );
}

#[test]
fn test_bare_ground_is_masked_before_season() {
    let samples = hourly_samples(START, &[Some(0.0); 48]);
    let verdicts = classify(&samples, &TOTAL_DEPTH_PARAMS);
    assert!(verdicts.iter().all(|v| *v == Verdict::EarlySeason));
}

#[test]
fn test_board_is_not_early_season_gated() {
    let samples = hourly_samples(START, &[Some(0.0), Some(0.5), Some(1.0)]);
    let filtered = filter_snow_depth(&samples, &BOARD_24H_PARAMS);
    assert_eq!(depths(&filtered), vec![Some(0.0), Some(0.5), Some(1.0)]);
}

#[test]
fn test_board_reset_counts_only_new_snow() {
    // Overnight storm, board cleared at 07:00, more snow after
    let samples = hourly_samples(
        START,
        &[
            Some(0.0),
            Some(1.5),
            Some(3.0),
            Some(4.0),
            Some(0.2),
            Some(0.8),
            Some(2.0),
        ],
    );
    let filtered = filter_snow_depth(&samples, &BOARD_24H_PARAMS);
    let acc = accumulate(&filtered, ReferenceMode::LastValid);
    assert!((acc.total().unwrap() - 5.8).abs() < 1e-9);
}

#[test]
fn test_accumulation_reference_variants_differ_on_gaps() {
    let filtered = filter_snow_depth(
        &hourly_samples(START, &[Some(2.0), Some(2.5), Some(9.0), Some(3.0)]),
        &BOARD_24H_PARAMS,
    );
    // 9.0 is masked as a spike
    assert_eq!(depths(&filtered), vec![Some(2.0), Some(2.5), None, Some(3.0)]);

    let last_valid = accumulate(&filtered, ReferenceMode::LastValid);
    let previous_index = accumulate(&filtered, ReferenceMode::PreviousIndex);
    assert!((last_valid.total().unwrap() - 1.0).abs() < 1e-9);
    // The masked sample reads as 0, so 3.0 is counted as fresh snow
    assert!((previous_index.total().unwrap() - 3.5).abs() < 1e-9);
}

#[test]
fn test_accumulation_monotonic() {
    let filtered = filter_snow_depth(&season_onset(), &BOARD_24H_PARAMS);
    let acc = accumulate(&filtered, ReferenceMode::LastValid);
    assert_eq!(acc.cumulative.len(), filtered.len());
    assert!(acc.cumulative.windows(2).all(|w| w[1] >= w[0]));
    assert!(acc.new_snow.iter().all(|v| *v >= 0.0));
}
