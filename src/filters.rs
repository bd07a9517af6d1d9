// Snow-depth series processing
//
// - outlier_filter: masks sensor artifacts (bare-ground readings, spikes, sudden drops)
// - accumulation: derives cumulative new snow from a filtered series

pub mod accumulation;
pub mod outlier_filter;

pub use accumulation::{accumulate, Accumulation, ReferenceMode};
pub use outlier_filter::{
    classify, filter_snow_depth, FilterPreset, OutlierFilterParams, Verdict,
    BOARD_24H_PARAMS, TOTAL_DEPTH_PARAMS,
};
