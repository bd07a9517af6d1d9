pub mod aggregation_service;
pub mod formatting;
pub mod pipeline_service;

pub use aggregation_service::{FilteredSeries, StationAggregator, AGGREGATION_RULES};
pub use formatting::{converter_for, Imperial, Metric, Quantity, UnitConverter};
pub use pipeline_service::{BatchInput, GroupFailure, PipelineOutput, SnowPipeline};
