use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::config::AggregationConfig;
use crate::error::{GroupError, PipelineError};
use crate::grouping::{group_observations, Period};
use crate::models::{AggregatedRecord, Observation, RawObservation, StationMetadata};
use crate::services::aggregation_service::{FilteredSeries, StationAggregator};
use crate::services::formatting::{converter_for, UnitConverter};

/// Input file layout for the batch entry point
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInput {
    pub stations: Vec<StationMetadata>,
    #[serde(default)]
    pub observations: Vec<RawObservation>,
}

/// A group that was skipped, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub period: Period,
    pub error: GroupError,
}

/// Result of one batch: every group that could be aggregated, plus the ones
/// that could not. Partial results are valid output.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub records: Vec<AggregatedRecord>,
    pub failures: Vec<GroupFailure>,
}

/// Batch transform from observations to summary records.
///
/// Holds no state between runs: the same input always yields the same output,
/// so overlapping ranges can be reprocessed and upserted safely.
pub struct SnowPipeline {
    config: AggregationConfig,
    aggregator: StationAggregator,
    converter: Box<dyn UnitConverter>,
}

impl SnowPipeline {
    pub fn new(config: AggregationConfig) -> Result<Self, PipelineError> {
        let converter = converter_for(config.units);
        Self::with_converter(config, converter)
    }

    /// Use caller-supplied conversion tables instead of the built-in ones
    pub fn with_converter(
        config: AggregationConfig,
        converter: Box<dyn UnitConverter>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            aggregator: StationAggregator::default(),
            converter,
        })
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    #[instrument(
        skip_all,
        fields(
            observations = observations.len(),
            stations = stations.len(),
            mode = %self.config.mode
        )
    )]
    pub fn run(
        &self,
        observations: &[Observation],
        stations: &[StationMetadata],
    ) -> Result<PipelineOutput, PipelineError> {
        if stations.is_empty() {
            return Err(PipelineError::NoStations);
        }

        let metadata: HashMap<&str, &StationMetadata> = stations
            .iter()
            .map(|s| (s.station_id.as_str(), s))
            .collect();

        let groups = group_observations(observations, self.config.grouping());
        let mut output = PipelineOutput::default();

        for (period, readings) in &groups {
            match self.aggregate_group(&metadata, period, readings) {
                Ok(record) => output.records.push(record),
                Err(error) => {
                    warn!(
                        "Skipping group {} starting {}: {}",
                        period.station_id, period.start, error
                    );
                    output.failures.push(GroupFailure {
                        period: period.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "Aggregated {} groups ({} skipped) from {} observations",
            output.records.len(),
            output.failures.len(),
            observations.len()
        );

        Ok(output)
    }

    /// Coerce raw ingestion records, then run the batch
    pub fn run_raw(
        &self,
        raw: Vec<RawObservation>,
        stations: &[StationMetadata],
    ) -> Result<PipelineOutput, PipelineError> {
        let received = raw.len();
        let observations: Vec<Observation> =
            raw.into_iter().filter_map(Observation::from_raw).collect();

        if observations.len() < received {
            warn!(
                "Dropped {} of {} observations with unreadable timestamps",
                received - observations.len(),
                received
            );
        }

        self.run(&observations, stations)
    }

    pub fn run_batch(&self, batch: BatchInput) -> Result<PipelineOutput, PipelineError> {
        self.run_raw(batch.observations, &batch.stations)
    }

    /// Cleaned depth series and new-snow accumulation for every group
    pub fn filtered_series(
        &self,
        observations: &[Observation],
    ) -> BTreeMap<Period, FilteredSeries> {
        group_observations(observations, self.config.grouping())
            .into_iter()
            .map(|(period, readings)| {
                let series = StationAggregator::filtered_series(&readings);
                (period, series)
            })
            .collect()
    }

    fn aggregate_group(
        &self,
        metadata: &HashMap<&str, &StationMetadata>,
        period: &Period,
        readings: &[Observation],
    ) -> Result<AggregatedRecord, GroupError> {
        let station = metadata
            .get(period.station_id.as_str())
            .ok_or_else(|| GroupError::UnknownStation(period.station_id.clone()))?;

        if readings.is_empty() {
            return Err(GroupError::EmptyGroup(period.station_id.clone()));
        }

        debug!(
            "Aggregating {} observations for {} ({} to {})",
            readings.len(),
            period.station_id,
            period.start,
            period.end
        );

        Ok(self
            .aggregator
            .aggregate(station, period, readings, self.converter.as_ref()))
    }
}

/// Read a batch file: `{ "stations": [...], "observations": [...] }`
pub fn load_batch(path: &Path) -> Result<BatchInput, PipelineError> {
    let text = fs::read_to_string(path)?;
    let batch: BatchInput = serde_json::from_str(&text)?;
    debug!(
        "Loaded {} stations and {} observations from {}",
        batch.stations.len(),
        batch.observations.len(),
        path.display()
    );
    Ok(batch)
}
