use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use snow_tracker::config::{AggregationConfig, AggregationMode, DayRangeType, UnitSystem};
use snow_tracker::services::formatting::{write_records, OutputFormat};
use snow_tracker::services::pipeline_service::load_batch;
use snow_tracker::services::SnowPipeline;

#[derive(Parser)]
#[command(name = "snow-tracker")]
#[command(about = "Clean snow-depth series and summarize station observations", long_about = None)]
struct Cli {
    /// Batch file: {"stations": [...], "observations": [...]}
    #[arg(long)]
    input: PathBuf,

    /// Aggregation mode: 'summary' (one record per station) or 'daily'
    #[arg(long, env = "SNOW_AGGREGATION_MODE", default_value = "daily")]
    mode: AggregationMode,

    /// Day boundaries in daily mode: 'rolling' (24h from first observation) or 'calendar'
    #[arg(long, env = "SNOW_DAY_RANGE_TYPE", default_value = "rolling")]
    day_range_type: DayRangeType,

    /// First hour kept in calendar mode (inclusive)
    #[arg(long, env = "SNOW_START_HOUR", default_value = "0")]
    start_hour: u32,

    /// Last hour kept in calendar mode (exclusive)
    #[arg(long, env = "SNOW_END_HOUR", default_value = "24")]
    end_hour: u32,

    /// Output units: 'imperial' or 'metric'
    #[arg(long, env = "SNOW_UNITS", default_value = "imperial")]
    units: UnitSystem,

    /// Output format: 'json' or 'csv'
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    // Logs go to stderr, stdout is reserved for records
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,snow_tracker=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();

    let config = AggregationConfig {
        mode: cli.mode,
        day_range_type: cli.day_range_type,
        start_hour: cli.start_hour,
        end_hour: cli.end_hour,
        units: cli.units,
    };
    info!("Starting snow tracker with config: {:?}", config);

    let pipeline = SnowPipeline::new(config)?;
    let batch = load_batch(&cli.input)?;
    let output = pipeline.run_batch(batch)?;

    for failure in &output.failures {
        warn!(
            "Group {} starting {} skipped: {}",
            failure.period.station_id, failure.period.start, failure.error
        );
    }

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    write_records(&output.records, cli.format, writer)?;

    info!("Wrote {} records", output.records.len());
    Ok(())
}
