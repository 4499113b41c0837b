//! Command-line interface for `otelagg`.
//!
//! A small debugging front end over the aggregation engine: inspect how a
//! value maps onto exponential buckets, or aggregate a batch of values and
//! print the resulting data point.

use crate::core::{init_logging, Config, ConfigBuilder, LogLevel, MetricsError, Result};
use crate::metrics::{
    AggregationTemporality, Aggregator, AttributeSet, ExponentialBucketHistogram, ExponentialHistogramDataPoint,
    ExponentialHistogramOptions, InstrumentKind, Mapping, SeriesStore,
};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Inspect and exercise OpenTelemetry metric aggregation
#[derive(Parser, Debug)]
#[command(name = "otelagg")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (overrides the config file, RUST_LOG overrides both)
    #[arg(long, global = true, env = "OTELAGG_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the bucket index and boundaries of each value at a scale
    Map {
        /// Mapping scale (-10..=20)
        #[arg(long, allow_negative_numbers = true)]
        scale: i32,

        /// Positive values to map
        #[arg(required = true)]
        values: Vec<f64>,
    },

    /// Aggregate values into a delta exponential histogram and print it as JSON
    Histogram {
        /// Maximum bucket count per sign
        #[arg(long)]
        max_size: Option<usize>,

        /// Starting (maximum) scale
        #[arg(long, allow_negative_numbers = true)]
        max_scale: Option<i32>,

        /// Magnitudes at or below this count as zero
        #[arg(long)]
        zero_threshold: Option<f64>,

        /// YAML configuration file
        #[arg(short, long, env = "OTELAGG_CONFIG")]
        config: Option<PathBuf>,

        /// Values to aggregate; read whitespace separated from stdin when absent
        #[arg(allow_negative_numbers = true)]
        values: Vec<f64>,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Run the parsed command.
pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Map { scale, values } => {
            start_logging(Config::default(), cli.log_level)?;
            for value in values {
                println!("{}", describe_mapping(scale, value)?);
            }
            Ok(())
        }
        Command::Histogram {
            max_size,
            max_scale,
            zero_threshold,
            config,
            values,
        } => {
            let config = load_config(config.as_ref(), max_size, max_scale, zero_threshold)?;
            start_logging(config.clone(), cli.log_level)?;

            let values = if values.is_empty() {
                let mut input = String::new();
                std::io::stdin().read_to_string(&mut input)?;
                parse_values(&input)?
            } else {
                values
            };

            let points = aggregate(&config, &values)?;
            println!("{}", serde_json::to_string_pretty(&points)?);
            Ok(())
        }
    }
}

fn start_logging(mut config: Config, level: Option<LogLevel>) -> Result<()> {
    if let Some(level) = level {
        config.logging.level = level;
    }
    init_logging(&config.logging)
}

/// Precedence: CLI flags, then the environment, then the config file, then defaults.
fn load_config(
    path: Option<&PathBuf>,
    max_size: Option<usize>,
    max_scale: Option<i32>,
    zero_threshold: Option<f64>,
) -> Result<Config> {
    let mut builder = ConfigBuilder::new();
    if let Some(path) = path {
        builder = builder
            .from_file(path)
            .map_err(|e| MetricsError::config(format!("Failed to load config file {:?}: {}", path, e)))?;
    }
    builder = builder.with_env_overrides();

    if let Some(size) = max_size {
        builder = builder.max_size(size);
    }
    if let Some(scale) = max_scale {
        builder = builder.max_scale(scale);
    }
    if let Some(threshold) = zero_threshold {
        builder = builder.zero_threshold(threshold);
    }
    builder.build()
}

/// Parse whitespace separated numbers.
pub fn parse_values(input: &str) -> Result<Vec<f64>> {
    input
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| MetricsError::config(format!("Invalid value '{}'", token)))
        })
        .collect()
}

/// One line of `otelagg map` output: `value -> index (lower, upper]`.
///
/// Subnormal inputs are flagged since they fall below their bucket's lower
/// boundary.
pub fn describe_mapping(scale: i32, value: f64) -> Result<String> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MetricsError::config(format!(
            "Can only map finite positive values, got {}",
            value
        )));
    }

    let mapping = Mapping::new(scale)?;
    let index = mapping.map_to_index(value);
    let lower = mapping.get_lower_boundary(index)?;
    // the top bucket's upper edge is past f64::MAX
    let upper = match mapping.get_lower_boundary(index + 1) {
        Ok(upper) => upper,
        Err(MetricsError::MappingOverflow { .. }) => f64::INFINITY,
        Err(e) => return Err(e),
    };

    let mut line = format!("{} -> {} ({}, {}]", value, index, lower, upper);
    if value < f64::MIN_POSITIVE {
        line.push_str(" subnormal, clamped to the lowest bucket");
    }
    Ok(line)
}

/// Aggregate `values` as one delta interval and collect it.
pub fn aggregate(config: &Config, values: &[f64]) -> Result<Vec<ExponentialHistogramDataPoint>> {
    let options = ExponentialHistogramOptions {
        aggregation_temporality: AggregationTemporality::Delta,
        ..ExponentialHistogramOptions::from_config(config, InstrumentKind::Histogram)
    };
    let mut histogram = ExponentialBucketHistogram::new(options)?;
    let mut store = SeriesStore::with_cardinality_limit(config.cardinality_limit);

    let start = now_ns();
    for &value in values {
        histogram.update(value, &AttributeSet::empty(), &mut store);
    }
    histogram.collect(start, now_ns(), &mut store)
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
