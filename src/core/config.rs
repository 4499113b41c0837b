//! Configuration for the aggregation engine.
//!
//! This module provides:
//! - YAML file support
//! - A single read of the temporality-preference environment variable
//! - Validation and defaults matching the aggregator constructors

use crate::core::{MetricsError, Result};
use crate::metrics::exponential::{DEFAULT_SCALE, DEFAULT_SIZE, MAX_MAX_SIZE, MAX_SCALE, MIN_MAX_SIZE, MIN_SCALE};
use crate::metrics::explicit_histogram::DEFAULT_BOUNDARIES;
use crate::metrics::store::DEFAULT_CARDINALITY_LIMIT;
use crate::metrics::temporality::{
    AggregationTemporality, InstrumentKind, TemporalityPreference, TEMPORALITY_PREFERENCE_ENV,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Temporality preference; `None` leaves each aggregator on its default
    pub temporality_preference: Option<TemporalityPreference>,
    /// Maximum distinct series per aggregator before overflow
    pub cardinality_limit: usize,
    /// Exponential histogram settings
    pub exponential_histogram: ExponentialHistogramConfig,
    /// Explicit-bucket histogram settings
    pub explicit_histogram: ExplicitHistogramConfig,
    /// Sum settings
    pub sum: SumConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExponentialHistogramConfig {
    pub max_size: usize,
    pub max_scale: i32,
    pub record_min_max: bool,
    pub zero_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitHistogramConfig {
    pub boundaries: Vec<f64>,
    pub record_min_max: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SumConfig {
    pub monotonic: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets, thread ids and line numbers
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            temporality_preference: None,
            cardinality_limit: DEFAULT_CARDINALITY_LIMIT,
            exponential_histogram: ExponentialHistogramConfig::default(),
            explicit_histogram: ExplicitHistogramConfig::default(),
            sum: SumConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExponentialHistogramConfig {
    fn default() -> Self {
        ExponentialHistogramConfig {
            max_size: DEFAULT_SIZE,
            max_scale: DEFAULT_SCALE,
            record_min_max: true,
            zero_threshold: 0.0,
        }
    }
}

impl Default for ExplicitHistogramConfig {
    fn default() -> Self {
        ExplicitHistogramConfig {
            boundaries: DEFAULT_BOUNDARIES.to_vec(),
            record_min_max: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let exp = &self.exponential_histogram;
        if !(MIN_MAX_SIZE..=MAX_MAX_SIZE).contains(&exp.max_size) {
            return Err(MetricsError::InvalidMaxSize {
                size: exp.max_size,
                min: MIN_MAX_SIZE,
                max: MAX_MAX_SIZE,
            });
        }

        if !(MIN_SCALE..=MAX_SCALE).contains(&exp.max_scale) {
            return Err(MetricsError::InvalidScale {
                scale: exp.max_scale,
                min: MIN_SCALE,
                max: MAX_SCALE,
            });
        }

        if !exp.zero_threshold.is_finite() || exp.zero_threshold < 0.0 {
            return Err(MetricsError::config(format!(
                "zero_threshold must be a finite non-negative number, got {}",
                exp.zero_threshold
            )));
        }

        if self.explicit_histogram.boundaries.iter().any(|b| b.is_nan()) {
            return Err(MetricsError::config("histogram boundaries must not contain NaN"));
        }

        if self.cardinality_limit == 0 {
            return Err(MetricsError::config("cardinality_limit must be greater than 0"));
        }

        Ok(())
    }

    /// Resolve the temporality for an instrument of `kind`, falling back to
    /// `default` when no preference is configured
    pub fn temporality_for(
        &self,
        kind: Option<InstrumentKind>,
        default: AggregationTemporality,
    ) -> AggregationTemporality {
        match self.temporality_preference {
            Some(preference) => preference.resolve(kind),
            None => default,
        }
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(MetricsError::config(format!("Unknown log level '{}'", other))),
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| MetricsError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        self.from_yaml(&contents)
    }

    /// Apply `OTEL_EXPORTER_OTLP_METRICS_TEMPORALITY_PREFERENCE` if set.
    ///
    /// This is the only place the environment is consulted.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(TEMPORALITY_PREFERENCE_ENV) {
            Ok(value) => self.temporality_preference_str(&value),
            Err(_) => self,
        }
    }

    /// Set the temporality preference from its textual form.
    ///
    /// Unknown values keep the current setting.
    pub fn temporality_preference_str(mut self, value: &str) -> Self {
        match value.parse::<TemporalityPreference>() {
            Ok(preference) => self.config.temporality_preference = Some(preference),
            Err(e) => tracing::warn!("Ignoring {}: {}", TEMPORALITY_PREFERENCE_ENV, e),
        }
        self
    }

    /// Set temporality preference
    pub fn temporality_preference(mut self, preference: TemporalityPreference) -> Self {
        self.config.temporality_preference = Some(preference);
        self
    }

    /// Set exponential histogram bucket count
    pub fn max_size(mut self, size: usize) -> Self {
        self.config.exponential_histogram.max_size = size;
        self
    }

    /// Set exponential histogram starting scale
    pub fn max_scale(mut self, scale: i32) -> Self {
        self.config.exponential_histogram.max_scale = scale;
        self
    }

    pub fn zero_threshold(mut self, threshold: f64) -> Self {
        self.config.exponential_histogram.zero_threshold = threshold;
        self
    }

    /// Record min/max on both histogram kinds
    pub fn record_min_max(mut self, enable: bool) -> Self {
        self.config.exponential_histogram.record_min_max = enable;
        self.config.explicit_histogram.record_min_max = enable;
        self
    }

    /// Set explicit histogram boundaries
    pub fn boundaries(mut self, boundaries: Vec<f64>) -> Self {
        self.config.explicit_histogram.boundaries = boundaries;
        self
    }

    pub fn monotonic_sum(mut self, monotonic: bool) -> Self {
        self.config.sum.monotonic = monotonic;
        self
    }

    /// Set cardinality limit
    pub fn cardinality_limit(mut self, limit: usize) -> Self {
        self.config.cardinality_limit = limit;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
