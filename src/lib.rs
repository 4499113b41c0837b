//! OpenTelemetry metric aggregation engine.
//!
//! Folds individual measurements into per-series data points and hands them
//! out at collection time, as deltas or as running totals.
//!
//! # Features
//!
//! - **Base-2 exponential histograms**: auto-scaling buckets with a bounded
//!   bucket count, merged across intervals for cumulative export
//! - **Explicit-bucket histograms, sums, last value and drop** aggregators
//!   behind one [`metrics::Aggregator`] trait
//! - **Temporality resolution** from `OTEL_EXPORTER_OTLP_METRICS_TEMPORALITY_PREFERENCE`
//! - **Cardinality limits** with an overflow series
//!
//! # Architecture
//!
//! - `core`: errors, configuration and logging setup
//! - `metrics`: attribute sets, data points and the aggregators
//! - `cli`: the `otelagg` debugging tool
//!
//! # Example
//!
//! ```
//! use otel_metrics_sdk::metrics::{
//!     Aggregator, AttributeSet, ExponentialBucketHistogram, ExponentialHistogramOptions, SeriesStore,
//! };
//!
//! let mut histogram = ExponentialBucketHistogram::new(ExponentialHistogramOptions::default()).unwrap();
//! let mut store = SeriesStore::new();
//! histogram.update(1.5, &AttributeSet::new([("route", "/")]), &mut store);
//!
//! let points = histogram.collect(0, 1_000, &mut store).unwrap();
//! assert_eq!(points[0].count, 1);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod metrics;

// Re-export core types for convenience
pub use crate::core::{Config, MetricsError, Result};
