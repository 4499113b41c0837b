//! OpenTelemetry metric aggregation.
//!
//! Aggregators fold measurements into per-series data points held in a
//! [`SeriesStore`] and hand them out on `collect`, either as deltas or as
//! running totals depending on [`AggregationTemporality`].

pub mod aggregator;
pub mod attributes;
pub mod data_points;
pub mod drop;
pub mod explicit_histogram;
pub mod exponential;
pub mod last_value;
pub mod store;
pub mod sum;
pub mod temporality;

pub use aggregator::{Aggregator, SharedAggregator};
pub use attributes::{AttributeSet, AttributeValue};
pub use data_points::{Exemplar, ExponentialHistogramDataPoint, HistogramDataPoint, NumberDataPoint};
pub use drop::DropAggregator;
pub use explicit_histogram::{ExplicitBucketHistogram, ExplicitHistogramOptions, DEFAULT_BOUNDARIES};
pub use exponential::{Buckets, ExponentialBucketHistogram, ExponentialHistogramOptions, Mapping};
pub use last_value::LastValue;
pub use store::{overflow_attributes, SeriesStore, DEFAULT_CARDINALITY_LIMIT, OVERFLOW_ATTRIBUTE_KEY};
pub use sum::{Sum, SumOptions};
pub use temporality::{resolve_temporality, AggregationTemporality, InstrumentKind, TemporalityPreference};
