//! Base-2 exponential histogram: IEEE754 helpers, index mappings, circular
//! buckets and the aggregator built on them.

pub mod buckets;
pub mod histogram;
pub mod ieee754;
pub mod mapping;

pub use buckets::Buckets;
pub use histogram::{
    ExponentialBucketHistogram, ExponentialHistogramOptions, DEFAULT_SCALE, DEFAULT_SIZE, MAX_MAX_SIZE,
    MIN_MAX_SIZE,
};
pub use mapping::{ExponentMapping, LogarithmMapping, Mapping, MAX_SCALE, MIN_SCALE};
