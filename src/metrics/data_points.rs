//! Data point shapes produced by collection.
//!
//! Field names follow the OTLP metrics protobuf schema so an encoder can map
//! them one to one. Timestamps are nanoseconds since the Unix epoch and
//! stay `0` until the point is collected.

use crate::metrics::attributes::AttributeSet;
use crate::metrics::exponential::Buckets;
use serde::Serialize;

/// A sampled raw measurement kept alongside an aggregate.
///
/// Reservoirs live outside the aggregation engine; points only carry what
/// they were handed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exemplar {
    pub value: f64,
    pub time_ns: u64,
    pub filtered_attributes: AttributeSet,
    pub span_id: Option<[u8; 8]>,
    pub trace_id: Option<[u8; 16]>,
}

/// Sum / gauge style data point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberDataPoint {
    pub attributes: AttributeSet,
    pub start_time_ns: u64,
    pub time_ns: u64,
    pub value: f64,
    pub exemplars: Option<Vec<Exemplar>>,
    pub flags: u32,
}

impl NumberDataPoint {
    /// Unstamped point for `attributes` holding `value`
    pub fn new(attributes: AttributeSet, value: f64) -> Self {
        Self {
            attributes,
            start_time_ns: 0,
            time_ns: 0,
            value,
            exemplars: None,
            flags: 0,
        }
    }
}

/// Explicit-bucket histogram data point.
///
/// `bucket_counts.len() == explicit_bounds.len() + 1` and the counts sum
/// to `count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramDataPoint {
    pub attributes: AttributeSet,
    pub start_time_ns: u64,
    pub time_ns: u64,
    pub count: u64,
    pub sum: f64,
    pub bucket_counts: Vec<u64>,
    pub explicit_bounds: Vec<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub exemplars: Option<Vec<Exemplar>>,
    pub flags: u32,
}

impl HistogramDataPoint {
    /// Empty point over `bounds`
    pub fn new(attributes: AttributeSet, bounds: &[f64]) -> Self {
        Self {
            attributes,
            start_time_ns: 0,
            time_ns: 0,
            count: 0,
            sum: 0.0,
            bucket_counts: vec![0; bounds.len() + 1],
            explicit_bounds: bounds.to_vec(),
            min: None,
            max: None,
            exemplars: None,
            flags: 0,
        }
    }
}

/// Base-2 exponential histogram data point.
///
/// `count == zero_count + positive.total() + negative.total()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExponentialHistogramDataPoint {
    pub attributes: AttributeSet,
    pub start_time_ns: u64,
    pub time_ns: u64,
    pub count: u64,
    pub sum: f64,
    pub scale: i32,
    pub zero_count: u64,
    pub positive: Buckets,
    pub negative: Buckets,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub zero_threshold: f64,
    pub exemplars: Option<Vec<Exemplar>>,
    pub flags: u32,
}

impl ExponentialHistogramDataPoint {
    /// Empty point at `scale`
    pub fn new(attributes: AttributeSet, scale: i32, zero_threshold: f64) -> Self {
        Self {
            attributes,
            start_time_ns: 0,
            time_ns: 0,
            count: 0,
            sum: 0.0,
            scale,
            zero_count: 0,
            positive: Buckets::new(),
            negative: Buckets::new(),
            min: None,
            max: None,
            zero_threshold,
            exemplars: None,
            flags: 0,
        }
    }

    /// True if neither bucket set holds any observation
    pub fn has_no_buckets(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Fold `value` into an optional running minimum
pub(crate) fn fold_min(current: Option<f64>, value: f64) -> Option<f64> {
    Some(match current {
        Some(m) if m <= value => m,
        _ => value,
    })
}

/// Fold `value` into an optional running maximum
pub(crate) fn fold_max(current: Option<f64>, value: f64) -> Option<f64> {
    Some(match current {
        Some(m) if m >= value => m,
        _ => value,
    })
}
