//! Common test utilities and fixtures.

#![allow(dead_code)]

use otel_metrics_sdk::metrics::{
    Aggregator, AggregationTemporality, AttributeSet, ExponentialBucketHistogram, ExponentialHistogramOptions,
    Mapping, SeriesStore,
};

/// Measurements shared by the interval scenarios.
pub const TEST_VALUES: [f64; 8] = [2.0, 4.0, 1.0, 1.0, 8.0, 0.5, 0.1, 0.045];

/// Exponential histogram with an explicit temporality, size and scale.
pub fn exp_histogram(temporality: AggregationTemporality, max_size: usize, max_scale: i32) -> ExponentialBucketHistogram {
    ExponentialBucketHistogram::new(ExponentialHistogramOptions {
        aggregation_temporality: temporality,
        max_size,
        max_scale,
        ..Default::default()
    })
    .unwrap()
}

/// Record `values` against the empty attribute set.
pub fn record<A: Aggregator>(aggregator: &A, store: &mut SeriesStore<A::DataPoint>, values: &[f64]) {
    for &value in values {
        aggregator.update(value, &AttributeSet::empty(), store);
    }
}

/// Midpoint of bucket `index`.
pub fn center_value(mapping: &Mapping, index: i32) -> f64 {
    (mapping.get_lower_boundary(index).unwrap() + mapping.get_lower_boundary(index + 1).unwrap()) / 2.0
}

/// Expand `(count, repeat)` runs into a flat count vector.
pub fn runs(runs: &[(u64, usize)]) -> Vec<u64> {
    runs.iter()
        .flat_map(|&(count, repeat)| std::iter::repeat(count).take(repeat))
        .collect()
}

/// Assert two floats agree to a relative tolerance.
macro_rules! assert_close {
    ($left:expr, $right:expr) => {
        assert_close!($left, $right, 1e-10)
    };
    ($left:expr, $right:expr, $eps:expr) => {{
        let (left, right): (f64, f64) = ($left, $right);
        let scale = left.abs().max(right.abs()).max(1.0);
        assert!(
            (left - right).abs() <= $eps * scale,
            "{} is not within {} of {}",
            left,
            $eps,
            right
        );
    }};
}
