//! Histogram with fixed, caller-supplied bucket boundaries.

use crate::core::{Config, MetricsError, Result};
use crate::metrics::aggregator::{stamp_cumulative, Aggregator};
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data_points::{fold_max, fold_min, HistogramDataPoint};
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::{AggregationTemporality, InstrumentKind};

/// Default bucket boundaries
pub const DEFAULT_BOUNDARIES: [f64; 10] = [0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 1000.0];

#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitHistogramOptions {
    pub aggregation_temporality: AggregationTemporality,
    pub boundaries: Vec<f64>,
    pub record_min_max: bool,
}

impl Default for ExplicitHistogramOptions {
    fn default() -> Self {
        Self {
            aggregation_temporality: AggregationTemporality::Delta,
            boundaries: DEFAULT_BOUNDARIES.to_vec(),
            record_min_max: true,
        }
    }
}

impl ExplicitHistogramOptions {
    pub fn from_config(config: &Config, kind: InstrumentKind) -> Self {
        Self {
            aggregation_temporality: config.temporality_for(Some(kind), AggregationTemporality::Delta),
            boundaries: config.explicit_histogram.boundaries.clone(),
            record_min_max: config.explicit_histogram.record_min_max,
        }
    }
}

/// Explicit-bucket histogram aggregator.
///
/// A value `v` lands in the first bucket whose upper boundary is `>= v`;
/// values above the last boundary go to the overflow bucket.
#[derive(Debug, Clone)]
pub struct ExplicitBucketHistogram {
    temporality: AggregationTemporality,
    boundaries: Vec<f64>,
    record_min_max: bool,
}

impl ExplicitBucketHistogram {
    /// Build from `options`. Boundaries are sorted; NaN is rejected.
    pub fn new(options: ExplicitHistogramOptions) -> Result<Self> {
        let mut boundaries = options.boundaries;
        if boundaries.iter().any(|b| b.is_nan()) {
            return Err(MetricsError::config("histogram boundaries must not contain NaN"));
        }
        boundaries.sort_by(f64::total_cmp);

        Ok(Self {
            temporality: options.aggregation_temporality,
            boundaries,
            record_min_max: options.record_min_max,
        })
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Bucket index for `amount`
    #[inline]
    pub fn bucket_index(&self, amount: f64) -> usize {
        self.boundaries.partition_point(|&b| b < amount)
    }
}

impl Aggregator for ExplicitBucketHistogram {
    type DataPoint = HistogramDataPoint;

    fn update(&self, amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<HistogramDataPoint>) {
        if amount.is_nan() {
            tracing::debug!("Dropping NaN measurement for {}", attributes);
            return;
        }

        let point =
            store.get_or_insert_with(attributes, |attrs| HistogramDataPoint::new(attrs.clone(), &self.boundaries));
        if self.record_min_max {
            point.min = fold_min(point.min, amount);
            point.max = fold_max(point.max, amount);
        }
        point.count += 1;
        point.sum += amount;
        point.bucket_counts[self.bucket_index(amount)] += 1;
    }

    fn collect(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<HistogramDataPoint>,
    ) -> Result<Vec<HistogramDataPoint>> {
        let points = match self.temporality {
            AggregationTemporality::Delta => store
                .drain()
                .map(|(_, mut point)| {
                    point.start_time_ns = start_time_ns;
                    point.time_ns = end_time_ns;
                    point
                })
                .collect(),
            AggregationTemporality::Cumulative => store
                .snapshot_mut()
                .map(|(first, point)| {
                    stamp_cumulative(
                        &mut point.start_time_ns,
                        &mut point.time_ns,
                        first,
                        start_time_ns,
                        end_time_ns,
                    );
                    point.clone()
                })
                .collect(),
        };
        Ok(points)
    }

    fn aggregation_temporality(&self) -> AggregationTemporality {
        self.temporality
    }
}
