//! Sum aggregator for counters and up-down counters.

use crate::core::{Config, Result};
use crate::metrics::aggregator::{stamp_cumulative, Aggregator};
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data_points::NumberDataPoint;
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::{AggregationTemporality, InstrumentKind};

/// Construction options for [`Sum`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumOptions {
    pub aggregation_temporality: AggregationTemporality,
    /// Reject negative increments
    pub monotonic: bool,
}

impl Default for SumOptions {
    fn default() -> Self {
        Self {
            aggregation_temporality: AggregationTemporality::Cumulative,
            monotonic: false,
        }
    }
}

impl SumOptions {
    pub fn from_config(config: &Config, kind: InstrumentKind) -> Self {
        Self {
            aggregation_temporality: config.temporality_for(Some(kind), AggregationTemporality::Cumulative),
            monotonic: config.sum.monotonic,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sum {
    temporality: AggregationTemporality,
    monotonic: bool,
}

impl Sum {
    pub fn new(options: SumOptions) -> Self {
        Self {
            temporality: options.aggregation_temporality,
            monotonic: options.monotonic,
        }
    }

    pub fn is_monotonic(&self) -> bool {
        self.monotonic
    }
}

impl Default for Sum {
    fn default() -> Self {
        Self::new(SumOptions::default())
    }
}

impl Aggregator for Sum {
    type DataPoint = NumberDataPoint;

    fn update(&self, amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<NumberDataPoint>) {
        if amount.is_nan() {
            tracing::debug!("Dropping NaN increment for {}", attributes);
            return;
        }
        if self.monotonic && amount < 0.0 {
            tracing::debug!("Dropping negative increment {} on monotonic sum {}", amount, attributes);
            return;
        }

        let point = store.get_or_insert_with(attributes, |attrs| NumberDataPoint::new(attrs.clone(), 0.0));
        point.value += amount;
    }

    fn collect(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<NumberDataPoint>,
    ) -> Result<Vec<NumberDataPoint>> {
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
