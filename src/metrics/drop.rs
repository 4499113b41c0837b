//! Aggregator that discards every measurement.
//!
//! Series identity is still tracked so a view that drops a stream keeps
//! reporting which attribute sets were seen, each with value 0.

use crate::core::Result;
use crate::metrics::aggregator::Aggregator;
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data_points::NumberDataPoint;
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::AggregationTemporality;

#[derive(Debug, Clone, Default)]
pub struct DropAggregator;

impl DropAggregator {
    pub fn new() -> Self {
        Self
    }
}

impl Aggregator for DropAggregator {
    type DataPoint = NumberDataPoint;

    fn update(&self, _amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<NumberDataPoint>) {
        let point = store.get_or_insert_with(attributes, |attrs| NumberDataPoint::new(attrs.clone(), 0.0));
        point.value = 0.0;
    }

    fn collect(
        &mut self,
        _start_time_ns: u64,
        _end_time_ns: u64,
        store: &mut SeriesStore<NumberDataPoint>,
    ) -> Result<Vec<NumberDataPoint>> {
        Ok(store.drain().map(|(_, point)| point).collect())
    }

    fn aggregation_temporality(&self) -> AggregationTemporality {
        AggregationTemporality::Delta
    }
}
