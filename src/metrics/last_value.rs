//! Last-value aggregator for gauges.

use crate::core::Result;
use crate::metrics::aggregator::Aggregator;
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data_points::NumberDataPoint;
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::AggregationTemporality;

/// Keeps the most recent value per series; always delta
#[derive(Debug, Clone, Default)]
pub struct LastValue;

impl LastValue {
    pub fn new() -> Self {
        Self
    }
}

impl Aggregator for LastValue {
    type DataPoint = NumberDataPoint;

    fn update(&self, amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<NumberDataPoint>) {
        if amount.is_nan() {
            tracing::debug!("Dropping NaN gauge value for {}", attributes);
            return;
        }
        let point = store.get_or_insert_with(attributes, |attrs| NumberDataPoint::new(attrs.clone(), amount));
        point.value = amount;
    }

    fn collect(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<NumberDataPoint>,
    ) -> Result<Vec<NumberDataPoint>> {
        Ok(store
            .drain()
            .map(|(_, mut point)| {
                point.start_time_ns = start_time_ns;
                point.time_ns = end_time_ns;
                point
            })
            .collect())
    }

    fn aggregation_temporality(&self) -> AggregationTemporality {
        AggregationTemporality::Delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_value_wins() {
        let mut agg = LastValue::new();
        let mut store = SeriesStore::new();
        let attrs = AttributeSet::new([("host", "a")]);

        agg.update(1.0, &attrs, &mut store);
        agg.update(-7.5, &attrs, &mut store);
        agg.update(3.25, &attrs, &mut store);

        let points = agg.collect(5, 6, &mut store).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 3.25);
        assert_eq!(points[0].attributes, attrs);
        assert_eq!((points[0].start_time_ns, points[0].time_ns), (5, 6));
        assert!(store.is_empty());
    }

    #[test]
    fn test_infinity_is_accepted() {
        let agg = LastValue::new();
        let mut store = SeriesStore::new();
        agg.update(f64::INFINITY, &AttributeSet::empty(), &mut store);
        agg.update(f64::NAN, &AttributeSet::empty(), &mut store);
        assert_eq!(store.get(&AttributeSet::empty()).unwrap().value, f64::INFINITY);
    }
}
