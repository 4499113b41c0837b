//! Common contract for all aggregators.
//!
//! An aggregator holds configuration (and, for the exponential histogram,
//! cumulative running totals); per-series interval state lives in a
//! [`SeriesStore`] handed in by the caller. Neither is internally
//! synchronised: callers serialise `update` and `collect` on a stream, or
//! wrap both in a [`SharedAggregator`].

use crate::core::Result;
use crate::metrics::attributes::AttributeSet;
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::AggregationTemporality;
use parking_lot::Mutex;

/// Stateful per-series accumulator
pub trait Aggregator {
    /// Data point kept per series and returned from `collect`
    type DataPoint: Clone;

    /// Fold one measurement into the series identified by `attributes`.
    ///
    /// Never fails for numeric input; values an aggregator cannot represent
    /// are dropped.
    fn update(&self, amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<Self::DataPoint>);

    /// Produce stamped data points for the interval `[start_time_ns, end_time_ns]`.
    ///
    /// Delta aggregators drain `store`; cumulative ones keep reporting
    /// previously seen totals.
    fn collect(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<Self::DataPoint>,
    ) -> Result<Vec<Self::DataPoint>>;

    fn aggregation_temporality(&self) -> AggregationTemporality;
}

/// An aggregator bundled with its store behind one lock
pub struct SharedAggregator<A: Aggregator> {
    inner: Mutex<(A, SeriesStore<A::DataPoint>)>,
}

impl<A: Aggregator> SharedAggregator<A> {
    pub fn new(aggregator: A) -> Self {
        Self::with_store(aggregator, SeriesStore::new())
    }

    pub fn with_store(aggregator: A, store: SeriesStore<A::DataPoint>) -> Self {
        Self {
            inner: Mutex::new((aggregator, store)),
        }
    }

    #[inline]
    pub fn update(&self, amount: f64, attributes: &AttributeSet) {
        let mut guard = self.inner.lock();
        let (aggregator, store) = &mut *guard;
        aggregator.update(amount, attributes, store);
    }

    pub fn collect(&self, start_time_ns: u64, end_time_ns: u64) -> Result<Vec<A::DataPoint>> {
        let mut guard = self.inner.lock();
        let (aggregator, store) = &mut *guard;
        aggregator.collect(start_time_ns, end_time_ns, store)
    }

    pub fn aggregation_temporality(&self) -> AggregationTemporality {
        self.inner.lock().0.aggregation_temporality()
    }

    /// Number of series buffered since the last collect
    pub fn series_count(&self) -> usize {
        self.inner.lock().1.len()
    }
}

/// Stamp a snapshot for cumulative reporting: start on the series' first
/// snapshot, end every time
#[inline]
pub(crate) fn stamp_cumulative(start_slot: &mut u64, time_slot: &mut u64, first: bool, start: u64, end: u64) {
    if first {
        *start_slot = start;
    }
    *time_slot = end;
}
