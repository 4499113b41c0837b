//! Base-2 exponential bucket histogram aggregator.
//!
//! Each series starts at `max_scale` and downscales whenever a new value
//! would push either bucket set beyond `max_size` buckets. In cumulative mode
//! the per-interval points from the caller's store are merged into running
//! totals owned by the aggregator.

use super::buckets::Buckets;
use super::mapping::{Mapping, MAX_SCALE, MIN_SCALE};
use crate::core::{Config, MetricsError, Result};
use crate::metrics::aggregator::Aggregator;
use crate::metrics::attributes::AttributeSet;
use crate::metrics::data_points::{fold_max, fold_min, ExponentialHistogramDataPoint};
use crate::metrics::store::SeriesStore;
use crate::metrics::temporality::{AggregationTemporality, InstrumentKind};
use tracing::{debug, error};

/// Default bucket count per sign
pub const DEFAULT_SIZE: usize = 160;
/// Default starting scale
pub const DEFAULT_SCALE: i32 = MAX_SCALE;
pub const MIN_MAX_SIZE: usize = 2;
pub const MAX_MAX_SIZE: usize = 16384;

/// Construction options for [`ExponentialBucketHistogram`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialHistogramOptions {
    pub aggregation_temporality: AggregationTemporality,
    pub max_size: usize,
    pub max_scale: i32,
    pub record_min_max: bool,
    pub zero_threshold: f64,
}

impl Default for ExponentialHistogramOptions {
    fn default() -> Self {
        Self {
            aggregation_temporality: AggregationTemporality::Delta,
            max_size: DEFAULT_SIZE,
            max_scale: DEFAULT_SCALE,
            record_min_max: true,
            zero_threshold: 0.0,
        }
    }
}

impl ExponentialHistogramOptions {
    /// Options from `config` for an instrument of `kind`
    pub fn from_config(config: &Config, kind: InstrumentKind) -> Self {
        let section = &config.exponential_histogram;
        Self {
            aggregation_temporality: config.temporality_for(Some(kind), AggregationTemporality::Delta),
            max_size: section.max_size,
            max_scale: section.max_scale,
            record_min_max: section.record_min_max,
            zero_threshold: section.zero_threshold,
        }
    }
}

/// Exponential histogram aggregator
#[derive(Debug, Clone)]
pub struct ExponentialBucketHistogram {
    temporality: AggregationTemporality,
    max_size: usize,
    max_scale: i32,
    record_min_max: bool,
    zero_threshold: f64,
    running_totals: SeriesStore<ExponentialHistogramDataPoint>,
}

impl ExponentialBucketHistogram {
    /// Validate `options` and build the aggregator
    pub fn new(options: ExponentialHistogramOptions) -> Result<Self> {
        validate_max_size(options.max_size)?;
        validate_scale(options.max_scale)?;
        if !options.zero_threshold.is_finite() || options.zero_threshold < 0.0 {
            return Err(MetricsError::config(format!(
                "zero_threshold must be a finite non-negative number, got {}",
                options.zero_threshold
            )));
        }

        Ok(Self {
            temporality: options.aggregation_temporality,
            max_size: options.max_size,
            max_scale: options.max_scale,
            record_min_max: options.record_min_max,
            zero_threshold: options.zero_threshold,
            running_totals: SeriesStore::unbounded(),
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_scale(&self) -> i32 {
        self.max_scale
    }

    pub fn zero_threshold(&self) -> f64 {
        self.zero_threshold
    }

    /// Cumulative totals reported so far, in first-seen order
    pub fn running_totals(&self) -> &SeriesStore<ExponentialHistogramDataPoint> {
        &self.running_totals
    }

    fn record_scalars(&self, point: &mut ExponentialHistogramDataPoint, amount: f64) {
        if self.record_min_max {
            point.min = fold_min(point.min, amount);
            point.max = fold_max(point.max, amount);
        }
        point.count += 1;
        point.sum += amount;
    }

    fn collect_delta(
        &self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<ExponentialHistogramDataPoint>,
    ) -> Vec<ExponentialHistogramDataPoint> {
        store
            .drain()
            .map(|(_, mut point)| {
                point.start_time_ns = start_time_ns;
                point.time_ns = end_time_ns;
                point
            })
            .collect()
    }

    fn collect_cumulative(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<ExponentialHistogramDataPoint>,
    ) -> Result<Vec<ExponentialHistogramDataPoint>> {
        let max_size = self.max_size;
        for (attributes, mut current) in store.drain() {
            if let Some(previous) = self.running_totals.get_mut(&attributes) {
                merge_into(previous, &current, max_size)?;
            } else {
                current.start_time_ns = start_time_ns;
                self.running_totals.get_or_insert_with(&attributes, |_| current);
            }
        }

        Ok(self
            .running_totals
            .iter_mut()
            .map(|(_, point)| {
                point.time_ns = end_time_ns;
                point.clone()
            })
            .collect())
    }
}

impl Aggregator for ExponentialBucketHistogram {
    type DataPoint = ExponentialHistogramDataPoint;

    fn update(&self, amount: f64, attributes: &AttributeSet, store: &mut SeriesStore<Self::DataPoint>) {
        if !amount.is_finite() {
            debug!("Dropping non-finite measurement {} for {}", amount, attributes);
            return;
        }

        let point = store.get_or_insert_with(attributes, |attrs| {
            ExponentialHistogramDataPoint::new(attrs.clone(), self.max_scale, self.zero_threshold)
        });

        let magnitude = amount.abs();
        if magnitude <= self.zero_threshold {
            self.record_scalars(point, amount);
            point.zero_count += 1;
            // nothing but zeros so far: no buckets pin the scale
            if point.count == point.zero_count {
                point.scale = 0;
            }
            return;
        }

        if point.has_no_buckets() {
            point.scale = self.max_scale;
        }

        let mapping = match Mapping::new(point.scale) {
            Ok(mapping) => mapping,
            Err(e) => {
                error!("Series {} holds an unusable scale: {}", attributes, e);
                return;
            },
        };
        let mut index = mapping.map_to_index(magnitude);

        let buckets = if amount > 0.0 { &point.positive } else { &point.negative };
        let change = rescale_for(buckets, index, self.max_size);
        if change > 0 {
            let new_scale = point.scale - change as i32;
            if new_scale < MIN_SCALE {
                error!(
                    "Dropping {}: rescale of {} by {} would leave the minimum scale {}",
                    amount, attributes, change, MIN_SCALE
                );
                return;
            }
            let mapping = match Mapping::new(new_scale) {
                Ok(mapping) => mapping,
                Err(e) => {
                    error!("Rescale of {} failed: {}", attributes, e);
                    return;
                },
            };
            debug!("Rescaling {} from scale {} to {}", attributes, point.scale, new_scale);
            point.positive.downscale(change);
            point.negative.downscale(change);
            point.scale = new_scale;
            index = mapping.map_to_index(magnitude);
        }

        let buckets = if amount > 0.0 { &mut point.positive } else { &mut point.negative };
        if !buckets.increment_index(index, 1, self.max_size) {
            error!(
                "Bucket index {} does not fit {} buckets at scale {} for {}",
                index, self.max_size, point.scale, attributes
            );
            return;
        }
        self.record_scalars(point, amount);
    }

    fn collect(
        &mut self,
        start_time_ns: u64,
        end_time_ns: u64,
        store: &mut SeriesStore<Self::DataPoint>,
    ) -> Result<Vec<Self::DataPoint>> {
        match self.temporality {
            AggregationTemporality::Delta => Ok(self.collect_delta(start_time_ns, end_time_ns, store)),
            AggregationTemporality::Cumulative => self.collect_cumulative(start_time_ns, end_time_ns, store),
        }
    }

    fn aggregation_temporality(&self) -> AggregationTemporality {
        self.temporality
    }
}

fn validate_max_size(size: usize) -> Result<()> {
    if !(MIN_MAX_SIZE..=MAX_MAX_SIZE).contains(&size) {
        return Err(MetricsError::InvalidMaxSize {
            size,
            min: MIN_MAX_SIZE,
            max: MAX_MAX_SIZE,
        });
    }
    Ok(())
}

fn validate_scale(scale: i32) -> Result<()> {
    if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        return Err(MetricsError::InvalidScale {
            scale,
            min: MIN_SCALE,
            max: MAX_SCALE,
        });
    }
    Ok(())
}

/// Number of halvings needed before `[low, high]` spans fewer than
/// `max_size` buckets
pub(crate) fn scale_change(mut low: i64, mut high: i64, max_size: usize) -> u32 {
    let mut change = 0;
    while high - low >= max_size as i64 {
        high >>= 1;
        low >>= 1;
        change += 1;
    }
    change
}

/// Scale reduction needed for `buckets` to also cover `index`
fn rescale_for(buckets: &Buckets, index: i32, max_size: usize) -> u32 {
    if buckets.is_empty() {
        return 0;
    }
    let (low, high) = if index < buckets.index_start {
        (index, buckets.index_end)
    } else if index > buckets.index_end {
        (buckets.index_start, index)
    } else {
        return 0;
    };
    scale_change(low as i64, high as i64, max_size)
}

/// Combined `[low, high]` of non-empty bucket sets, each shifted down by its
/// own amount
fn aligned_range(sides: [(&Buckets, u32); 2]) -> Option<(i64, i64)> {
    sides
        .into_iter()
        .filter(|(buckets, _)| !buckets.is_empty())
        .map(|(buckets, shift)| {
            (
                (buckets.index_start >> shift) as i64,
                (buckets.index_end >> shift) as i64,
            )
        })
        .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)))
}

/// Fold `current` into the running total `previous`
fn merge_into(
    previous: &mut ExponentialHistogramDataPoint,
    current: &ExponentialHistogramDataPoint,
    max_size: usize,
) -> Result<()> {
    if !current.has_no_buckets() {
        if previous.has_no_buckets() {
            previous.scale = current.scale;
            previous.positive = current.positive.clone();
            previous.negative = current.negative.clone();
        } else {
            merge_buckets(previous, current, max_size)?;
        }
    }

    previous.count += current.count;
    previous.sum += current.sum;
    previous.zero_count += current.zero_count;
    if let Some(min) = current.min {
        previous.min = fold_min(previous.min, min);
    }
    if let Some(max) = current.max {
        previous.max = fold_max(previous.max, max);
    }
    Ok(())
}

fn merge_buckets(
    previous: &mut ExponentialHistogramDataPoint,
    current: &ExponentialHistogramDataPoint,
    max_size: usize,
) -> Result<()> {
    let mut min_scale = previous.scale.min(current.scale);
    let prev_shift = (previous.scale - min_scale) as u32;
    let cur_shift = (current.scale - min_scale) as u32;

    let change = [
        aligned_range([(&previous.positive, prev_shift), (&current.positive, cur_shift)]),
        aligned_range([(&previous.negative, prev_shift), (&current.negative, cur_shift)]),
    ]
    .into_iter()
    .flatten()
    .map(|(low, high)| scale_change(low, high, max_size))
    .max()
    .unwrap_or(0);

    min_scale -= change as i32;
    if min_scale < MIN_SCALE {
        return Err(MetricsError::merge_scale(format!(
            "merging scale {} into {} needs scale {}, below {}",
            current.scale, previous.scale, min_scale, MIN_SCALE
        )));
    }

    let prev_shift = (previous.scale - min_scale) as u32;
    let cur_shift = (current.scale - min_scale) as u32;
    if prev_shift > 0 {
        debug!("Downscaling running total from scale {} to {}", previous.scale, min_scale);
    }
    previous.positive.downscale(prev_shift);
    previous.negative.downscale(prev_shift);
    previous.scale = min_scale;

    for (target, source) in [
        (&mut previous.positive, &current.positive),
        (&mut previous.negative, &current.negative),
    ] {
        for (index, count) in source.iter().filter(|&(_, count)| count > 0) {
            let index = index >> cur_shift;
            if !target.increment_index(index, count, max_size) {
                return Err(MetricsError::merge_scale(format!(
                    "bucket {} does not fit {} buckets at scale {}",
                    index, max_size, min_scale
                )));
            }
        }
    }
    Ok(())
}
