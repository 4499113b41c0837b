//! Exponential histogram scenarios across collection intervals.

#[macro_use]
mod common;

use common::{center_value, exp_histogram, record, runs, TEST_VALUES};
use otel_metrics_sdk::metrics::{
    Aggregator, AggregationTemporality, AttributeSet, ExponentialBucketHistogram, ExponentialHistogramOptions,
    Mapping, SeriesStore,
};
use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn cumulative_default() -> ExponentialBucketHistogram {
    ExponentialBucketHistogram::new(ExponentialHistogramOptions {
        aggregation_temporality: AggregationTemporality::Cumulative,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_collect_results_cumulative() {
    let mut h = cumulative_default();
    let mut store = SeriesStore::new();
    assert_eq!(h.max_scale(), 20);

    record(&h, &mut store, &[2.0]);
    assert_eq!(store.get(&AttributeSet::empty()).unwrap().scale, 20);
    record(&h, &mut store, &[4.0]);
    assert_eq!(store.get(&AttributeSet::empty()).unwrap().scale, 7);
    record(&h, &mut store, &[1.0]);
    assert_eq!(store.get(&AttributeSet::empty()).unwrap().scale, 6);

    let collection0 = h.collect(100, 200, &mut store).unwrap();
    assert_eq!(collection0.len(), 1);
    let result0 = &collection0[0];
    assert_eq!(result0.positive.counts().len(), 160);
    assert_eq!(result0.count, 3);
    assert_eq!(result0.sum, 7.0);
    assert_eq!(result0.scale, 6);
    assert_eq!(result0.zero_count, 0);
    assert_eq!(result0.positive.counts(), runs(&[(1, 1), (0, 63), (1, 1), (0, 63), (1, 1), (0, 31)]));
    assert_eq!(result0.flags, 0);
    assert_eq!(result0.min, Some(1.0));
    assert_eq!(result0.max, Some(4.0));

    record(&h, &mut store, &[1.0, 8.0, 0.5, 0.1, 0.045]);
    let collection1 = h.collect(200, 300, &mut store).unwrap();
    let result1 = &collection1[0];
    assert_eq!(result1.count, 8);
    assert_close!(result1.sum, 16.645, 1e-9);
    assert_eq!(result1.scale, 4);
    assert_eq!(result1.zero_count, 0);
    assert_eq!(result1.positive.offset(), -72);
    assert_eq!(
        result1.positive.counts(),
        runs(&[
            (1, 1),
            (0, 17),
            (1, 1),
            (0, 36),
            (1, 1),
            (0, 15),
            (2, 1),
            (0, 15),
            (1, 1),
            (0, 15),
            (1, 1),
            (0, 15),
            (1, 1),
            (0, 40),
        ])
    );
    assert_eq!(result1.flags, 0);
    assert_eq!(result1.min, Some(0.045));
    assert_eq!(result1.max, Some(8.0));
    assert_eq!((result1.start_time_ns, result1.time_ns), (100, 300));
}

#[test]
fn test_repeated_value_accumulates_one_bucket() {
    let mut h = cumulative_default();
    let mut store = SeriesStore::new();

    let mut collected = Vec::new();
    for round in 0..3u64 {
        record(&h, &mut store, &[2.0]);
        collected = h.collect(round, round + 1, &mut store).unwrap();
    }

    let point = &collected[0];
    assert_eq!(point.count, 3);
    assert_eq!(point.scale, 20);
    assert_eq!(point.positive.length(), 1);
    assert_eq!(point.positive.total(), 3);
}

#[test]
fn test_synchronous_delta_temporality() {
    let mut h = exp_histogram(AggregationTemporality::Delta, 20, 5);
    let mut store = SeriesStore::new();

    for (i, &value) in TEST_VALUES.iter().enumerate() {
        record(&h, &mut store, &[value]);
        let start = i as u64 * 10;
        let points = h.collect(start, start + 10, &mut store).unwrap();
        assert_eq!(points.len(), 1);

        let point = &points[0];
        assert_eq!(point.positive.counts(), vec![1]);
        assert_eq!(point.negative.counts(), vec![0]);
        assert!(point.start_time_ns < point.time_ns);
        assert_eq!(point.min, Some(value));
        assert_eq!(point.max, Some(value));
        assert_close!(point.sum, value);
    }

    for _ in 0..10 {
        assert!(h.collect(100, 110, &mut store).unwrap().is_empty());
    }

    record(&h, &mut store, &[1.0]);
    let first = h.collect(110, 120, &mut store).unwrap();
    let idle = h.collect(120, 130, &mut store).unwrap();
    record(&h, &mut store, &[2.0]);
    let second = h.collect(130, 140, &mut store).unwrap();

    assert_eq!(first.len(), 1);
    assert!(idle.is_empty());
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].count, 1);
    assert_eq!(second[0].start_time_ns, 130);
}

#[test]
fn test_synchronous_cumulative_temporality() {
    let mut h = exp_histogram(AggregationTemporality::Cumulative, 20, 5);
    let mut store = SeriesStore::new();

    for _ in 0..10 {
        assert!(h.collect(0, 1, &mut store).unwrap().is_empty());
    }

    let mut results = Vec::new();
    for (i, &value) in TEST_VALUES.iter().enumerate() {
        record(&h, &mut store, &[value]);
        let start = 10 + i as u64 * 10;
        results.push(h.collect(start, start + 10, &mut store).unwrap());
    }

    let first = &results[0][0];
    assert!(first.start_time_ns < first.time_ns);
    assert_eq!(first.min, Some(TEST_VALUES[0]));
    assert_eq!(first.max, Some(TEST_VALUES[0]));
    assert_eq!(first.sum, TEST_VALUES[0]);

    for (i, points) in results.iter().enumerate().skip(1) {
        let point = &points[0];
        let seen = &TEST_VALUES[..=i];
        assert_eq!(point.start_time_ns, first.start_time_ns);
        assert_eq!(point.min, seen.iter().copied().reduce(f64::min));
        assert_eq!(point.max, seen.iter().copied().reduce(f64::max));
        assert_close!(point.sum, seen.iter().sum::<f64>());
        assert_eq!(point.count, seen.len() as u64);
        assert_eq!(point.negative.counts(), vec![0]);
    }

    let last = results[TEST_VALUES.len() - 1][0].clone();
    for round in 0..10u64 {
        let points = h.collect(100 + round, 101 + round, &mut store).unwrap();
        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.start_time_ns, last.start_time_ns);
        assert_eq!(point.min, last.min);
        assert_eq!(point.max, last.max);
        assert_close!(point.sum, last.sum);
        assert_eq!(point.positive, last.positive);
        assert_eq!(point.negative.counts(), vec![0]);
        assert_eq!(point.time_ns, 101 + round);
    }
}

#[test]
fn test_permutations_settle_on_same_buckets() {
    // (values, scale, offset, counts at offset and offset + 1)
    let cases: [([f64; 3], i32, i32, u64, u64); 3] = [
        ([0.5, 1.0, 2.0], -1, -1, 2, 1),
        ([1.0, 2.0, 4.0], -1, -1, 1, 2),
        ([0.25, 0.5, 1.0], -1, -2, 1, 2),
    ];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

    for (values, scale, offset, at_zero, at_one) in cases {
        for order in orders {
            let mut h = exp_histogram(AggregationTemporality::Delta, 2, 20);
            let mut store = SeriesStore::new();
            for i in order {
                h.update(values[i], &AttributeSet::empty(), &mut store);
            }

            let points = h.collect(0, 1, &mut store).unwrap();
            let point = &points[0];
            assert_eq!(point.scale, scale, "order {:?} of {:?}", order, values);
            assert_eq!(point.positive.offset(), offset);
            assert_eq!(point.positive.length(), 2);
            assert_eq!(point.positive.counts()[0], at_zero);
            assert_eq!(point.positive.counts()[1], at_one);
        }
    }
}

fn ascending_sequence(max_size: usize, offset: i32, init_scale: i32) {
    for step in max_size..max_size * 4 {
        let h = exp_histogram(AggregationTemporality::Delta, max_size, init_scale);
        let mut store = SeriesStore::new();
        let mapping = Mapping::new(init_scale).unwrap();

        let min_val = center_value(&mapping, offset);
        let max_val = center_value(&mapping, offset + step as i32);

        let mut sum = 0.0;
        for i in 0..max_size {
            let value = center_value(&mapping, offset + i as i32);
            h.update(value, &AttributeSet::empty(), &mut store);
            sum += value;
        }

        {
            let point = store.get(&AttributeSet::empty()).unwrap();
            assert_eq!(point.scale, init_scale);
            assert_eq!(point.positive.offset(), offset);
        }

        h.update(max_val, &AttributeSet::empty(), &mut store);
        sum += max_val;

        let point = store.get(&AttributeSet::empty()).unwrap();
        let counts = point.positive.counts();
        assert_ne!(counts[0], 0);

        let max_fill = counts.iter().rposition(|&c| c != 0).unwrap();
        assert!(max_fill >= max_size / 2);
        assert!(counts.iter().sum::<u64>() <= max_size as u64 + 1);
        assert!(point.count <= max_size as u64 + 1);
        assert!(point.sum <= sum);

        let mapping = Mapping::new(point.scale).unwrap();
        assert_eq!(mapping.map_to_index(min_val), point.positive.offset());
        assert_eq!(
            mapping.map_to_index(max_val),
            point.positive.offset() + point.positive.length() as i32 - 1
        );
    }
}

#[test]
fn test_ascending_sequence() {
    for max_size in [3, 4, 6, 9] {
        for offset in -5..=5 {
            for init_scale in [0, 4] {
                ascending_sequence(max_size, offset, init_scale);
            }
        }
    }
}

#[test]
fn test_move_store_between_aggregators() {
    let mut h0 = exp_histogram(AggregationTemporality::Delta, 256, 20);
    let mut h1 = exp_histogram(AggregationTemporality::Delta, 256, 20);
    let mut store0 = SeriesStore::new();
    let mut store1 = SeriesStore::new();

    let mut expect = 0.0;
    for i in 2..=256 {
        expect += i as f64;
        h0.update(i as f64, &AttributeSet::empty(), &mut store0);
        h0.update(0.0, &AttributeSet::empty(), &mut store0);
    }

    std::mem::swap(&mut store0, &mut store1);

    assert!(h0.collect(0, 1, &mut store0).unwrap().is_empty());
    let points = h1.collect(0, 1, &mut store1).unwrap();
    let point = &points[0];
    assert_eq!(point.sum, expect);
    assert_eq!(point.count, 255 * 2);
    assert_eq!(point.zero_count, 255);

    let scale = point.scale;
    assert_eq!(scale, 5);
    assert_eq!(point.positive.length(), (256 - ((1 << scale) - 1)) as usize);
    assert_eq!(point.positive.offset(), (1 << scale) - 1);
    assert!(point.positive.counts().iter().all(|&c| c <= 6));
}

#[test]
fn test_random_measurements_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..50 {
        let max_size = rng.gen_range(2..64);
        let max_scale = rng.gen_range(-2..=20);
        let h = exp_histogram(AggregationTemporality::Delta, max_size, max_scale);
        let mut store = SeriesStore::new();

        let mut recorded = 0u64;
        for _ in 0..200 {
            let value = if rng.gen_bool(0.05) {
                0.0
            } else {
                let magnitude = 2f64.powf(rng.gen_range(-40.0..40.0));
                if rng.gen_bool(0.5) { magnitude } else { -magnitude }
            };
            h.update(value, &AttributeSet::empty(), &mut store);
            recorded += 1;

            let point = store.get(&AttributeSet::empty()).unwrap();
            assert!(point.positive.length() <= max_size);
            assert!(point.negative.length() <= max_size);
            // zero-only series report scale 0
            assert!((-10..=max_scale.max(0)).contains(&point.scale));
        }

        let point = store.get(&AttributeSet::empty()).unwrap();
        assert_eq!(point.count, recorded);
        assert_eq!(
            point.count,
            point.positive.total() + point.negative.total() + point.zero_count
        );
        assert!(point.min.unwrap() <= point.max.unwrap());
    }
}

#[test]
fn test_exponent_mapping_contains_random_values() {
    let mut rng = StdRng::seed_from_u64(42);

    for scale in -10..=0 {
        let mapping = Mapping::new(scale).unwrap();
        for _ in 0..500 {
            let value = 2f64.powf(rng.gen_range(-1000.0..1000.0)) * rng.gen_range(1.0..2.0);
            let index = mapping.map_to_index(value);
            let lower = mapping.get_lower_boundary(index).unwrap();
            let upper = mapping.get_lower_boundary(index + 1).unwrap_or(f64::INFINITY);
            assert!(lower < value && value <= upper, "{} not in ({}, {}] at scale {}", value, lower, upper, scale);
        }
    }
}

#[test]
fn test_logarithm_mapping_contains_random_values() {
    let mut rng = StdRng::seed_from_u64(7);

    for scale in 1..=20 {
        let mapping = Mapping::new(scale).unwrap();
        for _ in 0..1000 {
            let value = 2f64.powf(rng.gen_range(-1000.0..1000.0)) * rng.gen_range(1.0..2.0);
            let index = mapping.map_to_index(value);
            let lower = mapping.get_lower_boundary(index).unwrap();
            let upper = mapping.get_lower_boundary(index + 1).unwrap_or(f64::INFINITY);
            assert!(lower < value && value <= upper, "{} not in ({}, {}] at scale {}", value, lower, upper, scale);
        }
    }
}
