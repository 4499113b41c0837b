//! Circular counter array covering a contiguous span of bucket indices.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Bucket counts for one sign of an exponential histogram.
///
/// Logical index `i` in `[index_start, index_end]` lives at physical slot
/// `(i - index_base) mod counts.len()`. Extending the span downward only
/// moves `index_start`, so no data needs to shift until the array grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub(crate) index_start: i32,
    pub(crate) index_end: i32,
    pub(crate) index_base: i32,
    pub(crate) counts: Vec<u64>,
}

impl Default for Buckets {
    fn default() -> Self {
        Self::new()
    }
}

impl Buckets {
    /// Empty buckets: a single zero slot at index 0
    pub fn new() -> Self {
        Self {
            index_start: 0,
            index_end: 0,
            index_base: 0,
            counts: vec![0],
        }
    }

    pub fn index_start(&self) -> i32 {
        self.index_start
    }

    pub fn index_end(&self) -> i32 {
        self.index_end
    }

    pub fn index_base(&self) -> i32 {
        self.index_base
    }

    /// Index of the first bucket
    pub fn offset(&self) -> i32 {
        self.index_start
    }

    /// Number of logical buckets in use
    pub fn length(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.index_end as i64 - self.index_start as i64 + 1) as usize
        }
    }

    /// Size of the backing array
    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    /// True if no observation has been counted
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Sum of every bucket
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Count for logical `index`, 0 outside the populated span
    pub fn get_bucket(&self, index: i32) -> u64 {
        if index < self.index_start || index > self.index_end {
            return 0;
        }
        self.counts[self.physical_index(index)]
    }

    /// Backing array rotated so that element 0 is `index_start`
    pub fn counts(&self) -> Vec<u64> {
        let len = self.counts.len() as i64;
        let first = self.index_start as i64 - self.index_base as i64;
        (0..len)
            .map(|j| self.counts[(first + j).rem_euclid(len) as usize])
            .collect()
    }

    /// Logical `(index, count)` pairs across the populated span
    pub fn iter(&self) -> impl Iterator<Item = (i32, u64)> + '_ {
        let span = if self.is_empty() {
            0..0
        } else {
            self.index_start..self.index_end + 1
        };
        span.map(move |i| (i, self.counts[self.physical_index(i)]))
    }

    /// Physical slot holding logical `index`
    #[inline]
    pub fn physical_index(&self, index: i32) -> usize {
        let len = self.counts.len() as i64;
        (index as i64 - self.index_base as i64).rem_euclid(len) as usize
    }

    /// Add `delta` to the physical slot `physical_index`
    #[inline]
    pub fn increment_bucket(&mut self, physical_index: usize, delta: u64) {
        self.counts[physical_index] += delta;
    }

    /// Resize the backing array to hold at least `needed` buckets, capped at
    /// `max_size`. Entries are laid out in logical order from `index_start`.
    pub fn grow(&mut self, needed: usize, max_size: usize) {
        let old_len = self.counts.len();
        let new_len = needed.next_power_of_two().min(max_size);
        if new_len <= old_len {
            return;
        }

        let mut grown = self.counts();
        grown.resize(new_len, 0);
        self.counts = grown;
        self.index_base = self.index_start;

        tracing::debug!("Grew bucket array from {} to {} slots", old_len, new_len);
    }

    /// Merge every `2^by` adjacent buckets into one.
    ///
    /// The backing length is unchanged; totals are preserved.
    pub fn downscale(&mut self, by: u32) {
        if by == 0 || self.is_empty() {
            return;
        }

        let logical = self.counts();
        let span = self.length();
        let mut merged = vec![0u64; logical.len()];
        let first = self.index_start >> by;
        for (offset, &count) in logical.iter().take(span).enumerate() {
            let index = self.index_start + offset as i32;
            merged[((index >> by) - first) as usize] += count;
        }

        self.counts = merged;
        self.index_start >>= by;
        self.index_end >>= by;
        self.index_base = self.index_start;
    }

    /// Add `delta` at logical `index`, widening the span and growing the
    /// array as needed. Returns false without mutating if the resulting span
    /// would exceed `max_size`.
    pub(crate) fn increment_index(&mut self, index: i32, delta: u64, max_size: usize) -> bool {
        if self.is_empty() {
            self.index_start = index;
            self.index_end = index;
            self.index_base = index;
        } else if index < self.index_start {
            let span = (self.index_end as i64 - index as i64) as usize;
            if span >= max_size {
                return false;
            }
            if span >= self.counts.len() {
                self.grow(span + 1, max_size);
            }
            self.index_start = index;
        } else if index > self.index_end {
            let span = (index as i64 - self.index_start as i64) as usize;
            if span >= max_size {
                return false;
            }
            if span >= self.counts.len() {
                self.grow(span + 1, max_size);
            }
            self.index_end = index;
        }

        let physical = self.physical_index(index);
        self.increment_bucket(physical, delta);
        true
    }
}

// OTLP shape: offset plus counts from the first populated bucket
impl Serialize for Buckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Buckets", 2)?;
        state.serialize_field("offset", &self.offset())?;
        state.serialize_field("bucket_counts", &self.counts())?;
        state.end()
    }
}
