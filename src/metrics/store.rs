//! Per-aggregator series storage.
//!
//! `SeriesStore` is an insertion-ordered arena of per-series records
//! addressed by [`AttributeSet`]. Collection drains or snapshots the arena in
//! the order series were first seen, which keeps exported data points stable
//! across collection cycles.

use crate::metrics::attributes::{AttributeSet, AttributeValue};
use ahash::AHashMap;

/// Default maximum number of distinct series per store
pub const DEFAULT_CARDINALITY_LIMIT: usize = 2000;

/// Attribute key marking the overflow series
pub const OVERFLOW_ATTRIBUTE_KEY: &str = "otel.metric.overflow";

/// The attribute set that absorbs measurements beyond the cardinality limit
pub fn overflow_attributes() -> AttributeSet {
    AttributeSet::new([(OVERFLOW_ATTRIBUTE_KEY, AttributeValue::Bool(true))])
}

/// Mapping from attribute set to per-series state, owned by one aggregator
#[derive(Debug, Clone)]
pub struct SeriesStore<P> {
    index: AHashMap<AttributeSet, usize>,
    entries: Vec<(AttributeSet, P)>,
    cardinality_limit: usize,
    overflowed: bool,
    /// Entries before this position have already been snapshotted
    snapshotted: usize,
}

impl<P> Default for SeriesStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> SeriesStore<P> {
    /// Create a store with the default cardinality limit
    pub fn new() -> Self {
        Self::with_cardinality_limit(DEFAULT_CARDINALITY_LIMIT)
    }

    /// Create a store that admits at most `limit` distinct series before
    /// routing new attribute sets to the overflow series
    pub fn with_cardinality_limit(limit: usize) -> Self {
        Self {
            index: AHashMap::new(),
            entries: Vec::new(),
            cardinality_limit: limit,
            overflowed: false,
            snapshotted: 0,
        }
    }

    /// Store with no cardinality limit
    pub(crate) fn unbounded() -> Self {
        Self::with_cardinality_limit(usize::MAX)
    }

    /// Configured cardinality limit
    pub fn cardinality_limit(&self) -> usize {
        self.cardinality_limit
    }

    /// Number of series currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no series are held
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a series by attributes
    pub fn get(&self, attributes: &AttributeSet) -> Option<&P> {
        self.index.get(attributes).map(|&idx| &self.entries[idx].1)
    }

    /// Mutable lookup by attributes
    pub fn get_mut(&mut self, attributes: &AttributeSet) -> Option<&mut P> {
        match self.index.get(attributes) {
            Some(&idx) => Some(&mut self.entries[idx].1),
            None => None,
        }
    }

    /// True if a series exists for `attributes`
    pub fn contains(&self, attributes: &AttributeSet) -> bool {
        self.index.contains_key(attributes)
    }

    /// Fetch the series for `attributes`, creating it with `init` if absent.
    ///
    /// New attribute sets beyond the cardinality limit are redirected to the
    /// overflow series, which `init` receives instead of the original set.
    pub fn get_or_insert_with<F>(&mut self, attributes: &AttributeSet, init: F) -> &mut P
    where
        F: FnOnce(&AttributeSet) -> P,
    {
        if let Some(&idx) = self.index.get(attributes) {
            return &mut self.entries[idx].1;
        }

        if self.entries.len() >= self.cardinality_limit {
            let overflow = overflow_attributes();
            if !self.overflowed {
                self.overflowed = true;
                tracing::warn!(
                    "Cardinality limit {} reached; routing new series to {}",
                    self.cardinality_limit,
                    overflow
                );
            }
            if let Some(&idx) = self.index.get(&overflow) {
                return &mut self.entries[idx].1;
            }
            return self.insert_new(overflow, init);
        }

        self.insert_new(attributes.clone(), init)
    }

    fn insert_new<F>(&mut self, attributes: AttributeSet, init: F) -> &mut P
    where
        F: FnOnce(&AttributeSet) -> P,
    {
        let point = init(&attributes);
        let idx = self.entries.len();
        self.index.insert(attributes.clone(), idx);
        self.entries.push((attributes, point));
        &mut self.entries[idx].1
    }

    /// Iterate series in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeSet, &P)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Mutable iteration in first-seen order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&AttributeSet, &mut P)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    /// Mutable iteration for a snapshot, flagging series not seen by an
    /// earlier snapshot. Every current series counts as seen afterwards.
    pub(crate) fn snapshot_mut(&mut self) -> impl Iterator<Item = (bool, &mut P)> {
        let seen = std::mem::replace(&mut self.snapshotted, self.entries.len());
        self.entries
            .iter_mut()
            .enumerate()
            .map(move |(idx, (_, point))| (idx >= seen, point))
    }

    /// Remove every series, yielding them in first-seen order
    pub fn drain(&mut self) -> impl Iterator<Item = (AttributeSet, P)> + '_ {
        self.index.clear();
        self.overflowed = false;
        self.snapshotted = 0;
        self.entries.drain(..)
    }

    /// Remove every series
    pub fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
        self.overflowed = false;
        self.snapshotted = 0;
    }
}
