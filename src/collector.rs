//! Live, rank-ordered collection of discovered coordinates.
//!
//! The collector keeps two structures in lock-step: the ranked sequence of
//! [`Coordinate`]s and a presentational [`ResultMirror`] whose `i`-th element
//! always describes the `i`-th coordinate. Both are updated inside a single
//! [`RankedResults::report`] call, so no caller ever observes them out of sync
//! or out of order.

use crate::coords::{Coordinate, precedes};
use crate::engine::ResultSink;

/// Presentational counterpart of the ranked sequence.
///
/// Implementations receive exactly one `insert` per reported coordinate, at
/// the same index the coordinate landed in the ranked sequence.
pub trait ResultMirror {
    /// Insert the element for `coordinate` at `index` (`index == len()` appends).
    fn insert(&mut self, index: usize, coordinate: &Coordinate);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default mirror holding the formatted `(x, y, z)` label for every result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelList {
    labels: Vec<String>,
}

impl LabelList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl ResultMirror for LabelList {
    fn insert(&mut self, index: usize, coordinate: &Coordinate) {
        let label = coordinate.to_string();
        if index == self.labels.len() {
            self.labels.push(label);
        } else {
            self.labels.insert(index, label);
        }
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}

/// Ranked sequence of coordinates plus its synchronized mirror.
///
/// Nothing is ever removed or merged: reporting the same coordinate twice
/// yields two entries.
#[derive(Debug, Clone, Default)]
pub struct RankedResults<M = LabelList> {
    ranked: Vec<Coordinate>,
    mirror: M,
}

impl RankedResults<LabelList> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: ResultMirror> RankedResults<M> {
    /// Create a collector that mirrors into the provided structure.
    ///
    /// The mirror must start empty.
    pub fn with_mirror(mirror: M) -> Self {
        debug_assert!(mirror.is_empty(), "mirror must start empty");
        Self {
            ranked: Vec::new(),
            mirror,
        }
    }

    /// Insert a newly discovered coordinate and return the index it landed at.
    ///
    /// Scans backward from the end, so discoveries that arrive roughly in rank
    /// order are placed in constant time.
    pub fn report(&mut self, coordinate: Coordinate) -> usize {
        let mut index = self.ranked.len();
        while index > 0 && precedes(&coordinate, &self.ranked[index - 1]) {
            index -= 1;
        }
        self.ranked.insert(index, coordinate);
        self.mirror.insert(index, &coordinate);
        debug_assert_eq!(self.ranked.len(), self.mirror.len());
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    #[must_use]
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.ranked
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> + '_ {
        self.ranked.iter()
    }

    #[must_use]
    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    /// The closest result found so far.
    #[must_use]
    pub fn nearest(&self) -> Option<Coordinate> {
        self.ranked.first().copied()
    }

    /// Copy of the ranked sequence at this point in time.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Coordinate> {
        self.ranked.clone()
    }
}

impl<M: ResultMirror> ResultSink for RankedResults<M> {
    fn report(&mut self, coordinate: Coordinate) {
        RankedResults::report(self, coordinate);
    }
}
