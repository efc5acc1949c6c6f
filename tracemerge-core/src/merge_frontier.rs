use likely_stable::unlikely;
use log::{debug, info};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::MergeError;
use crate::row::Row;

/// The key type to compare the elements.
pub trait HeapOrderKey {
    type Key: Ord;

    fn key(&self) -> Self::Key;
}

/// A pull-based source of rows, sorted by timestamp.
pub trait RowSource {
    /// Next row, `None` once the source is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, MergeError>;
}

/// Rows already in memory, mostly for tests.
impl RowSource for std::vec::IntoIter<Row> {
    fn next_row(&mut self) -> Result<Option<Row>, MergeError> {
        Ok(self.next())
    }
}

/// Heap element ordered by `HeapOrderKey` only.
struct Pending<T: HeapOrderKey>(T);

impl<T: HeapOrderKey> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.key() == other.0.key()
    }
}

impl<T: HeapOrderKey> Eq for Pending<T> {}

impl<T: HeapOrderKey> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.key().cmp(&other.0.key())
    }
}

impl<T: HeapOrderKey> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap holding at most one pending `Row` per active source.
///
/// Rows are ordered by `(timestamp, source_index)`, so rows with equal
/// timestamps come out in source order.
///
/// The frontier never reads ahead. After `pop_min` returns a row, the caller
/// must call `refill` with the row's `source_index`, which pulls exactly one
/// more row from that source. Pulling a row is file I/O with filtering and
/// sampling side effects, so memory stays bounded by one row per source plus
/// the window of the source being refilled.
pub struct MergeFrontier<S: RowSource> {
    /// All sources, indexed by `source_index`.
    sources: Vec<S>,

    /// `true` while the source may still produce rows.
    active: Vec<bool>,

    /// `true` while the heap holds a row of the source.
    pending: Vec<bool>,

    heap: BinaryHeap<Reverse<Pending<Row>>>,
}

impl<S: RowSource> MergeFrontier<S> {
    /// Pull the first row of every source. Sources that are empty from the
    /// start contribute nothing.
    pub fn seed(sources: Vec<S>) -> Result<Self, MergeError> {
        let num_sources = sources.len();

        let mut frontier = Self {
            sources,
            active: vec![true; num_sources],
            pending: vec![false; num_sources],
            heap: BinaryHeap::with_capacity(num_sources),
        };

        for source_index in 0..num_sources {
            frontier.pull(source_index)?;
        }

        info!(
            "merge frontier seeded, sources: {}, active: {}",
            num_sources,
            frontier.heap.len()
        );

        Ok(frontier)
    }

    /// Remove and return the row with the smallest timestamp, `None` when the merge is complete.
    pub fn pop_min(&mut self) -> Option<Row> {
        let Reverse(Pending(row)) = self.heap.pop()?;
        self.pending[row.source_index] = false;

        Some(row)
    }

    /// Pull the next row of `source_index` after its pending row was popped.
    ///
    /// An exhausted source is deactivated, refilling it again is a no-op.
    pub fn refill(&mut self, source_index: usize) -> Result<(), MergeError> {
        if unlikely(source_index >= self.sources.len()) {
            debug!("refill of unknown source: {}", source_index);
            return Ok(());
        }

        // Keep at most one pending row per source.
        if unlikely(self.pending[source_index]) {
            debug!("source {} still has a pending row, skip refill", source_index);
            return Ok(());
        }

        self.pull(source_index)
    }

    fn pull(&mut self, source_index: usize) -> Result<(), MergeError> {
        if !self.active[source_index] {
            return Ok(());
        }

        match self.sources[source_index].next_row()? {
            Some(mut row) => {
                row.source_index = source_index;
                self.pending[source_index] = true;
                self.heap.push(Reverse(Pending(row)));
            }
            None => {
                debug!("source {} exhausted", source_index);
                self.active[source_index] = false;
            }
        }

        Ok(())
    }

    /// Number of pending rows.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of sources that are not exhausted yet.
    pub fn num_active(&self) -> usize {
        self.active.iter().filter(|x| **x).count()
    }

    pub fn into_sources(self) -> Vec<S> {
        self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::setup_log;
    use anyhow::Result;

    fn source(timestamps: &[u64]) -> std::vec::IntoIter<Row> {
        timestamps
            .iter()
            .map(|ts| Row::new(*ts, &format!("k{}", ts), 1, 1, 1, "get", 0))
            .collect::<Vec<_>>()
            .into_iter()
    }

    fn drain(frontier: &mut MergeFrontier<std::vec::IntoIter<Row>>) -> Result<Vec<(u64, usize)>> {
        let mut res = Vec::new();

        while let Some(row) = frontier.pop_min() {
            res.push((row.timestamp, row.source_index));
            frontier.refill(row.source_index)?;
        }

        Ok(res)
    }

    #[test]
    fn test_merge_order() -> Result<()> {
        setup_log();

        let mut frontier =
            MergeFrontier::seed(vec![source(&[1, 3, 5]), source(&[2, 4]), source(&[0, 6])])?;
        assert_eq!(frontier.len(), 3);

        let merged = drain(&mut frontier)?;
        assert_eq!(
            merged,
            vec![(0, 2), (1, 0), (2, 1), (3, 0), (4, 1), (5, 0), (6, 2)]
        );

        assert!(frontier.is_empty());
        assert_eq!(frontier.num_active(), 0);

        Ok(())
    }

    #[test]
    fn test_ties_broken_by_source_index() -> Result<()> {
        let mut frontier =
            MergeFrontier::seed(vec![source(&[7, 7]), source(&[7]), source(&[7])])?;

        let merged = drain(&mut frontier)?;
        assert_eq!(merged, vec![(7, 0), (7, 0), (7, 1), (7, 2)]);

        Ok(())
    }

    #[test]
    fn test_empty_sources() -> Result<()> {
        let mut frontier = MergeFrontier::seed(vec![source(&[]), source(&[4]), source(&[])])?;

        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.num_active(), 1);

        let row = frontier.pop_min().unwrap();
        assert_eq!(row.source_index, 1);
        frontier.refill(row.source_index)?;

        assert!(frontier.pop_min().is_none());

        let mut frontier = MergeFrontier::<std::vec::IntoIter<Row>>::seed(vec![])?;
        assert!(frontier.pop_min().is_none());

        Ok(())
    }

    #[test]
    fn test_at_most_one_pending_row_per_source() -> Result<()> {
        let mut frontier = MergeFrontier::seed(vec![source(&[1, 2, 3]), source(&[10])])?;
        assert_eq!(frontier.len(), 2);

        // Refilling a source whose row is still pending does not read ahead.
        frontier.refill(0)?;
        frontier.refill(0)?;
        assert_eq!(frontier.len(), 2);

        let row = frontier.pop_min().unwrap();
        assert_eq!(row.timestamp, 1);
        assert_eq!(frontier.len(), 1);

        frontier.refill(row.source_index)?;
        assert_eq!(frontier.len(), 2);

        // Unknown source.
        frontier.refill(5)?;
        assert_eq!(frontier.len(), 2);

        Ok(())
    }

    #[test]
    fn test_exhausted_source_refill_is_noop() -> Result<()> {
        let mut frontier = MergeFrontier::seed(vec![source(&[1])])?;

        let row = frontier.pop_min().unwrap();
        frontier.refill(row.source_index)?;
        frontier.refill(row.source_index)?;

        assert!(frontier.pop_min().is_none());
        assert_eq!(frontier.into_sources().len(), 1);

        Ok(())
    }
}
