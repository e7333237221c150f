//! Frequency index: O(1) LFU bookkeeping.
//!
//! Entries are grouped into buckets keyed by hit count. Each bucket is a list
//! ordered by when the entry arrived in it, newest at the front, so the back
//! of a bucket is the tie-breaking LFU victim. A running `min_frequency`
//! points at the lowest non-empty bucket.
//!
//! ```text
//!   min_frequency = 1
//!        │
//!        ▼
//!   ┌─────────┐   ┌─────────┐   ┌─────────┐
//!   │ freq 1  │   │ freq 2  │   │ freq 5  │
//!   │ d ─ c   │   │ a       │   │ b       │
//!   └─────────┘   └─────────┘   └─────────┘
//!        └── evict_lfu() takes `c`
//! ```
//!
//! Promotion only ever moves an entry from bucket `f` to `f + 1`, so when the
//! minimum bucket empties through a promotion the new minimum is `f + 1`.
//! Removal and eviction can empty the minimum bucket without refilling the
//! next one. The minimum is then only a lower bound and is marked stale. An
//! insert settles it at 1 again, so the usual evict-then-insert of a full
//! cache never looks at the other buckets. The bucket keys are rescanned only
//! when a stale minimum is actually needed.

use crate::list::{List, Node};
#[cfg(test)]
use core::cell::Cell;
use core::fmt;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

pub(crate) struct FrequencyIndex<T> {
    buckets: HashMap<u64, List<T>>,
    /// Exact when `min_stale` is false, otherwise a lower bound on the
    /// occupied bucket keys.
    min_frequency: Option<u64>,
    min_stale: bool,
    len: usize,
    #[cfg(test)]
    rescans: Cell<usize>,
}

impl<T> FrequencyIndex<T> {
    pub(crate) fn new() -> Self {
        FrequencyIndex {
            buckets: HashMap::new(),
            min_frequency: None,
            min_stale: false,
            len: 0,
            #[cfg(test)]
            rescans: Cell::new(0),
        }
    }

    #[cfg(test)]
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The lowest occupied hit count, `None` when the index is empty.
    ///
    /// Scans the bucket keys when the minimum is stale.
    pub(crate) fn min_frequency(&self) -> Option<u64> {
        if self.min_stale {
            self.lowest_occupied()
        } else {
            self.min_frequency
        }
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Places a new value in bucket 1, which is always the new minimum.
    pub(crate) fn insert(&mut self, value: T) -> *mut Node<T> {
        let node = self.buckets.entry(1).or_insert_with(List::new).push_front(value);
        self.min_frequency = Some(1);
        self.min_stale = false;
        self.len += 1;
        node
    }

    /// Moves `node` from bucket `frequency` to the front of `frequency + 1`.
    ///
    /// # Safety
    ///
    /// `node` must live in bucket `frequency` of this index, and
    /// `frequency` must be below `u64::MAX`.
    pub(crate) unsafe fn promote(&mut self, node: *mut Node<T>, frequency: u64) {
        // SAFETY: forwarded from the caller
        let emptied = unsafe { self.unlink(node, frequency) };
        let next = frequency + 1;
        if emptied && !self.min_stale && self.min_frequency == Some(frequency) {
            self.min_frequency = Some(next);
        }
        let bucket = self.buckets.entry(next).or_insert_with(List::new);
        // SAFETY: the node was just unlinked from its old bucket
        unsafe { bucket.attach_from_other_list(node) };
    }

    /// Removes `node` from bucket `frequency` and frees it.
    ///
    /// # Safety
    ///
    /// `node` must live in bucket `frequency` of this index and must not be
    /// used afterwards.
    pub(crate) unsafe fn remove(&mut self, node: *mut Node<T>, frequency: u64) -> T {
        // SAFETY: forwarded from the caller
        let emptied = unsafe { self.unlink(node, frequency) };
        self.len -= 1;
        if self.len == 0 || (emptied && self.min_frequency == Some(frequency)) {
            self.mark_min_stale();
        }
        // SAFETY: the node is detached and owned by us alone now
        unsafe { Node::reclaim(node) }
    }

    /// Removes and returns the oldest value of the lowest-frequency bucket.
    pub(crate) fn evict_lfu(&mut self) -> Option<T> {
        if self.min_stale {
            self.min_frequency = self.lowest_occupied();
            self.min_stale = false;
        }
        let frequency = self.min_frequency?;
        let Some(bucket) = self.buckets.get_mut(&frequency) else {
            panic!("minimum frequency bucket {frequency} is missing");
        };
        let Some(victim) = bucket.remove_last() else {
            panic!("minimum frequency bucket {frequency} is empty");
        };
        self.len -= 1;
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
            self.mark_min_stale();
        }
        Some(victim)
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.min_frequency = None;
        self.min_stale = false;
        self.len = 0;
    }

    /// How many times the bucket keys have been scanned for the minimum.
    #[cfg(test)]
    pub(crate) fn rescans(&self) -> usize {
        self.rescans.get()
    }

    /// Returns true if `node` is linked into bucket `frequency`.
    #[cfg(test)]
    pub(crate) fn bucket_contains(&self, frequency: u64, node: *mut Node<T>) -> bool {
        self.buckets
            .get(&frequency)
            .is_some_and(|bucket| bucket.contains_node(node))
    }

    /// The smallest bucket key, computed the slow way.
    #[cfg(test)]
    pub(crate) fn lowest_bucket(&self) -> Option<u64> {
        self.buckets.keys().copied().min()
    }

    /// Detaches `node` from its bucket, destroying the bucket if it empties.
    /// Returns whether the bucket was destroyed.
    ///
    /// # Safety
    ///
    /// `node` must live in bucket `frequency` of this index.
    unsafe fn unlink(&mut self, node: *mut Node<T>, frequency: u64) -> bool {
        let Some(bucket) = self.buckets.get_mut(&frequency) else {
            panic!("frequency bucket {frequency} is missing for a live entry");
        };
        // SAFETY: forwarded from the caller
        unsafe { bucket.detach(node) };
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
            true
        } else {
            false
        }
    }

    /// Called after the minimum bucket was destroyed. The old minimum stays
    /// behind as a lower bound until an insert or a rescan settles it.
    fn mark_min_stale(&mut self) {
        if self.len == 0 {
            self.min_frequency = None;
            self.min_stale = false;
        } else {
            self.min_stale = true;
        }
    }

    fn lowest_occupied(&self) -> Option<u64> {
        #[cfg(test)]
        self.rescans.set(self.rescans.get() + 1);
        self.buckets.keys().copied().min()
    }
}

impl<T> fmt::Debug for FrequencyIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyIndex")
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .field("min_frequency", &self.min_frequency)
            .field("min_stale", &self.min_stale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_insert_sets_min_frequency_to_one() {
        let mut index = FrequencyIndex::new();
        assert_eq!(index.min_frequency(), None);

        let a = index.insert('a');
        unsafe { index.promote(a, 1) };
        assert_eq!(index.min_frequency(), Some(2));

        index.insert('b');
        assert_eq!(index.min_frequency(), Some(1));
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_promote_destroys_emptied_bucket() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        let b = index.insert('b');

        unsafe { index.promote(a, 1) };
        assert!(index.bucket_contains(2, a));
        assert!(index.bucket_contains(1, b));
        assert_eq!(index.min_frequency(), Some(1));

        unsafe { index.promote(b, 1) };
        assert_eq!(index.bucket_count(), 1);
        assert_eq!(index.lowest_bucket(), Some(2));
        assert_eq!(index.min_frequency(), Some(2));
    }

    #[test]
    fn test_evict_lfu_takes_oldest_in_minimum_bucket() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        index.insert('b');
        index.insert('c');

        unsafe { index.promote(a, 1) };

        assert_eq!(index.evict_lfu(), Some('b'));
        assert_eq!(index.evict_lfu(), Some('c'));
        assert_eq!(index.min_frequency(), Some(2));
        assert_eq!(index.evict_lfu(), Some('a'));
        assert_eq!(index.min_frequency(), None);
        assert_eq!(index.evict_lfu(), None);
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_tie_break_uses_arrival_order_within_bucket() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        let b = index.insert('b');

        // b reaches bucket 2 before a does, so b is the older member there
        unsafe {
            index.promote(b, 1);
            index.promote(a, 1);
        }
        assert_eq!(index.evict_lfu(), Some('b'));
    }

    #[test]
    fn test_remove_rescans_min_frequency() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        let b = index.insert('b');
        for frequency in 1..4 {
            unsafe { index.promote(b, frequency) };
        }
        assert_eq!(index.min_frequency(), Some(1));

        // Removing the only entry at 1 leaves a gap up to bucket 4
        assert_eq!(unsafe { index.remove(a, 1) }, 'a');
        assert_eq!(index.min_frequency(), Some(4));
        assert_eq!(unsafe { index.remove(b, 4) }, 'b');
        assert_eq!(index.min_frequency(), None);
        assert_eq!(index.bucket_count(), 0);
    }

    #[test]
    fn test_insert_after_eviction_skips_rescan() {
        let mut index = FrequencyIndex::new();
        let hot: Vec<_> = (0..64).map(|i| index.insert(i)).collect();
        for (i, &node) in hot.iter().enumerate() {
            for frequency in 1..=(i as u64 + 1) {
                unsafe { index.promote(node, frequency) };
            }
        }
        index.insert(1000);

        // A full cache evicts the lone entry at 1 and inserts a fresh one
        for value in 1001..1500 {
            assert_eq!(index.evict_lfu(), Some(value - 1));
            index.insert(value);
            assert_eq!(index.min_frequency(), Some(1));
        }
        assert_eq!(index.rescans(), 0);
        assert_eq!(index.bucket_count(), 65);
    }

    #[test]
    fn test_stale_minimum_is_settled_on_demand() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        let b = index.insert('b');
        for frequency in 1..4 {
            unsafe { index.promote(b, frequency) };
        }

        // Removing the only entry at 1 leaves the minimum stale
        unsafe { index.remove(a, 1) };
        assert_eq!(index.rescans(), 0);

        // Promoting from a stale minimum keeps it a lower bound
        unsafe { index.promote(b, 4) };
        index.insert('c');
        assert_eq!(index.evict_lfu(), Some('c'));
        assert_eq!(index.evict_lfu(), Some('b'));
        assert_eq!(index.rescans(), 1);
        assert_eq!(index.min_frequency(), None);
    }

    #[test]
    #[should_panic(expected = "frequency bucket 7 is missing")]
    fn test_remove_from_missing_bucket_panics() {
        let mut index = FrequencyIndex::new();
        let a = index.insert('a');
        unsafe { index.remove(a, 7) };
    }
}
