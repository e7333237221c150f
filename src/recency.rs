//! Recency index: every live entry ordered from most to least recently used.
//!
//! The recency index owns the entry records themselves. It is maintained under
//! both eviction policies so that switching to LRU never needs a rebuild.

use crate::list::{Iter, List, Node};
use core::fmt;

pub(crate) struct RecencyIndex<T> {
    list: List<T>,
}

impl<T> RecencyIndex<T> {
    pub(crate) fn new() -> Self {
        RecencyIndex { list: List::new() }
    }

    #[cfg(test)]
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }

    /// Inserts a value as the most recently used.
    #[inline]
    pub(crate) fn push_front(&mut self, value: T) -> *mut Node<T> {
        self.list.push_front(value)
    }

    /// Marks `node` as the most recently used.
    ///
    /// # Safety
    ///
    /// `node` must belong to this index.
    #[inline]
    pub(crate) unsafe fn move_to_front(&mut self, node: *mut Node<T>) {
        // SAFETY: forwarded from the caller
        unsafe { self.list.move_to_front(node) }
    }

    /// Removes and returns the least recently used value.
    #[inline]
    pub(crate) fn evict_back(&mut self) -> Option<T> {
        self.list.remove_last()
    }

    /// Removes `node` from any position.
    ///
    /// # Safety
    ///
    /// `node` must belong to this index and must not be used afterwards.
    #[inline]
    pub(crate) unsafe fn remove(&mut self, node: *mut Node<T>) -> T {
        // SAFETY: forwarded from the caller
        unsafe { self.list.remove(node) }
    }

    /// Iterates from most to least recently used.
    #[inline]
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        self.list.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.list.clear();
    }
}

impl<T> fmt::Debug for RecencyIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyIndex")
            .field("len", &self.list.len())
            .finish()
    }
}
