//! Expiry index: entries bucketed by their exact deadline.
//!
//! Buckets are kept in deadline order so the earliest expired entry can be
//! found without scanning, which is how an overflowing `put` reclaims the slot
//! of an entry that expired without ever being read again.
//!
//! The ordered map makes insert and removal O(log d) in the number of distinct
//! deadlines; the list operations inside a bucket stay O(1).

extern crate alloc;

use crate::list::{List, Node};
use alloc::collections::BTreeMap;
use core::fmt;
use core::time::Duration;

pub(crate) struct ExpiryIndex<T> {
    buckets: BTreeMap<Duration, List<T>>,
    len: usize,
}

impl<T> ExpiryIndex<T> {
    pub(crate) fn new() -> Self {
        ExpiryIndex {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    #[cfg(test)]
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// The earliest scheduled deadline.
    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        self.buckets.keys().next().copied()
    }

    /// Schedules `value` for `deadline`; colliding deadlines share a bucket.
    pub(crate) fn insert(&mut self, deadline: Duration, value: T) -> *mut Node<T> {
        self.len += 1;
        self.buckets
            .entry(deadline)
            .or_insert_with(List::new)
            .push_front(value)
    }

    /// Unschedules `node`, destroying its bucket if it empties.
    ///
    /// # Safety
    ///
    /// `node` must live in the bucket for `deadline` and must not be used
    /// afterwards.
    pub(crate) unsafe fn remove(&mut self, deadline: Duration, node: *mut Node<T>) -> T {
        let Some(bucket) = self.buckets.get_mut(&deadline) else {
            panic!("expiry bucket {deadline:?} is missing for a scheduled entry");
        };
        // SAFETY: forwarded from the caller
        let value = unsafe { bucket.remove(node) };
        if bucket.is_empty() {
            self.buckets.remove(&deadline);
        }
        self.len -= 1;
        value
    }

    /// Returns the oldest value whose deadline is at or before `now`.
    pub(crate) fn peek_expired(&self, now: Duration) -> Option<&T> {
        let (&deadline, bucket) = self.buckets.first_key_value()?;
        if deadline > now {
            return None;
        }
        bucket.back()
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Returns true if `node` is linked into the bucket for `deadline`.
    #[cfg(test)]
    pub(crate) fn bucket_contains(&self, deadline: Duration, node: *mut Node<T>) -> bool {
        self.buckets
            .get(&deadline)
            .is_some_and(|bucket| bucket.contains_node(node))
    }
}

impl<T> fmt::Debug for ExpiryIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiryIndex")
            .field("len", &self.len)
            .field("buckets", &self.buckets.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
