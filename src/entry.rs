//! The per-key record owned by the recency index.
//!
//! A `CacheEntry` carries the key, the value, its hit count and optional
//! deadline, plus back-references to the nodes that represent it in the
//! frequency and expiry indices. Those back-references are what let a single
//! lookup in the entry table reach every index in O(1).

use crate::list::Node;
use core::ptr;
use core::time::Duration;

/// Pointer to an entry's node in the recency index.
pub(crate) type EntryPtr<K, V> = *mut Node<CacheEntry<K, V>>;

/// Pointer to a node in a frequency or expiry bucket; the node's value is
/// the [`EntryPtr`] of the entry it stands for.
pub(crate) type IndexPtr<K, V> = *mut Node<EntryPtr<K, V>>;

/// One cached key/value pair and its index positions.
pub(crate) struct CacheEntry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Starts at 1 and grows on every hit or update.
    pub(crate) hit_count: u64,
    /// Absolute deadline on the cache clock; `None` never expires.
    pub(crate) expires_at: Option<Duration>,
    /// Node in the frequency bucket for `hit_count`.
    pub(crate) frequency_node: IndexPtr<K, V>,
    /// Node in the expiry bucket for `expires_at`; null when there is none.
    pub(crate) expiry_node: IndexPtr<K, V>,
}

impl<K, V> CacheEntry<K, V> {
    pub(crate) fn new(key: K, value: V, expires_at: Option<Duration>) -> Self {
        CacheEntry {
            key,
            value,
            hit_count: 1,
            expires_at,
            frequency_node: ptr::null_mut(),
            expiry_node: ptr::null_mut(),
        }
    }

    /// An entry is expired once the clock reaches its deadline.
    #[inline]
    pub(crate) fn is_expired(&self, now: Duration) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Remaining lifetime, zero once expired; `None` without a deadline.
    pub(crate) fn time_to_live(&self, now: Duration) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_sub(now))
    }
}
