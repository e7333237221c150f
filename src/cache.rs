//! Policy-switchable eviction cache with per-entry expiry.
//!
//! # Algorithm
//!
//! Every entry lives in up to three intrusive indices at once:
//!
//! - the recency index, ordered from most to least recently used;
//! - the frequency index, bucketed by hit count with a running minimum;
//! - the expiry index, bucketed by deadline, for entries that have one.
//!
//! The entry table maps each key to its recency node, and that node holds
//! back-references into the other two indices, so `get`, `put` and `remove`
//! touch every index in O(1), plus an ordered lookup into the expiry index for
//! entries with a deadline. Both eviction indices are maintained no matter
//! which policy is active, which is what lets
//! [`set_eviction_policy`](PolicyCache::set_eviction_policy) be a plain field
//! store.
//!
//! # Expiry
//!
//! Expiry is lazy. An expired entry is dropped when a lookup or update touches
//! it, and a `put` into a full cache reclaims the oldest expired entry before it
//! asks the policy for a live victim. [`purge_expired`](PolicyCache::purge_expired)
//! sweeps everything at once.
//!
//! # Thread Safety
//!
//! `PolicyCache` is not thread-safe. Use
//! [`ConcurrentPolicyCache`](crate::ConcurrentPolicyCache) to share one across
//! threads.

extern crate alloc;

use crate::clock::{Clock, DefaultClock};
use crate::config::PolicyCacheConfig;
use crate::entry::{CacheEntry, EntryPtr};
use crate::expiry::ExpiryIndex;
use crate::frequency::FrequencyIndex;
use crate::list;
use crate::metrics::{CacheMetrics, PolicyCacheMetrics};
use crate::policy::EvictionPolicy;
use crate::recency::RecencyIndex;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ptr;
use core::time::Duration;
use tracing::{debug, trace};

#[cfg(feature = "hashbrown")]
pub use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
pub use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Upper bound on the entry table preallocation, so a huge nominal capacity
/// does not reserve memory up front.
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 16;

/// A capacity-bounded cache that evicts by LRU or LFU and expires entries by
/// deadline.
///
/// # Safety
///
/// The entry table and the frequency and expiry indices hold raw pointers to
/// nodes owned by the recency index. A pointer is valid from the moment the
/// entry is inserted until [`detach_entry`](Self::detach_entry) or eviction
/// unlinks it from every index at once, and no pointer outlives the cache.
///
/// # Examples
///
/// ```
/// use policy_cache::{EvictionPolicy, PolicyCache};
///
/// let mut cache = PolicyCache::new(2, EvictionPolicy::Lfu);
/// cache.put("apple", 1, None);
/// cache.put("banana", 2, None);
/// assert_eq!(cache.get(&"apple"), Some(&1));
///
/// // banana has the lowest hit count, so it makes room for cherry
/// assert_eq!(cache.put("cherry", 3, None), Some(("banana", 2)));
/// assert!(!cache.contains(&"banana"));
/// ```
pub struct PolicyCache<K, V, S = DefaultHashBuilder, C = DefaultClock> {
    config: PolicyCacheConfig,
    map: HashMap<K, EntryPtr<K, V>, S>,
    recency: RecencyIndex<CacheEntry<K, V>>,
    frequency: FrequencyIndex<EntryPtr<K, V>>,
    expiry: ExpiryIndex<EntryPtr<K, V>>,
    clock: C,
    metrics: PolicyCacheMetrics,
}

// SAFETY: PolicyCache owns every node its raw pointers refer to; moving it to
// another thread moves all of them together.
unsafe impl<K: Send, V: Send, S: Send, C: Send> Send for PolicyCache<K, V, S, C> {}

// SAFETY: All mutation requires &mut self; shared references only read.
unsafe impl<K: Sync, V: Sync, S: Sync, C: Sync> Sync for PolicyCache<K, V, S, C> {}

impl<K: Hash + Eq + Clone, V> PolicyCache<K, V> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is accepted; every `put` on such a cache is ignored.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self::init(PolicyCacheConfig { capacity, policy }, None)
    }

    /// Creates a cache from a configuration, with an optional hasher.
    pub fn init(config: PolicyCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::with_hasher_and_clock(config, hasher.unwrap_or_default(), DefaultClock::default())
    }
}

impl<K: Hash + Eq + Clone, V, C: Clock> PolicyCache<K, V, DefaultHashBuilder, C> {
    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(config: PolicyCacheConfig, clock: C) -> Self {
        Self::with_hasher_and_clock(config, DefaultHashBuilder::default(), clock)
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher, C: Clock> PolicyCache<K, V, S, C> {
    /// Creates a cache with an explicit hasher and time source.
    pub fn with_hasher_and_clock(config: PolicyCacheConfig, hash_builder: S, clock: C) -> Self {
        let map_capacity = config.capacity.min(MAX_PREALLOCATED_ENTRIES);
        PolicyCache {
            config,
            map: HashMap::with_capacity_and_hasher(map_capacity, hash_builder),
            recency: RecencyIndex::new(),
            frequency: FrequencyIndex::new(),
            expiry: ExpiryIndex::new(),
            clock,
            metrics: PolicyCacheMetrics::new(),
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub fn cap(&self) -> usize {
        self.config.capacity
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true when no entries are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The policy that picks the next victim.
    #[inline]
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.config.policy
    }

    /// Lowest hit count among stored entries, `None` when empty.
    #[inline]
    pub fn min_frequency(&self) -> Option<u64> {
        self.frequency.min_frequency()
    }

    /// Counters collected since construction.
    #[inline]
    pub fn metrics(&self) -> &PolicyCacheMetrics {
        &self.metrics
    }

    /// The time source deadlines are measured against.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Switches the eviction policy. Stored entries are left untouched.
    pub fn set_eviction_policy(&mut self, policy: EvictionPolicy) {
        if self.config.policy == policy {
            return;
        }
        debug!(from = self.config.policy.as_str(), to = policy.as_str(), "switching eviction policy");
        self.config.policy = policy;
        self.metrics.record_policy_switch();
    }

    /// Returns the value for `key`, counting the access as a hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = self.clock.now();
        let Some(node) = self.lookup_live(key, now) else {
            self.metrics.core.record_miss();
            return None;
        };
        self.metrics.core.record_hit();
        // SAFETY: node comes from our map and is live
        unsafe {
            self.touch(node);
            Some(&(*node).value().value)
        }
    }

    /// Like [`get`](Self::get), but returns a mutable reference.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = self.clock.now();
        let Some(node) = self.lookup_live(key, now) else {
            self.metrics.core.record_miss();
            return None;
        };
        self.metrics.core.record_hit();
        // SAFETY: node comes from our map and is live
        unsafe {
            self.touch(node);
            Some(&mut (*node).value_mut().value)
        }
    }

    /// Inserts or updates `key`.
    ///
    /// With `ttl` the entry expires once that much time has passed; a zero
    /// `ttl` stores an entry that is already expired. Updating without a `ttl`
    /// keeps the entry's current deadline.
    ///
    /// Returns the replaced value on update, or the live entry evicted to make
    /// room. Reclaiming an expired entry returns nothing.
    ///
    /// # Complexity
    ///
    /// O(1) amortized without a deadline. Scheduling or moving a deadline, and
    /// reclaiming an expired entry, cost O(log d) in the number of distinct
    /// deadlines.
    pub fn put(&mut self, key: K, value: V, ttl: Option<Duration>) -> Option<(K, V)> {
        if self.config.capacity == 0 {
            trace!("ignoring put into a zero-capacity cache");
            return None;
        }

        let now = self.clock.now();
        let deadline = ttl.map(|ttl| now.saturating_add(ttl));

        if let Some(node) = self.lookup_live(&key, now) {
            self.metrics.core.record_update();
            // SAFETY: node comes from our map and is live
            unsafe {
                self.touch(node);
                if let Some(deadline) = deadline {
                    self.reschedule(node, deadline);
                }
                let old_value = mem::replace(&mut (*node).value_mut().value, value);
                return Some((key, old_value));
            }
        }

        let mut evicted = None;
        if self.map.len() >= self.config.capacity {
            if self.expire_oldest(now) {
                trace!("reclaimed expired entry to make room");
            } else {
                evicted = Some(self.evict());
            }
        }

        self.insert_new(key, value, deadline);
        evicted
    }

    /// Removes `key`, returning its value if it was live.
    ///
    /// An expired entry is still removed, but reported as absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        let now = self.clock.now();
        // SAFETY: node comes from our map
        let entry = unsafe { self.detach_entry(node) };
        if entry.is_expired(now) {
            self.metrics.core.record_expiration();
            None
        } else {
            self.metrics.core.record_removal();
            Some(entry.value)
        }
    }

    /// Removes and returns the entry the active policy would evict next.
    ///
    /// Expired entries are dropped first and never returned.
    pub fn pop(&mut self) -> Option<(K, V)> {
        self.purge_expired();
        let entry = self.take_victim()?;
        self.metrics.core.record_removal();
        Some((entry.key, entry.value))
    }

    /// Drops every expired entry and returns how many there were.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut purged = 0;
        while self.expire_oldest(now) {
            purged += 1;
        }
        if purged > 0 {
            trace!(purged, "purged expired entries");
        }
        purged
    }

    /// Returns the value for `key` without touching recency or hit count.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek_entry(key).map(|entry| &entry.value)
    }

    /// Returns true if `key` holds a live entry. Does not count as an access.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek_entry(key).is_some()
    }

    /// Current hit count of a live entry.
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek_entry(key).map(|entry| entry.hit_count)
    }

    /// Remaining lifetime of a live entry. `None` if the key is absent,
    /// expired, or was stored without a deadline.
    pub fn time_to_live<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let now = self.clock.now();
        self.peek_entry(key)
            .and_then(|entry| entry.time_to_live(now))
    }

    /// Live keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Live entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.recency.iter(),
            now: self.clock.now(),
        }
    }

    /// Removes every entry. Metrics are kept.
    pub fn clear(&mut self) {
        self.map.clear();
        self.frequency.clear();
        self.expiry.clear();
        self.recency.clear();
    }

    fn peek_entry<Q>(&self, key: &Q) -> Option<&CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map
        let entry = unsafe { (*node).value() };
        (!entry.is_expired(self.clock.now())).then_some(entry)
    }

    /// Finds the entry for `key`, dropping it if it has expired.
    fn lookup_live<Q>(&mut self, key: &Q, now: Duration) -> Option<EntryPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map
        if unsafe { (*node).value().is_expired(now) } {
            // SAFETY: as above
            unsafe { self.expire(node) };
            return None;
        }
        Some(node)
    }

    /// Records an access: move to the recency front and climb one frequency
    /// bucket. At `u64::MAX` hits the count saturates and the entry stays put.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache.
    unsafe fn touch(&mut self, node: EntryPtr<K, V>) {
        // SAFETY: forwarded from the caller
        unsafe {
            self.recency.move_to_front(node);
            let entry = (*node).value_mut();
            if let Some(next) = entry.hit_count.checked_add(1) {
                self.frequency.promote(entry.frequency_node, entry.hit_count);
                entry.hit_count = next;
                self.metrics.record_promotion(next);
            }
        }
    }

    /// Moves an entry to the expiry bucket for `deadline`.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache.
    unsafe fn reschedule(&mut self, node: EntryPtr<K, V>, deadline: Duration) {
        // SAFETY: forwarded from the caller; expiry_node is set whenever
        // expires_at is
        unsafe {
            let entry = (*node).value_mut();
            if entry.expires_at == Some(deadline) {
                return;
            }
            if let Some(old_deadline) = entry.expires_at {
                self.expiry.remove(old_deadline, entry.expiry_node);
            }
            entry.expiry_node = self.expiry.insert(deadline, node);
            entry.expires_at = Some(deadline);
        }
    }

    fn insert_new(&mut self, key: K, value: V, deadline: Option<Duration>) {
        let node = self
            .recency
            .push_front(CacheEntry::new(key.clone(), value, deadline));
        let frequency_node = self.frequency.insert(node);
        let expiry_node = match deadline {
            Some(deadline) => self.expiry.insert(deadline, node),
            None => ptr::null_mut(),
        };
        // SAFETY: node was just allocated by the recency index
        unsafe {
            let entry = (*node).value_mut();
            entry.frequency_node = frequency_node;
            entry.expiry_node = expiry_node;
        }
        self.map.insert(key, node);
        self.metrics.core.record_insertion();
    }

    /// Unlinks an entry from every index and hands back the record.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache; it is freed here.
    unsafe fn detach_entry(&mut self, node: EntryPtr<K, V>) -> CacheEntry<K, V> {
        // SAFETY: forwarded from the caller; the index nodes stored in the
        // entry belong to the buckets named by its hit count and deadline
        let entry = unsafe { self.recency.remove(node) };
        // SAFETY: see above
        unsafe { self.unlink_secondary(&entry) };
        self.map.remove(&entry.key);
        entry
    }

    /// Drops an expired entry.
    ///
    /// # Safety
    ///
    /// `node` must be a live entry of this cache.
    unsafe fn expire(&mut self, node: EntryPtr<K, V>) {
        // SAFETY: forwarded from the caller
        let entry = unsafe { self.detach_entry(node) };
        self.metrics.core.record_expiration();
        trace!(hit_count = entry.hit_count, "dropped expired entry");
    }

    /// Drops the oldest entry whose deadline has passed, if any.
    fn expire_oldest(&mut self, now: Duration) -> bool {
        let Some(&node) = self.expiry.peek_expired(now) else {
            return false;
        };
        // SAFETY: expiry buckets only hold live entries of this cache
        unsafe { self.expire(node) };
        true
    }

    /// Evicts one live entry chosen by the active policy.
    fn evict(&mut self) -> (K, V) {
        let policy = self.config.policy;
        let Some(entry) = self.take_victim() else {
            panic!("eviction requested on an empty cache");
        };
        self.metrics.record_eviction(policy);
        debug!(policy = policy.as_str(), hit_count = entry.hit_count, "evicted entry");
        (entry.key, entry.value)
    }

    /// Unlinks the active policy's victim from every index.
    fn take_victim(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = match self.config.policy {
            EvictionPolicy::Lru => self.recency.evict_back()?,
            EvictionPolicy::Lfu => {
                let node = self.frequency.evict_lfu()?;
                // SAFETY: frequency buckets only hold live entries
                let entry = unsafe { self.recency.remove(node) };
                self.map.remove(&entry.key);
                if let Some(deadline) = entry.expires_at {
                    // SAFETY: expiry_node is set whenever expires_at is
                    unsafe { self.expiry.remove(deadline, entry.expiry_node) };
                }
                return Some(entry);
            }
        };
        // SAFETY: the record still carries valid index nodes
        unsafe { self.unlink_secondary(&entry) };
        self.map.remove(&entry.key);
        Some(entry)
    }

    /// Removes an already-unlinked record from the frequency and expiry
    /// indices.
    ///
    /// # Safety
    ///
    /// `entry` must have been a live entry of this cache whose index nodes
    /// have not been removed yet.
    unsafe fn unlink_secondary(&mut self, entry: &CacheEntry<K, V>) {
        // SAFETY: forwarded from the caller
        unsafe {
            self.frequency.remove(entry.frequency_node, entry.hit_count);
            if let Some(deadline) = entry.expires_at {
                self.expiry.remove(deadline, entry.expiry_node);
            }
        }
    }

    /// Walks every index and checks that they agree with the entry table.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert!(self.map.len() <= self.config.capacity, "over capacity");
        assert_eq!(self.map.len(), self.recency.len(), "recency size");
        assert_eq!(self.map.len(), self.frequency.len(), "frequency size");
        assert_eq!(
            self.frequency.min_frequency(),
            self.frequency.lowest_bucket(),
            "min frequency"
        );

        let mut scheduled = 0;
        for entry in self.recency.iter() {
            let Some(&node) = self.map.get(&entry.key) else {
                panic!("recency entry missing from the entry table");
            };
            // SAFETY: node comes from our map
            unsafe {
                assert!(ptr::eq((*node).value(), entry), "entry table points elsewhere");
                assert!(self
                    .frequency
                    .bucket_contains(entry.hit_count, entry.frequency_node));
                assert_eq!(*(*entry.frequency_node).value(), node);
                match entry.expires_at {
                    Some(deadline) => {
                        scheduled += 1;
                        assert!(self.expiry.bucket_contains(deadline, entry.expiry_node));
                        assert_eq!(*(*entry.expiry_node).value(), node);
                    }
                    None => assert!(entry.expiry_node.is_null()),
                }
            }
        }
        assert_eq!(scheduled, self.expiry.len(), "expiry size");
    }
}

impl<K, V, S, C> fmt::Debug for PolicyCache<K, V, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyCache")
            .field("capacity", &self.config.capacity)
            .field("policy", &self.config.policy)
            .field("len", &self.map.len())
            .field("frequency", &self.frequency)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher, C: Clock> CacheMetrics for PolicyCache<K, V, S, C> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.to_btreemap();
        metrics.insert("capacity".to_string(), self.config.capacity as f64);
        metrics.insert("entries".to_string(), self.map.len() as f64);
        metrics.insert(
            "frequency_buckets".to_string(),
            self.frequency.bucket_count() as f64,
        );
        metrics.insert(
            "expiry_buckets".to_string(),
            self.expiry.bucket_count() as f64,
        );
        if let Some(min_frequency) = self.frequency.min_frequency() {
            metrics.insert("min_frequency".to_string(), min_frequency as f64);
        }
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        self.config.policy.as_str()
    }
}

/// Iterator over live entries, most recently used first.
pub struct Iter<'a, K, V> {
    inner: list::Iter<'a, CacheEntry<K, V>>,
    now: Duration,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let now = self.now;
        self.inner
            .by_ref()
            .find(|entry| !entry.is_expired(now))
            .map(|entry| (&entry.key, &entry.value))
    }
}

impl<K, V> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("now", &self.now).finish()
    }
}

/// Iterator over live keys, most recently used first.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(key, _)| key)
    }
}

impl<K, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys").field("now", &self.inner.now).finish()
    }
}
