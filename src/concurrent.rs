//! Thread-safe wrapper around [`PolicyCache`].
//!
//! Every operation, reads included, takes one `parking_lot::Mutex`. A `get`
//! reorders the recency index and promotes a frequency bucket, so lookups need
//! exclusive access too.
//!
//! Values handed out by [`get`](ConcurrentPolicyCache::get) are clones, since a
//! reference cannot outlive the lock guard. Use
//! [`get_with`](ConcurrentPolicyCache::get_with) to inspect a value in place or
//! [`with_cache`](ConcurrentPolicyCache::with_cache) to run several operations
//! under a single lock acquisition.
//!
//! # Example
//!
//! ```
//! use policy_cache::{ConcurrentPolicyCache, EvictionPolicy};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(ConcurrentPolicyCache::new(100, EvictionPolicy::Lru));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..10 {
//!                 cache.put(t * 10 + i, i, None);
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(cache.len(), 40);
//! ```

extern crate alloc;

use crate::cache::{DefaultHashBuilder, PolicyCache};
use crate::clock::{Clock, DefaultClock};
use crate::config::PolicyCacheConfig;
use crate::metrics::{CacheMetrics, PolicyCacheMetrics};
use crate::policy::EvictionPolicy;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::time::Duration;
use parking_lot::Mutex;

/// A [`PolicyCache`] shared between threads behind one lock.
pub struct ConcurrentPolicyCache<K, V, S = DefaultHashBuilder, C = DefaultClock> {
    inner: Mutex<PolicyCache<K, V, S, C>>,
}

impl<K: Hash + Eq + Clone, V> ConcurrentPolicyCache<K, V> {
    /// Creates a shared cache holding at most `capacity` entries.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self::from(PolicyCache::new(capacity, policy))
    }

    /// Creates a shared cache from a configuration, with an optional hasher.
    pub fn init(config: PolicyCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::from(PolicyCache::init(config, hasher))
    }
}

impl<K: Hash + Eq + Clone, V, C: Clock> ConcurrentPolicyCache<K, V, DefaultHashBuilder, C> {
    /// Creates a shared cache that reads time from `clock`.
    pub fn with_clock(config: PolicyCacheConfig, clock: C) -> Self {
        Self::from(PolicyCache::with_clock(config, clock))
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher, C: Clock> ConcurrentPolicyCache<K, V, S, C> {
    /// Creates a shared cache with an explicit hasher and time source.
    pub fn with_hasher_and_clock(config: PolicyCacheConfig, hash_builder: S, clock: C) -> Self {
        Self::from(PolicyCache::with_hasher_and_clock(config, hash_builder, clock))
    }

    /// Returns a clone of the value for `key`, counting the access as a hit.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Counts an access to `key` and applies `f` to its value under the lock.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.inner.lock().get(key).map(f)
    }

    /// Like [`get_with`](Self::get_with), with mutable access to the value.
    pub fn get_mut_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&mut V) -> R,
    {
        self.inner.lock().get_mut(key).map(f)
    }

    /// See [`PolicyCache::put`].
    pub fn put(&self, key: K, value: V, ttl: Option<Duration>) -> Option<(K, V)> {
        self.inner.lock().put(key, value, ttl)
    }

    /// Removes `key`, returning its value if it was live.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().remove(key)
    }

    /// Switches the eviction policy for later evictions.
    pub fn set_eviction_policy(&self, policy: EvictionPolicy) {
        self.inner.lock().set_eviction_policy(policy);
    }

    /// The policy that picks the next victim.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.inner.lock().eviction_policy()
    }

    /// Removes and returns the entry the active policy would evict next.
    pub fn pop(&self) -> Option<(K, V)> {
        self.inner.lock().pop()
    }

    /// Drops every expired entry and returns how many there were.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired()
    }

    /// Returns a clone of the value without counting an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    /// Returns true if `key` holds a live entry.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().contains(key)
    }

    /// Current hit count of a live entry.
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().frequency(key)
    }

    /// Remaining lifetime of a live entry with a deadline.
    pub fn time_to_live<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.lock().time_to_live(key)
    }

    /// Snapshot of the live keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of entries.
    pub fn cap(&self) -> usize {
        self.inner.lock().cap()
    }

    /// Lowest hit count among stored entries.
    pub fn min_frequency(&self) -> Option<u64> {
        self.inner.lock().min_frequency()
    }

    /// Snapshot of the counters.
    pub fn metrics_snapshot(&self) -> PolicyCacheMetrics {
        self.inner.lock().metrics().clone()
    }

    /// Runs `f` with exclusive access to the cache.
    ///
    /// ```
    /// use policy_cache::{ConcurrentPolicyCache, EvictionPolicy};
    ///
    /// let cache = ConcurrentPolicyCache::new(4, EvictionPolicy::Lfu);
    /// let hits = cache.with_cache(|cache| {
    ///     cache.put("a", 1, None);
    ///     cache.get(&"a");
    ///     cache.frequency(&"a")
    /// });
    /// assert_eq!(hits, Some(2));
    /// ```
    pub fn with_cache<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut PolicyCache<K, V, S, C>) -> R,
    {
        f(&mut self.inner.lock())
    }

    /// Consumes the wrapper and returns the cache inside.
    pub fn into_inner(self) -> PolicyCache<K, V, S, C> {
        self.inner.into_inner()
    }
}

impl<K, V, S, C> From<PolicyCache<K, V, S, C>> for ConcurrentPolicyCache<K, V, S, C> {
    fn from(cache: PolicyCache<K, V, S, C>) -> Self {
        ConcurrentPolicyCache {
            inner: Mutex::new(cache),
        }
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher, C: Clock> CacheMetrics
    for ConcurrentPolicyCache<K, V, S, C>
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        CacheMetrics::metrics(&*self.inner.lock())
    }

    fn algorithm_name(&self) -> &'static str {
        self.inner.lock().eviction_policy().as_str()
    }
}

impl<K, V, S, C> fmt::Debug for ConcurrentPolicyCache<K, V, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f
                .debug_struct("ConcurrentPolicyCache")
                .field("cache", &*cache)
                .finish(),
            None => f
                .debug_struct("ConcurrentPolicyCache")
                .field("cache", &"<locked>")
                .finish(),
        }
    }
}
