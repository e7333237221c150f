//! Cache Metrics System
//!
//! Counters are collected in plain structs and reported through the
//! [`CacheMetrics`] trait as a `BTreeMap<String, f64>`, so metric keys always
//! come out in the same order.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Counters specific to the policy-switchable cache.
pub mod policy;

pub use policy::PolicyCacheMetrics;

/// Counters every cache operation feeds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Total number of lookups (`get`) made to the cache
    pub requests: u64,

    /// Number of lookups that found a live entry
    pub cache_hits: u64,

    /// Number of new entries stored
    pub insertions: u64,

    /// Number of `put` calls that replaced the value of a live entry
    pub updates: u64,

    /// Number of live entries removed by the eviction policy
    pub evictions: u64,

    /// Number of entries dropped because their deadline passed
    pub expirations: u64,

    /// Number of entries removed explicitly by the caller
    pub removals: u64,
}

impl CoreCacheMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup that found a live entry.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records a lookup that found nothing, or only an expired entry.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records a new key being stored.
    pub fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    /// Records a value replaced under an existing key.
    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    /// Records a live entry evicted to make room.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Records an expired entry being dropped.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    /// Records an entry removed by the caller.
    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Ratio of hits to requests, or 0.0 before the first request.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Ratio of misses to requests, or 0.0 before the first request.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            (self.requests - self.cache_hits) as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Convert core metrics to BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("expirations".to_string(), self.expirations as f64);
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("removals".to_string(), self.removals as f64);
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("updates".to_string(), self.updates as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.requests > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.requests as f64,
            );
        }

        metrics
    }
}

/// Uniform metrics reporting for caches.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification (e.g. "LRU", "LFU").
    fn algorithm_name(&self) -> &'static str;
}
