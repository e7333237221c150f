//! Policy Cache Metrics
//!
//! Metrics specific to a cache whose eviction policy can change at runtime.

extern crate alloc;

use super::CoreCacheMetrics;
use crate::policy::EvictionPolicy;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Policy-aware metrics (extends CoreCacheMetrics)
///
/// Evictions are split by the policy that chose the victim, so the effect of
/// a policy switch shows up in the counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PolicyCacheMetrics {
    /// Core metrics common to all cache algorithms
    pub core: CoreCacheMetrics,

    /// Victims chosen by recency
    pub lru_evictions: u64,

    /// Victims chosen by frequency
    pub lfu_evictions: u64,

    /// Number of moves from one frequency bucket to the next
    pub frequency_promotions: u64,

    /// Number of `set_eviction_policy` calls that changed the policy
    pub policy_switches: u64,

    /// Highest hit count any entry has reached
    pub max_frequency: u64,
}

impl PolicyCacheMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an eviction made under `policy`.
    pub fn record_eviction(&mut self, policy: EvictionPolicy) {
        self.core.record_eviction();
        match policy {
            EvictionPolicy::Lru => self.lru_evictions += 1,
            EvictionPolicy::Lfu => self.lfu_evictions += 1,
        }
    }

    /// Records an entry reaching `new_frequency`.
    pub fn record_promotion(&mut self, new_frequency: u64) {
        self.frequency_promotions += 1;
        self.max_frequency = self.max_frequency.max(new_frequency);
    }

    /// Records a change of eviction policy.
    pub fn record_policy_switch(&mut self) {
        self.policy_switches += 1;
    }

    /// Converts the metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();

        metrics.insert("lru_evictions".to_string(), self.lru_evictions as f64);
        metrics.insert("lfu_evictions".to_string(), self.lfu_evictions as f64);
        metrics.insert(
            "frequency_promotions".to_string(),
            self.frequency_promotions as f64,
        );
        metrics.insert("policy_switches".to_string(), self.policy_switches as f64);
        metrics.insert("max_frequency".to_string(), self.max_frequency as f64);

        if self.core.cache_hits > 0 {
            metrics.insert(
                "promotions_per_hit".to_string(),
                self.frequency_promotions as f64 / self.core.cache_hits as f64,
            );
        }

        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evictions_split_by_policy() {
        let mut metrics = PolicyCacheMetrics::new();
        metrics.record_eviction(EvictionPolicy::Lru);
        metrics.record_eviction(EvictionPolicy::Lfu);
        metrics.record_eviction(EvictionPolicy::Lfu);

        assert_eq!(metrics.core.evictions, 3);
        assert_eq!(metrics.lru_evictions, 1);
        assert_eq!(metrics.lfu_evictions, 2);
    }

    #[test]
    fn test_max_frequency_only_grows() {
        let mut metrics = PolicyCacheMetrics::new();
        metrics.record_promotion(5);
        metrics.record_promotion(2);
        assert_eq!(metrics.max_frequency, 5);
        assert_eq!(metrics.frequency_promotions, 2);

        let map = metrics.to_btreemap();
        assert_eq!(map["max_frequency"], 5.0);
        assert!(!map.contains_key("promotions_per_hit"));
    }
}
