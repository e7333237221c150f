//! Property-based tests for the policy cache.
//!
//! Random operation sequences run against a cache on a manual clock, and the
//! cross-index invariants are checked after every step.

extern crate std;

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use std::vec::Vec;

use crate::clock::ManualClock;
use crate::config::PolicyCacheConfig;
use crate::metrics::CacheMetrics;
use crate::{DefaultHashBuilder, EvictionPolicy, PolicyCache};

// == Test Configuration ==
const KEY_SPACE: u8 = 24;
const MAX_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32, ttl: Option<u64> },
    Get { key: u8 },
    Remove { key: u8 },
    Advance { secs: u64 },
    Switch { policy: EvictionPolicy },
    Pop,
    Purge,
}

// == Strategies ==
fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![Just(EvictionPolicy::Lru), Just(EvictionPolicy::Lfu)]
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (0..KEY_SPACE, any::<u32>(), proptest::option::of(0..4u64))
            .prop_map(|(key, value, ttl)| CacheOp::Put { key, value, ttl }),
        4 => (0..KEY_SPACE).prop_map(|key| CacheOp::Get { key }),
        1 => (0..KEY_SPACE).prop_map(|key| CacheOp::Remove { key }),
        1 => (0..3u64).prop_map(|secs| CacheOp::Advance { secs }),
        1 => policy_strategy().prop_map(|policy| CacheOp::Switch { policy }),
        1 => Just(CacheOp::Pop),
        1 => Just(CacheOp::Purge),
    ]
}

/// Keys-only operations for comparing against a reference model.
#[derive(Debug, Clone)]
enum PlainOp {
    Put(u8, u32),
    Get(u8),
    Remove(u8),
}

fn plain_op_strategy() -> impl Strategy<Value = PlainOp> {
    prop_oneof![
        (0..KEY_SPACE, any::<u32>()).prop_map(|(k, v)| PlainOp::Put(k, v)),
        (0..KEY_SPACE).prop_map(PlainOp::Get),
        (0..KEY_SPACE).prop_map(PlainOp::Remove),
    ]
}

fn make_cache(
    capacity: usize,
    policy: EvictionPolicy,
) -> (PolicyCache<u8, u32, DefaultHashBuilder, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let cache = PolicyCache::with_clock(PolicyCacheConfig { capacity, policy }, clock.clone());
    (cache, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every index agrees with the entry table after every operation, and the
    // table never outgrows its capacity.
    #[test]
    fn prop_indices_stay_consistent(
        capacity in 0..=MAX_CAPACITY,
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..120),
    ) {
        let (mut cache, clock) = make_cache(capacity, policy);

        for op in ops {
            match op {
                CacheOp::Put { key, value, ttl } => {
                    cache.put(key, value, ttl.map(Duration::from_secs));
                }
                CacheOp::Get { key } => {
                    let _ = cache.get(&key);
                }
                CacheOp::Remove { key } => {
                    let _ = cache.remove(&key);
                }
                CacheOp::Advance { secs } => clock.advance(Duration::from_secs(secs)),
                CacheOp::Switch { policy } => cache.set_eviction_policy(policy),
                CacheOp::Pop => {
                    let _ = cache.pop();
                }
                CacheOp::Purge => {
                    cache.purge_expired();
                }
            }
            cache.assert_invariants();
            prop_assert!(cache.len() <= capacity);
        }

        let metrics = CacheMetrics::metrics(&cache);
        prop_assert_eq!(metrics["entries"], cache.len() as f64);
    }

    // With no expiry, LRU behaves exactly like a most-recent-first queue.
    #[test]
    fn prop_lru_matches_reference_queue(
        capacity in 1..=MAX_CAPACITY,
        ops in prop::collection::vec(plain_op_strategy(), 1..150),
    ) {
        let (mut cache, _clock) = make_cache(capacity, EvictionPolicy::Lru);
        let mut model: VecDeque<(u8, u32)> = VecDeque::new();

        for op in ops {
            match op {
                PlainOp::Put(key, value) => {
                    let expected = if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
                        let (_, old) = model.remove(pos).unwrap();
                        Some((key, old))
                    } else if model.len() == capacity {
                        model.pop_back()
                    } else {
                        None
                    };
                    model.push_front((key, value));
                    prop_assert_eq!(cache.put(key, value, None), expected);
                }
                PlainOp::Get(key) => {
                    let expected = model.iter().position(|(k, _)| *k == key).map(|pos| {
                        let entry = model.remove(pos).unwrap();
                        model.push_front(entry);
                        entry.1
                    });
                    prop_assert_eq!(cache.get(&key).copied(), expected);
                }
                PlainOp::Remove(key) => {
                    let expected = model
                        .iter()
                        .position(|(k, _)| *k == key)
                        .and_then(|pos| model.remove(pos))
                        .map(|(_, v)| v);
                    prop_assert_eq!(cache.remove(&key), expected);
                }
            }
        }

        let keys: Vec<u8> = cache.keys().copied().collect();
        let expected: Vec<u8> = model.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(keys, expected);
    }

    // An LFU eviction always takes an entry from the lowest hit count.
    #[test]
    fn prop_lfu_evicts_minimum_frequency(
        capacity in 1..=MAX_CAPACITY,
        ops in prop::collection::vec(plain_op_strategy(), 1..150),
    ) {
        let (mut cache, _clock) = make_cache(capacity, EvictionPolicy::Lfu);

        for op in ops {
            match op {
                PlainOp::Put(key, value) => {
                    let is_new = !cache.contains(&key);
                    let before: HashMap<u8, u64> = cache
                        .keys()
                        .map(|k| (*k, cache.frequency(k).unwrap_or_default()))
                        .collect();
                    let min_frequency = cache.min_frequency();

                    let result = cache.put(key, value, None);
                    if is_new {
                        if let Some((victim, _)) = result {
                            prop_assert_eq!(before.get(&victim).copied(), min_frequency);
                            prop_assert!(!cache.contains(&victim));
                        }
                    }
                }
                PlainOp::Get(key) => {
                    let _ = cache.get(&key);
                }
                PlainOp::Remove(key) => {
                    let _ = cache.remove(&key);
                }
            }
            cache.assert_invariants();
        }
    }
}
