//! Cache Configuration Module
//!
//! Configuration structs have all public fields for simple instantiation:
//! create the struct with every field set and hand it to
//! [`PolicyCache::init`](crate::PolicyCache::init).
//!
//! # Sizing
//!
//! `capacity` bounds the number of live entries. Each entry carries three
//! index nodes on top of its key and value (roughly 100-150 bytes of
//! overhead), so size the capacity from your memory budget:
//!
//! ```text
//! capacity ≈ budget / (average_key + average_value + overhead_per_entry)
//! ```
//!
//! A capacity of zero is accepted; such a cache stores nothing.
//!
//! # Examples
//!
//! ```
//! use policy_cache::config::PolicyCacheConfig;
//! use policy_cache::{EvictionPolicy, PolicyCache};
//!
//! let config = PolicyCacheConfig {
//!     capacity: 10_000,
//!     policy: EvictionPolicy::Lfu,
//! };
//! let cache: PolicyCache<String, Vec<u8>> = PolicyCache::init(config, None);
//! assert_eq!(cache.cap(), 10_000);
//! ```

use crate::policy::EvictionPolicy;
use core::fmt;

/// Configuration for a [`PolicyCache`](crate::PolicyCache).
///
/// # Fields
///
/// - `capacity`: Maximum number of entries the cache can hold.
/// - `policy`: Eviction policy active when the cache is created. It can be
///   changed later with `set_eviction_policy`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PolicyCacheConfig {
    /// Maximum number of key-value pairs the cache can hold.
    pub capacity: usize,
    /// Initial eviction policy.
    pub policy: EvictionPolicy,
}

impl PolicyCacheConfig {
    /// An LRU configuration with the given capacity.
    pub const fn new(capacity: usize) -> Self {
        PolicyCacheConfig {
            capacity,
            policy: EvictionPolicy::Lru,
        }
    }

    /// Returns the configuration with `policy` as the initial policy.
    pub const fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl fmt::Debug for PolicyCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyCacheConfig")
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = PolicyCacheConfig {
            capacity: 1000,
            policy: EvictionPolicy::Lfu,
        };
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.policy, EvictionPolicy::Lfu);
    }

    #[test]
    fn test_config_defaults_to_lru() {
        let config = PolicyCacheConfig::new(8);
        assert_eq!(config.policy, EvictionPolicy::Lru);
        assert_eq!(
            config.with_policy(EvictionPolicy::Lfu),
            PolicyCacheConfig {
                capacity: 8,
                policy: EvictionPolicy::Lfu,
            }
        );
    }
}
