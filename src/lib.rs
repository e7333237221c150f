//! # policy-cache
//!
//! A capacity-bounded in-memory cache whose eviction policy, LRU or LFU, can be
//! switched at runtime without losing or rebuilding entries, with optional
//! per-entry time-to-live.
//!
//! `get`, `put` and `remove` run in O(1) amortized time for entries without a
//! deadline. Entries with a deadline also pay O(log d) on insert, reschedule
//! and removal, where d is the number of distinct deadlines, because expiry
//! buckets are kept in deadline order. The cache keeps three intrusive indices
//! in step:
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!   key ───────────▶ │ entry: value, hit count,     │
//!   (entry table)    │        deadline              │
//!                    └──┬────────────┬───────────┬──┘
//!                       │            │           │
//!              recency list   frequency bucket  expiry bucket
//!              (MRU → LRU)    (by hit count)    (by deadline)
//! ```
//!
//! - **LRU** evicts the tail of the recency list.
//! - **LFU** evicts the oldest entry of the lowest hit-count bucket.
//! - **Expiry** is lazy: expired entries vanish when touched, and a full
//!   cache reclaims an expired entry before evicting a live one.
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_cache::{EvictionPolicy, PolicyCache};
//! use std::time::Duration;
//!
//! let mut cache = PolicyCache::new(2, EvictionPolicy::Lru);
//! cache.put(1, "one", None);
//! cache.put(2, "two", Some(Duration::from_secs(60)));
//! assert_eq!(cache.get(&1), Some(&"one"));
//!
//! // 2 is now the least recently used entry
//! assert_eq!(cache.put(3, "three", None), Some((2, "two")));
//!
//! // Later evictions follow hit counts instead
//! cache.set_eviction_policy(EvictionPolicy::Lfu);
//! assert_eq!(cache.put(4, "four", None), Some((3, "three")));
//! ```
//!
//! ## Deterministic Time
//!
//! Deadlines are measured on a [`Clock`]. Tests can drive a
//! [`ManualClock`] by hand:
//!
//! ```rust
//! use policy_cache::clock::ManualClock;
//! use policy_cache::config::PolicyCacheConfig;
//! use policy_cache::PolicyCache;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let mut cache = PolicyCache::with_clock(PolicyCacheConfig::new(8), clock.clone());
//! cache.put("session", 42, Some(Duration::from_secs(5)));
//!
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(cache.get(&"session"), None);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `hashbrown` | yes | Use `hashbrown` maps (required without `std`) |
//! | `std` | yes | `MonotonicClock`, std support for `tracing` and `thiserror` |
//! | `concurrent` | yes | [`ConcurrentPolicyCache`] behind a `parking_lot` mutex |
//! | `nightly` | no | Forwards to `hashbrown/nightly` |
//!
//! ## Modules
//!
//! - [`cache`]: The single-threaded [`PolicyCache`]
//! - [`concurrent`]: The lock-guarded [`ConcurrentPolicyCache`]
//! - [`config`]: Cache configuration
//! - [`clock`]: Time sources for expiry
//! - [`metrics`]: Counters and the [`CacheMetrics`] reporting trait

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(not(any(feature = "hashbrown", feature = "std")))]
compile_error!("policy-cache needs either the `hashbrown` or the `std` feature for its hash maps");

#[cfg(test)]
extern crate scoped_threadpool;

/// Doubly linked list shared by all indices.
///
/// Internal infrastructure built on raw pointers.
pub(crate) mod list;

pub(crate) mod entry;
pub(crate) mod expiry;
pub(crate) mod frequency;
pub(crate) mod recency;

/// The cache itself.
pub mod cache;

/// Time sources for entry expiry.
pub mod clock;

/// Cache configuration structures.
pub mod config;

/// Crate error type.
pub mod error;

/// Cache metrics system.
pub mod metrics;

/// Eviction policy selection.
pub mod policy;

/// Thread-safe cache wrapper.
///
/// Available when the `concurrent` feature is enabled.
#[cfg(feature = "concurrent")]
pub mod concurrent;

#[cfg(test)]
mod property_tests;

pub use cache::{DefaultHashBuilder, PolicyCache};
pub use clock::{Clock, ManualClock};
pub use config::PolicyCacheConfig;
pub use error::{Error, Result};
pub use metrics::CacheMetrics;
pub use policy::EvictionPolicy;

#[cfg(feature = "std")]
pub use clock::MonotonicClock;

#[cfg(feature = "concurrent")]
pub use concurrent::ConcurrentPolicyCache;
