//! Concurrent Cache Benchmarks
//!
//! Benchmarks for measuring lock contention on the shared cache across
//! different access patterns and thread counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use policy_cache::{ConcurrentPolicyCache, EvictionPolicy};
use std::sync::Arc;
use std::thread;

const CACHE_SIZE: usize = 10_000;
const OPS_PER_THREAD: usize = 1_000;
const POLICIES: [EvictionPolicy; 2] = [EvictionPolicy::Lru, EvictionPolicy::Lfu];

fn make_filled(policy: EvictionPolicy) -> Arc<ConcurrentPolicyCache<usize, usize>> {
    let cache = Arc::new(ConcurrentPolicyCache::new(CACHE_SIZE, policy));
    for i in 0..CACHE_SIZE {
        cache.put(i, i, None);
    }
    cache
}

fn run_concurrent_reads(
    cache: Arc<ConcurrentPolicyCache<usize, usize>>,
    num_threads: usize,
    ops: usize,
) {
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ops {
                    black_box(cache.get(&((t * ops + i) % CACHE_SIZE)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn run_concurrent_writes(
    cache: Arc<ConcurrentPolicyCache<usize, usize>>,
    num_threads: usize,
    ops: usize,
) {
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ops {
                    let key = t * ops + i;
                    black_box(cache.put(key, key, None));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn run_concurrent_mixed(
    cache: Arc<ConcurrentPolicyCache<usize, usize>>,
    num_threads: usize,
    ops: usize,
) {
    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ops {
                    let key = (t * ops + i) % (CACHE_SIZE * 2);
                    // 80% reads, 20% writes
                    if i % 5 == 0 {
                        black_box(cache.put(key, i, None));
                    } else {
                        black_box(cache.get(&key));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Benchmark concurrent read operations under each policy
fn concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Reads");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    for policy in POLICIES {
        let cache = make_filled(policy);
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter(|| run_concurrent_reads(Arc::clone(&cache), 8, OPS_PER_THREAD));
        });
    }

    group.finish();
}

/// Benchmark concurrent write operations under each policy
fn concurrent_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Concurrent Writes");
    group.throughput(Throughput::Elements((8 * OPS_PER_THREAD) as u64));

    for policy in POLICIES {
        let cache = make_filled(policy);
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            b.iter(|| run_concurrent_writes(Arc::clone(&cache), 8, OPS_PER_THREAD));
        });
    }

    group.finish();
}

/// Benchmark a read-heavy mix while varying the thread count
fn thread_count_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Thread Count");

    for threads in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements((threads * OPS_PER_THREAD) as u64));
        let cache = make_filled(EvictionPolicy::Lfu);
        group.bench_with_input(BenchmarkId::new("LFU mixed", threads), &threads, |b, &threads| {
            b.iter(|| run_concurrent_mixed(Arc::clone(&cache), threads, OPS_PER_THREAD));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    concurrent_reads,
    concurrent_writes,
    thread_count_comparison
);
criterion_main!(benches);
