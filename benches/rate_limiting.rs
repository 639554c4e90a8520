#![allow(clippy::all)]
//! Benchmarks for the sliding-window store.
//!
//! Tests: single-key admit throughput, cross-key shard spread, contended
//! concurrent admits, sweep cost.

use aegis_gateway::modules::rate_limiting::{Quota, SlidingWindowStore, StoreConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn bench_single_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiting/single_key");

    group.bench_function("try_admit_under_ceiling", |b| {
        let store = SlidingWindowStore::with_defaults();
        let quota = Quota::new(u64::MAX, Duration::from_secs(60));
        b.iter(|| {
            black_box(store.try_admit("bench:key", &quota));
        });
    });

    group.bench_function("try_admit_exhausted", |b| {
        let store = SlidingWindowStore::with_defaults();
        let quota = Quota::new(10, Duration::from_secs(3600));
        for _ in 0..10 {
            let _ = store.try_admit("bench:key", &quota);
        }
        b.iter(|| {
            black_box(store.try_admit("bench:key", &quota));
        });
    });

    group.finish();
}

fn bench_many_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiting/many_keys");
    let quota = Quota::new(1000, Duration::from_secs(60));

    for key_count in [100usize, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("round_robin_admit", key_count),
            &key_count,
            |b, &key_count| {
                let store = SlidingWindowStore::with_defaults();
                let keys: Vec<String> =
                    (0..key_count).map(|i| format!("guest:10.0.{}.{}", i / 256, i % 256)).collect();
                let mut next = 0usize;
                b.iter(|| {
                    black_box(store.try_admit(&keys[next], &quota));
                    next = (next + 1) % keys.len();
                });
            },
        );
    }

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiting/contention");

    group.bench_function("eight_threads_one_key", |b| {
        b.iter(|| {
            let store = Arc::new(SlidingWindowStore::with_defaults());
            let quota = Quota::new(u64::MAX, Duration::from_secs(60));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let store = Arc::clone(&store);
                    let quota = quota.clone();
                    std::thread::spawn(move || {
                        for _ in 0..100 {
                            let _ = store.try_admit("hot:key", &quota);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            black_box(store.total_checks())
        });
    });

    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("rate_limiting/sweep");
    let quota = Quota::new(1000, Duration::from_secs(60));

    group.bench_function("sweep_10k_active_keys", |b| {
        let store = SlidingWindowStore::new(StoreConfig {
            max_idle: Duration::from_secs(3600),
            ..Default::default()
        });
        for i in 0..10_000 {
            let _ = store.try_admit(&format!("guest:10.1.{}.{}", i / 256, i % 256), &quota);
        }
        b.iter(|| {
            store.sweep();
            black_box(store.active_keys())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_key,
    bench_many_keys,
    bench_contention,
    bench_sweep
);
criterion_main!(benches);
