//! Publish Performance Benchmarks
//!
//! Measures synchronous fan-out cost as the subscriber count grows, the
//! overhead of history retention, and registry lookup cost with many feeds.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use feedhub::feeds::{Feed, HistoryLimit, Registry, RegistryConfig};

/// Benchmark fan-out to an increasing number of subscribers
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for subscribers in [1usize, 10, 100, 1000] {
        let feed = Feed::<u64>::new("bench");
        let counter = Arc::new(AtomicU64::new(0));
        for i in 0..subscribers {
            let counter = Arc::clone(&counter);
            feed.subscribe(format!("subscriber_{}", i), move |item| {
                counter.fetch_add(*item.value(), Ordering::Relaxed);
                Ok(())
            });
        }

        group
            .throughput(Throughput::Elements(subscribers as u64))
            .bench_with_input(
                BenchmarkId::new("subscribers", subscribers),
                &subscribers,
                |b, _| b.iter(|| feed.publish(black_box(1)).unwrap()),
            );
    }

    group.finish();
}

/// Benchmark publish cost under each retention policy
fn bench_history_retention(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_retention");

    let policies = [
        ("disabled", HistoryLimit::Disabled),
        ("capped_1024", HistoryLimit::Capped(1024)),
        ("unbounded", HistoryLimit::Unbounded),
    ];

    for (label, history) in policies {
        let config = RegistryConfig {
            history,
            ..RegistryConfig::default()
        };
        let feed = Feed::<u64>::with_config("bench", &config);

        group.bench_function(label, |b| {
            b.iter(|| feed.publish(black_box(42)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark registry resolution with many registered feeds
fn bench_registry_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_publish");

    for feeds in [1usize, 100, 10_000] {
        let registry = Registry::with_config(RegistryConfig {
            history: HistoryLimit::Disabled,
            ..RegistryConfig::default()
        });
        for i in 0..feeds {
            registry.create_feed::<u64>(&format!("feed_{}", i), false).unwrap();
        }
        let target = format!("feed_{}", feeds / 2);

        group.bench_with_input(BenchmarkId::new("feeds", feeds), &target, |b, target| {
            b.iter(|| registry.publish(target, black_box(7u64)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_history_retention, bench_registry_publish);
criterion_main!(benches);
