//! Benchmarks for the runtime's hot paths.
//!
//! Benchmarks cover:
//! - Priority queue push/pop with mixed priorities
//! - Memo cache inserts under FIFO eviction and memoized hits
//! - Bounded executor dispatch throughput

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use frameloop::core::{BoundedExecutor, Spawn};
use frameloop::infra::cache::{memoize, MemoCache};
use frameloop::infra::queue::PriorityQueue;

use tokio::runtime::Runtime;

// ============================================================================
// Helpers
// ============================================================================

#[derive(Clone)]
struct TokioSpawner;

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue_push_pop");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut q = PriorityQueue::new();
                for i in 0..size {
                    let priority = match i % 4 {
                        0 => 100,
                        1 => 50,
                        2 => 10,
                        _ => 0,
                    };
                    q.push(priority, i);
                }
                while let Some(item) = q.pop() {
                    black_box(item);
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Cache Benchmarks
// ============================================================================

fn bench_memo_cache_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo_cache_eviction");

    for capacity in [16_usize, 256, 4_096] {
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let mut cache = MemoCache::new(capacity).unwrap();
                    for i in 0..10_000_u32 {
                        black_box(cache.insert(i.to_string(), i));
                    }
                    black_box(cache.len());
                });
            },
        );
    }
    group.finish();
}

fn bench_memoized_hits(c: &mut Criterion) {
    let square = memoize(|x: (u32, u32)| u64::from(x.0) * u64::from(x.1), 128).unwrap();
    for i in 0..128 {
        square.call((i, i)).unwrap();
    }

    c.bench_function("memoized_hit", |b| {
        let mut i = 0_u32;
        b.iter(|| {
            i = (i + 1) % 128;
            black_box(square.call((i, i)).unwrap());
        });
    });
}

// ============================================================================
// Executor Benchmarks
// ============================================================================

fn bench_executor_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("executor_dispatch");
    group.measurement_time(Duration::from_secs(5));

    for concurrency in [1_usize, 4, 16] {
        group.throughput(Throughput::Elements(500));
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, &concurrency| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let executor = BoundedExecutor::new(concurrency, TokioSpawner).unwrap();
                    for i in 0..500_u32 {
                        executor.add(move || async move {
                            black_box(i);
                            Ok(())
                        });
                    }
                    executor.wait_idle().await;
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_queue_push_pop,
    bench_memo_cache_eviction,
    bench_memoized_hits,
    bench_executor_dispatch,
);
criterion_main!(benches);
