//! # Command Queue Benchmark
//!
//! Measures the two submission paths:
//! - fire-and-forget push + batch drain (the setter-heavy frame path)
//! - push_and_sync round trip against a live consumer thread
//!
//! Run with: `cargo bench --package prism_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_core::CommandQueue;
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Benchmark: push N items, then drain them on the same thread.
fn bench_push_and_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_and_flush");

    for count in [100_u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let queue = CommandQueue::new();
                let sink = Arc::new(AtomicU64::new(0));
                for i in 0..count {
                    let sink = Arc::clone(&sink);
                    queue.push(move || {
                        sink.fetch_add(i, Ordering::Relaxed);
                    });
                }
                queue.flush_all();
                black_box(sink.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

/// Benchmark: blocking round trip to a dedicated consumer thread.
fn bench_push_and_sync_round_trip(c: &mut Criterion) {
    let queue = CommandQueue::new();
    let consumer = queue.clone();
    let stop = Arc::new(AtomicBool::new(false));

    let worker = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                consumer.wait_and_flush_one();
            }
        })
    };

    c.bench_function("push_and_sync_round_trip", |b| {
        b.iter(|| black_box(queue.push_and_sync(|| 42_u64)));
    });

    stop.store(true, Ordering::Release);
    // Wake the consumer one last time so it can observe the stop flag.
    queue.push(|| {});
    worker.join().unwrap();
}

criterion_group!(benches, bench_push_and_flush, bench_push_and_sync_round_trip);
criterion_main!(benches);
