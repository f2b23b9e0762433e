//! # Pool Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - Warm reference pool acquire/release cheaper than a fresh allocation
//! - Spawn/unspawn on a 64-entry pool well under a microsecond
//! - Manager tick over idle pools effectively free
//!
//! Run with: `cargo bench --package oroboros_pool`

// Benchmarks don't need docs and may have intentionally unused code
#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use oroboros_pool::{Clock, ManualClock, ObjectPoolManager, PoolResource, Reference, ReferencePool};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Packet {
    sequence: u32,
    payload: Vec<u8>,
}

impl Reference for Packet {
    fn clear(&mut self) {
        self.sequence = 0;
        self.payload.clear();
    }
}

struct Particle {
    id: u32,
}

impl PoolResource for Particle {
    type Handle = u32;

    fn handle(&self) -> u32 {
        self.id
    }

    fn on_release(self, _is_shutdown: bool) {}
}

/// Benchmark: warm reference pool vs. fresh allocation.
fn bench_reference_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_pool");

    let pool = ReferencePool::new();
    pool.add::<Packet>(64);

    group.bench_function("acquire_release_warm", |b| {
        b.iter(|| {
            let mut packet = pool.acquire::<Packet>();
            packet.sequence = 7;
            packet.payload.extend_from_slice(&[0u8; 256]);
            black_box(&packet);
            pool.release(packet);
        });
    });

    group.bench_function("fresh_allocation", |b| {
        b.iter(|| {
            let mut packet = Packet::default();
            packet.sequence = 7;
            packet.payload.extend_from_slice(&[0u8; 256]);
            black_box(packet)
        });
    });

    group.finish();
}

/// Benchmark: spawn/unspawn cycle by pool size.
fn bench_spawn_unspawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_unspawn");

    for size in [8u32, 64, 512] {
        let clock = Arc::new(ManualClock::new());
        let mut manager = ObjectPoolManager::new(
            Arc::new(ReferencePool::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        let pool = manager
            .create::<Particle>(usize::MAX, Some(Duration::from_secs(60)), false)
            .unwrap();
        for id in 0..size {
            let entry = pool.create_entry("spark", Particle { id });
            pool.register(entry, true).unwrap();
        }
        // Leave only the last entry idle so every spawn scans the whole pool
        pool.unspawn(size - 1).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let pool = manager.get::<Particle>().unwrap();
                let handle = pool.spawn("spark").and_then(|e| e.handle()).unwrap();
                pool.unspawn(black_box(handle)).unwrap();
                black_box(size)
            });
        });
    }

    group.finish();
}

/// Benchmark: manager tick over many idle pools.
fn bench_manager_update(c: &mut Criterion) {
    let clock = Arc::new(ManualClock::new());
    let mut manager = ObjectPoolManager::new(
        Arc::new(ReferencePool::new()),
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let pool = manager
        .create::<Particle>(16, Some(Duration::from_secs(30)), false)
        .unwrap();
    for id in 0..16 {
        let entry = pool.create_entry("ember", Particle { id });
        pool.register(entry, false).unwrap();
    }

    let frame = Duration::from_micros(16_666);
    c.bench_function("manager_update_60hz", |b| {
        b.iter(|| {
            manager.update(black_box(frame), black_box(frame));
        });
    });
}

criterion_group!(
    benches,
    bench_reference_pool,
    bench_spawn_unspawn,
    bench_manager_update,
);

criterion_main!(benches);
