use crate::common::configure_criterion;
use criterion::{criterion_group, Criterion};
use std::hint::black_box;
use std::time::Duration;
use storage_rail::CircuitBreaker;

pub fn bench_breaker_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("breaker");

    group.bench_function("closed_admit_success", |b| {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        b.iter(|| {
            if let Some(permit) = breaker.try_acquire() {
                permit.success();
            }
        })
    });

    group.bench_function("open_reject", |b| {
        let breaker = CircuitBreaker::new(1, Duration::from_secs(3600));
        if let Some(permit) = breaker.try_acquire() {
            permit.failure();
        }
        b.iter(|| black_box(breaker.try_acquire().is_none()))
    });

    group.bench_function("state_read", |b| {
        let breaker = CircuitBreaker::new(5, Duration::from_secs(30));
        b.iter(|| black_box(breaker.state()))
    });

    group.finish();
}

criterion_group! {
    name = breaker_benches;
    config = configure_criterion();
    targets = bench_breaker_admission,
}
