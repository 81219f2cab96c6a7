use crate::common::configure_criterion;
use criterion::{criterion_group, Criterion};
use std::hint::black_box;
use std::time::Duration;
use storage_rail::{Backoff, ExponentialBackoff, FixedDelay};

pub fn bench_backoff_durations(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff");

    let jittered = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(30));
    let plain = jittered.clone().with_jitter(0.0);
    let fixed = FixedDelay::new(Duration::from_millis(250));

    group.bench_function("exponential_jittered", |b| {
        b.iter(|| {
            for attempt in 0..10 {
                black_box(jittered.duration(black_box(attempt)));
            }
        })
    });

    group.bench_function("exponential_no_jitter", |b| {
        b.iter(|| {
            for attempt in 0..10 {
                black_box(plain.duration(black_box(attempt)));
            }
        })
    });

    // Deep attempts hit the saturation path.
    group.bench_function("exponential_saturated", |b| {
        b.iter(|| black_box(plain.duration(black_box(500))))
    });

    group.bench_function("fixed", |b| b.iter(|| black_box(fixed.duration(black_box(3)))));

    group.finish();
}

criterion_group! {
    name = backoff_benches;
    config = configure_criterion();
    targets = bench_backoff_durations,
}
