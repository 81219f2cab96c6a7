use crate::common::{configure_criterion, permanent_error, transient_error, wrapped_io_error};
use criterion::{criterion_group, Criterion};
use std::hint::black_box;
use std::time::Duration;
use storage_rail::classify::default_should_retry;
use storage_rail::{retry_uncancellable, FixedDelay, RetryConfig, StorageError};
use tokio::runtime::Runtime;

pub fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("retry/classify");

    let transient = transient_error();
    let permanent = permanent_error();
    let wrapped = wrapped_io_error();

    group.bench_function("storage_transient", |b| {
        b.iter(|| black_box(default_should_retry(black_box(&transient))))
    });

    group.bench_function("storage_permanent", |b| {
        b.iter(|| black_box(default_should_retry(black_box(&permanent))))
    });

    group.bench_function("source_chain_walk", |b| {
        b.iter(|| black_box(default_should_retry(black_box(&wrapped))))
    });

    group.finish();
}

pub fn bench_retry_executor(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("retry/executor");
    let config: RetryConfig<StorageError> = RetryConfig::new(3, FixedDelay::new(Duration::ZERO));

    group.bench_function("first_attempt_success", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = retry_uncancellable(&config, || async { Ok::<_, StorageError>(42) }).await;
                let _ = black_box(result);
            })
        })
    });

    group.bench_function("permanent_short_circuit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result =
                    retry_uncancellable(&config, || async { Err::<(), _>(permanent_error()) }).await;
                let _ = black_box(result);
            })
        })
    });

    group.bench_function("exhausted_zero_delay", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result =
                    retry_uncancellable(&config, || async { Err::<(), _>(transient_error()) }).await;
                let _ = black_box(result);
            })
        })
    });

    group.finish();
}

criterion_group! {
    name = retry_benches;
    config = configure_criterion();
    targets = bench_classification, bench_retry_executor,
}
