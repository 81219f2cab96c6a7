use criterion::criterion_main;

mod backoff;
mod breaker;
mod common;
mod retry;
mod tower;

criterion_main!(
    backoff::backoff_benches,
    retry::retry_benches,
    breaker::breaker_benches,
    tower::tower_benches,
);
