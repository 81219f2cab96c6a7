use crate::common::configure_criterion;
use criterion::{criterion_group, Criterion};

#[cfg(feature = "tower")]
use core::future::{ready, Ready};
#[cfg(feature = "tower")]
use std::hint::black_box;
#[cfg(feature = "tower")]
use std::sync::Arc;
#[cfg(feature = "tower")]
use std::time::Duration;
#[cfg(feature = "tower")]
use storage_rail::tower::CircuitBreakerLayer;
#[cfg(feature = "tower")]
use storage_rail::CircuitBreaker;
#[cfg(feature = "tower")]
use tokio::runtime::Runtime;
#[cfg(feature = "tower")]
use tower::{Service, ServiceBuilder, ServiceExt};

#[cfg(feature = "tower")]
#[derive(Clone)]
struct EchoService;

#[cfg(feature = "tower")]
impl Service<u64> for EchoService {
    type Response = u64;
    type Error = std::io::Error;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: u64) -> Self::Future {
        ready(Ok(req))
    }
}

#[cfg(feature = "tower")]
pub fn bench_tower_layer_overhead(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("tower/layer");

    group.bench_function("baseline_raw_service", |b| {
        let mut svc = EchoService;
        b.iter(|| {
            rt.block_on(async {
                let _ = black_box(svc.call(1).await);
            })
        })
    });

    group.bench_function("circuit_breaker_layer_success", |b| {
        let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
        let mut svc = ServiceBuilder::new()
            .layer(CircuitBreakerLayer::new(breaker))
            .service(EchoService);

        b.iter(|| {
            rt.block_on(async {
                let _ = black_box(svc.ready().await.unwrap().call(1).await);
            })
        })
    });

    group.finish();
}

#[cfg(feature = "tower")]
criterion_group! {
    name = tower_benches;
    config = configure_criterion();
    targets = bench_tower_layer_overhead,
}

#[cfg(not(feature = "tower"))]
criterion_group! {
    name = tower_benches;
    config = configure_criterion();
    targets = dummy
}

#[cfg(not(feature = "tower"))]
fn dummy(_c: &mut Criterion) {}
