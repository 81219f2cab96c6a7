//! Puts a circuit breaker in front of a tower service.
//!
//! Run with `cargo run --example tower_breaker --features tower`.

use std::sync::Arc;
use std::time::Duration;

use storage_rail::tower::CircuitBreakerLayer;
use storage_rail::CircuitBreaker;
use tower::{service_fn, ServiceBuilder, ServiceExt};

#[tokio::main]
async fn main() {
    let breaker = Arc::new(CircuitBreaker::new(2, Duration::from_millis(200)));

    let service = ServiceBuilder::new()
        .layer(CircuitBreakerLayer::new(Arc::clone(&breaker)))
        .service(service_fn(|key: &'static str| async move {
            if key.starts_with("bad") {
                Err("upstream refused")
            } else {
                Ok(format!("fetched {key}"))
            }
        }));

    for key in ["a", "bad-1", "bad-2", "b"] {
        let result = service.clone().oneshot(key).await;
        println!("{key}: {result:?} (breaker {:?})", breaker.state());
    }

    tokio::time::sleep(Duration::from_millis(250)).await;
    let result = service.clone().oneshot("c").await;
    println!("after cooldown: {result:?} (breaker {:?})", breaker.state());
}
