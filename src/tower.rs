//! Tower integration.
//!
//! [`CircuitBreakerLayer`] gates any tower [`Service`] through a shared
//! [`CircuitBreaker`]. Rejected calls resolve immediately to
//! [`BreakerError::Open`] without reaching the inner service.
//!
//! # Feature Flag
//!
//! Requires the `tower` feature:
//!
//! ```toml
//! [dependencies]
//! storage-rail = { version = "0.1", features = ["tower"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storage_rail::tower::CircuitBreakerLayer;
//! use tower::ServiceBuilder;
//!
//! let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
//! let service = ServiceBuilder::new()
//!     .layer(CircuitBreakerLayer::new(breaker))
//!     .service(object_store_client);
//! ```

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;

use futures_core::future::FusedFuture;
use pin_project_lite::pin_project;
use tower::{Layer, Service};

use crate::breaker::{BreakerPermit, CircuitBreaker};
use crate::error::BreakerError;

/// A Tower [`Layer`] that wraps services in a [`CircuitBreakerService`].
#[derive(Clone, Debug)]
pub struct CircuitBreakerLayer {
    breaker: Arc<CircuitBreaker>,
}

impl CircuitBreakerLayer {
    /// Creates a layer sharing `breaker` across every service it wraps.
    #[inline]
    pub const fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self { breaker }
    }

    #[inline]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<S> Layer<S> for CircuitBreakerLayer {
    type Service = CircuitBreakerService<S>;

    #[inline]
    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreakerService { inner, breaker: Arc::clone(&self.breaker) }
    }
}

/// A Tower [`Service`] that asks a circuit breaker before every call.
///
/// Every inner error counts as a dependency failure.
#[derive(Clone, Debug)]
pub struct CircuitBreakerService<S> {
    inner: S,
    breaker: Arc<CircuitBreaker>,
}

impl<S> CircuitBreakerService<S> {
    #[inline]
    pub const fn new(inner: S, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }

    #[inline]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    #[inline]
    pub fn into_inner(self) -> S {
        self.inner
    }

    #[inline]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<S, Request> Service<Request> for CircuitBreakerService<S>
where
    S: Service<Request>,
{
    type Response = S::Response;
    type Error = BreakerError<S::Error>;
    type Future = CircuitBreakerFuture<S::Future>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(BreakerError::Inner)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        match self.breaker.try_acquire_owned() {
            Some(permit) => CircuitBreakerFuture::admitted(self.inner.call(request), permit),
            None => {
                tracing::debug!("circuit breaker open, rejecting request");
                CircuitBreakerFuture::rejected()
            },
        }
    }
}

pin_project! {
    /// Future returned by [`CircuitBreakerService`].
    ///
    /// Records the inner outcome on the breaker. Dropping it before completion
    /// records nothing and frees a half-open trial slot.
    #[must_use = "futures do nothing unless polled"]
    pub struct CircuitBreakerFuture<F> {
        #[pin]
        inner: Option<F>,
        permit: Option<BreakerPermit<Arc<CircuitBreaker>>>,
        terminated: bool,
    }
}

impl<F> CircuitBreakerFuture<F> {
    fn admitted(inner: F, permit: BreakerPermit<Arc<CircuitBreaker>>) -> Self {
        Self { inner: Some(inner), permit: Some(permit), terminated: false }
    }

    fn rejected() -> Self {
        Self { inner: None, permit: None, terminated: false }
    }
}

impl<F, T, E> Future for CircuitBreakerFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, BreakerError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        let Some(inner) = this.inner.as_pin_mut() else {
            *this.terminated = true;
            return Poll::Ready(Err(BreakerError::Open));
        };

        let output = match inner.poll(cx) {
            Poll::Ready(output) => output,
            Poll::Pending => return Poll::Pending,
        };
        *this.terminated = true;
        match output {
            Ok(response) => {
                if let Some(permit) = this.permit.take() {
                    permit.success();
                }
                Poll::Ready(Ok(response))
            },
            Err(error) => {
                if let Some(permit) = this.permit.take() {
                    permit.failure();
                }
                Poll::Ready(Err(BreakerError::Inner(error)))
            },
        }
    }
}

impl<F, T, E> FusedFuture for CircuitBreakerFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    #[inline]
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Extension trait for wrapping a service in a circuit breaker.
pub trait ServiceBreakerExt<Request>: Service<Request> + Sized {
    /// Gates this service through `breaker`.
    fn with_circuit_breaker(self, breaker: Arc<CircuitBreaker>) -> CircuitBreakerService<Self> {
        CircuitBreakerService::new(self, breaker)
    }
}

impl<S, Request> ServiceBreakerExt<Request> for S where S: Service<Request> {}
