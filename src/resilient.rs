//! Resilient storage wrapper.
//!
//! [`ResilientStorage`] implements [`Storage`] on top of another backend.
//! Each request/response capability runs through the retry executor, which in
//! turn runs inside the circuit breaker when one is attached:
//!
//! ```text
//! caller → breaker admission → retry loop → backend
//!                ↑                  │
//!                └── outcome ───────┘
//! ```
//!
//! Streaming capabilities bypass both layers: a partially consumed or
//! partially written stream cannot be replayed safely. Lifecycle capabilities
//! (`kind`, `close`) pass straight through as well.
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storage_rail::{CircuitBreaker, ExponentialBackoff, ResilientStorage, RetryConfig};
//!
//! let breaker = Arc::new(CircuitBreaker::new(5, Duration::from_secs(30)));
//! let storage = ResilientStorage::new(backend, RetryConfig::new(3, ExponentialBackoff::default()))
//!     .with_breaker(breaker);
//!
//! let note = storage.read("notes/today.md").await?;
//! ```

use core::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::breaker::CircuitBreaker;
use crate::error::{BreakerError, Operation, RetryError, StorageError};
use crate::retry::{retry, RetryConfig};
use crate::storage::{ByteReader, FileInfo, Storage};

/// A [`Storage`] decorator adding retry, backoff and circuit breaking.
#[derive(Debug, Clone)]
pub struct ResilientStorage<S> {
    inner: S,
    retry: RetryConfig<StorageError>,
    breaker: Option<Arc<CircuitBreaker>>,
    cancel: CancellationToken,
}

impl<S> ResilientStorage<S> {
    /// Wraps `inner` with retry only.
    pub fn new(inner: S, retry: RetryConfig<StorageError>) -> Self {
        Self { inner, retry, breaker: None, cancel: CancellationToken::new() }
    }

    /// Gates every wrapped call through `breaker`.
    ///
    /// The breaker may be shared with other wrappers around the same dependency.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Uses `cancel` to interrupt backoff waits.
    ///
    /// The token covers every call made through this wrapper and stays
    /// cancelled once fired: afterwards each call makes a single attempt and a
    /// retryable failure returns [`StorageError::Cancelled`]. To scope
    /// cancellation to one request, clone the wrapper and attach a child token
    /// (`parent.child_token()`) to the clone.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    #[inline]
    pub fn retry_config(&self) -> &RetryConfig<StorageError> {
        &self.retry
    }

    #[inline]
    pub fn breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }

    #[inline]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Consumes the wrapper and returns the inner backend.
    #[inline]
    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn run<T, F, Fut>(
        &self,
        operation: Operation,
        path: &str,
        call: F,
    ) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let span = tracing::debug_span!("storage_call", %operation, path);
        let retried = || retry(&self.retry, &self.cancel, call);
        let result = match &self.breaker {
            // A cancelled caller says nothing about the dependency's health.
            Some(breaker) => {
                breaker
                    .call_with(retried, |e: &RetryError<StorageError>| !e.is_cancelled())
                    .instrument(span)
                    .await
            },
            None => retried().instrument(span).await.map_err(BreakerError::Inner),
        };
        result.map_err(|e| {
            let err = StorageError::from_resilience(operation, e);
            tracing::debug!(%operation, path, error = %err, "storage call failed");
            err
        })
    }
}

impl<S: Storage> Storage for ResilientStorage<S> {
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.run(Operation::Read, path, || self.inner.read(path)).await
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.run(Operation::Write, path, || self.inner.write(path, data)).await
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.run(Operation::Delete, path, || self.inner.delete(path)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.run(Operation::List, prefix, || self.inner.list(prefix)).await
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.run(Operation::Exists, path, || self.inner.exists(path)).await
    }

    async fn stat(&self, path: &str) -> Result<FileInfo, StorageError> {
        self.run(Operation::Stat, path, || self.inner.stat(path)).await
    }

    async fn copy(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.run(Operation::Copy, src, || self.inner.copy(src, dst)).await
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<(), StorageError> {
        self.run(Operation::Move, src, || self.inner.rename(src, dst)).await
    }

    async fn health(&self) -> Result<(), StorageError> {
        self.run(Operation::Health, "", || self.inner.health()).await
    }

    async fn read_stream(&self, path: &str) -> Result<ByteReader, StorageError> {
        self.inner.read_stream(path).await
    }

    async fn write_stream(&self, path: &str, reader: ByteReader) -> Result<u64, StorageError> {
        self.inner.write_stream(path, reader).await
    }

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.inner.close().await
    }
}
