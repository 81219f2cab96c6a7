//! Retry, jittered backoff and circuit breaking for pluggable storage backends.
//!
//! The crate is organised leaves first:
//!
//! - [`backoff`]: attempt number → wait duration
//! - [`classify`]: is this failure worth retrying?
//! - [`retry`](mod@retry): generic retry loop with cancellable backoff waits
//! - [`breaker`]: lock-guarded circuit breaker
//! - [`resilient`]: [`Storage`] decorator composing all of the above
//!
//! Each submodule re-exports its public surface from here, so consumers can
//! simply depend on `storage_rail::*` or pick focused pieces as needed.
//!
//! # Examples
//!
//! ## Retrying a single call
//!
//! ```
//! use core::time::Duration;
//! use storage_rail::{retry, BackendError, FixedDelay, Operation, RetryConfig, RetryError};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RetryConfig::new(3, FixedDelay::new(Duration::from_millis(1)));
//! let token = CancellationToken::new();
//! let mut calls = 0;
//!
//! let result = retry(&config, &token, || {
//!     calls += 1;
//!     async { Err::<(), _>(BackendError::transient(Operation::Read, "a.md", "timeout")) }
//! })
//! .await;
//!
//! assert!(matches!(result, Err(RetryError::Exhausted { attempts: 3, .. })));
//! assert_eq!(calls, 3);
//! # }
//! ```
//!
//! ## Protecting a dependency
//!
//! ```
//! use core::time::Duration;
//! use storage_rail::{CircuitBreaker, CircuitState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker = CircuitBreaker::new(1, Duration::from_secs(30));
//! let _ = breaker.call(|| async { Err::<(), _>("unreachable") }).await;
//! assert_eq!(breaker.state(), CircuitState::Open);
//! # }
//! ```

/// Backoff strategies
pub mod backoff;
/// Circuit breaker
pub mod breaker;
/// Retry classification
pub mod classify;
/// Backend, retry and breaker error types
pub mod error;
/// Convenience re-exports for quick starts
pub mod prelude;
/// Storage decorator with retry and circuit breaking
pub mod resilient;
/// Retry executor
pub mod retry;
/// Declarative configuration
pub mod settings;
/// Backend capability contract
pub mod storage;

/// Tower integration - Layer and Service implementations (requires `tower` feature)
#[cfg(feature = "tower")]
pub mod tower;

pub use backoff::{Backoff, ExponentialBackoff, FixedDelay};
pub use breaker::{BreakerPermit, CircuitBreaker, CircuitState};
pub use classify::{backend_should_retry, default_should_retry, TransientError};
pub use error::{BackendError, BoxError, BreakerError, Operation, RetryError, StorageError};
pub use resilient::ResilientStorage;
pub use retry::{retry, retry_uncancellable, retry_with_metadata, RetryConfig, RetryOutcome};
pub use settings::{BreakerSettings, ConfigError, ResilienceSettings, RetrySettings};
pub use storage::{ByteReader, FileInfo, Storage};

pub use tokio_util::sync::CancellationToken;
