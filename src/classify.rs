//! Retry classification.
//!
//! A classifier decides whether a failure is worth another attempt. The
//! default policy is conservative: only errors explicitly marked retryable by
//! their raiser are retried. Anything else, including error shapes the
//! classifier does not recognize, fails fast.
//!
//! # Examples
//!
//! ```
//! use storage_rail::classify::default_should_retry;
//! use storage_rail::{BackendError, Operation, StorageError};
//!
//! let timeout: StorageError = BackendError::transient(Operation::Read, "a.md", "timeout").into();
//! assert!(default_should_retry(&timeout));
//!
//! // An unmarked error is never retried.
//! let unknown = std::fmt::Error;
//! assert!(!default_should_retry(&unknown));
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use crate::error::{BackendError, StorageError};

/// Shared retry predicate stored by [`RetryConfig`](crate::RetryConfig).
pub type ShouldRetry<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Classification of errors as transient or permanent.
///
/// Error types that know whether they are safe to retry implement this trait
/// and can be used with [`transient_should_retry`].
pub trait TransientError {
    /// Returns `true` if this error is transient and may succeed on retry.
    ///
    /// Return `true` for timeouts, throttling and temporary unavailability.
    /// Return `false` for not-found, validation and permission failures.
    fn is_transient(&self) -> bool;

    /// Returns `true` if this error is permanent and should not be retried.
    #[inline]
    fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

impl TransientError for BackendError {
    #[inline]
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }
}

impl TransientError for StorageError {
    #[inline]
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }
}

impl TransientError for std::io::Error {
    fn is_transient(&self) -> bool {
        use std::io::ErrorKind;
        matches!(
            self.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut
                | ErrorKind::Interrupted
                | ErrorKind::WouldBlock
        )
    }
}

/// Conservative default classifier.
///
/// Walks the error and its `source()` chain looking for an explicitly marked
/// [`BackendError`] or [`StorageError`] and returns its marking. Errors with
/// no such marking anywhere in the chain are not retried.
pub fn default_should_retry<E>(err: &E) -> bool
where
    E: StdError + 'static,
{
    let mut current = Some(err as &(dyn StdError + 'static));
    while let Some(e) = current {
        if let Some(backend) = e.downcast_ref::<BackendError>() {
            return backend_should_retry(backend);
        }
        if let Some(storage) = e.downcast_ref::<StorageError>() {
            return storage.is_retryable();
        }
        current = e.source();
    }
    false
}

/// Backend classifier: the error's own marking decides, whatever the operation.
#[inline]
pub fn backend_should_retry(err: &BackendError) -> bool {
    err.is_retryable()
}

/// Retries whatever [`TransientError::is_transient`] reports.
#[inline]
pub fn transient_should_retry<E: TransientError>(err: &E) -> bool {
    err.is_transient()
}

/// Never retries.
#[inline]
pub fn never_retry<E>(_: &E) -> bool {
    false
}

/// Always retries until attempts run out.
#[inline]
pub fn always_retry<E>(_: &E) -> bool {
    true
}
