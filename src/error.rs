//! Error types produced by backends, the retry executor and the circuit breaker.
//!
//! Backends report failures as [`BackendError`], which carries the operation,
//! the path, the underlying cause and an explicit `retryable` marking. The
//! resilience layer synthesizes its own conditions on top:
//!
//! - [`RetryError`] distinguishes a permanent failure (returned unmodified),
//!   an exhausted retry budget and a cancelled wait.
//! - [`BreakerError`] distinguishes a fast-fail rejection from an error that
//!   came out of the protected call.
//! - [`StorageError`] is the error type of the [`Storage`](crate::Storage)
//!   contract and folds all of the above into one enum.

use core::fmt;

/// Boxed cause carried by [`BackendError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Storage capability that raised an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Write,
    Delete,
    List,
    Exists,
    Stat,
    Copy,
    Move,
    Health,
    ReadStream,
    WriteStream,
    Close,
}

impl Operation {
    /// Returns the lowercase name used in messages and log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Exists => "exists",
            Self::Stat => "stat",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Health => "health",
            Self::ReadStream => "read_stream",
            Self::WriteStream => "write_stream",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by a storage backend.
///
/// `retryable` is decided by whoever raises the error and is the only thing
/// the backend classifier looks at.
///
/// # Examples
///
/// ```
/// use storage_rail::{BackendError, Operation};
///
/// let err = BackendError::transient(Operation::Read, "notes/a.md", "connection reset");
/// assert!(err.is_retryable());
/// assert_eq!(err.to_string(), "read notes/a.md: connection reset");
///
/// let err = BackendError::permanent(Operation::Stat, "notes/b.md", "not found");
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{operation} {path}: {cause}")]
pub struct BackendError {
    operation: Operation,
    path: String,
    #[source]
    cause: BoxError,
    retryable: bool,
}

impl BackendError {
    /// Creates an error with an explicit retryable marking.
    pub fn new(
        operation: Operation,
        path: impl Into<String>,
        cause: impl Into<BoxError>,
        retryable: bool,
    ) -> Self {
        Self { operation, path: path.into(), cause: cause.into(), retryable }
    }

    /// Creates an error that is safe to retry (timeouts, throttling, ...).
    #[inline]
    pub fn transient(
        operation: Operation,
        path: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::new(operation, path, cause, true)
    }

    /// Creates an error that must not be retried (not found, validation, ...).
    #[inline]
    pub fn permanent(
        operation: Operation,
        path: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self::new(operation, path, cause, false)
    }

    /// Shorthand for a permanent "not found" error.
    pub fn not_found(operation: Operation, path: impl Into<String>) -> Self {
        Self::permanent(operation, path, std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline]
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.cause
    }

    /// Returns `true` if the raiser marked this failure as transient.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Returns `true` if the cause is an I/O `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        self.cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Failure of a retried call.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The classifier rejected the error; it is returned exactly as raised.
    #[error(transparent)]
    Permanent(E),
    /// Every attempt failed with a retryable error.
    #[error("giving up after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },
    /// The cancellation token fired while waiting between attempts.
    #[error("retry cancelled during backoff")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// Returns the last error raised by the operation, if any.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Permanent(e) | Self::Exhausted { source: e, .. } => Some(e),
            Self::Cancelled => None,
        }
    }

    /// Consumes the error, returning the last error raised by the operation.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Permanent(e) | Self::Exhausted { source: e, .. } => Some(e),
            Self::Cancelled => None,
        }
    }

    /// Number of attempts made when the budget was exhausted.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure of a call gated by a [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    /// The call was rejected without reaching the dependency.
    #[error("circuit breaker is open")]
    Open,
    /// The dependency was called and failed.
    #[error(transparent)]
    Inner(E),
}

impl<E> BreakerError<E> {
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns the dependency's error, or `None` for a rejected call.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Open => None,
            Self::Inner(e) => Some(e),
        }
    }
}

/// Error type of the [`Storage`](crate::Storage) contract.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Raised by the backend itself.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// All retry attempts failed; `source` is the last failure.
    #[error("{operation} gave up after {attempts} attempts")]
    Exhausted {
        operation: Operation,
        attempts: u32,
        #[source]
        source: Box<StorageError>,
    },
    /// Rejected by an open circuit breaker; the backend was not called.
    #[error("{operation} rejected: circuit breaker is open")]
    CircuitOpen { operation: Operation },
    /// Cancelled while waiting between retry attempts.
    #[error("{operation} cancelled")]
    Cancelled { operation: Operation },
}

impl StorageError {
    /// Returns `true` only for backend errors explicitly marked retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the innermost backend error, looking through exhaustion.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(e) => Some(e),
            Self::Exhausted { source, .. } => source.backend_error(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns `true` if the innermost backend error is a "not found".
    pub fn is_not_found(&self) -> bool {
        self.backend_error().is_some_and(BackendError::is_not_found)
    }

    /// Folds the outcome of a breaker-gated retry into a storage error.
    pub(crate) fn from_resilience(
        operation: Operation,
        err: BreakerError<RetryError<StorageError>>,
    ) -> Self {
        match err {
            BreakerError::Open => Self::CircuitOpen { operation },
            BreakerError::Inner(RetryError::Permanent(e)) => e,
            BreakerError::Inner(RetryError::Exhausted { attempts, source }) => {
                Self::Exhausted { operation, attempts, source: Box::new(source) }
            },
            BreakerError::Inner(RetryError::Cancelled) => Self::Cancelled { operation },
        }
    }
}
