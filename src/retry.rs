//! Retry executor.
//!
//! [`retry`] runs a fallible async operation up to
//! [`RetryConfig::max_attempts`] times. Between attempts it waits for the
//! configured [`Backoff`] while watching a [`CancellationToken`]; whichever
//! finishes first wins, and the losing timer is dropped. Nothing is spawned:
//! all work happens inside the caller's future.
//!
//! # Examples
//!
//! ```rust,ignore
//! use storage_rail::{retry, RetryConfig, ExponentialBackoff};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = RetryConfig::new(3, ExponentialBackoff::default());
//! let token = CancellationToken::new();
//!
//! let bytes = retry(&config, &token, || backend.read("notes/today.md")).await?;
//! ```

use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::error::Error as StdError;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backoff::{Backoff, ExponentialBackoff};
use crate::classify::{default_should_retry, ShouldRetry};
use crate::error::RetryError;

/// Immutable retry policy: attempt budget, backoff and classifier.
///
/// Cloning is cheap; the backoff and predicate are shared.
pub struct RetryConfig<E> {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    should_retry: ShouldRetry<E>,
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: Arc::clone(&self.backoff),
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<E> Default for RetryConfig<E>
where
    E: StdError + 'static,
{
    fn default() -> Self {
        Self::new(3, ExponentialBackoff::default())
    }
}

impl<E> RetryConfig<E>
where
    E: StdError + 'static,
{
    /// Creates a policy using the conservative [`default_should_retry`] classifier.
    ///
    /// `max_attempts` below one is raised to one.
    pub fn new<B>(max_attempts: u32, backoff: B) -> Self
    where
        B: Backoff + 'static,
    {
        Self::with_predicate(max_attempts, backoff, default_should_retry::<E>)
    }
}

impl<E> RetryConfig<E> {
    /// Creates a policy with a custom retry predicate.
    pub fn with_predicate<B, P>(max_attempts: u32, backoff: B, should_retry: P) -> Self
    where
        B: Backoff + 'static,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
            should_retry: Arc::new(should_retry),
        }
    }

    /// Replaces the retry predicate.
    pub fn with_should_retry<P>(mut self, should_retry: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(should_retry);
        self
    }

    /// Sets the attempt budget (minimum one).
    #[inline]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replaces the backoff strategy.
    pub fn with_backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[inline]
    pub fn backoff(&self) -> &dyn Backoff {
        &*self.backoff
    }

    /// Runs the configured classifier.
    #[inline]
    pub fn should_retry(&self, err: &E) -> bool {
        (self.should_retry)(err)
    }
}

/// Result of a retry run with metadata about the attempts made.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// The final result.
    pub result: Result<T, RetryError<E>>,
    /// Number of times the operation was invoked.
    pub attempts: u32,
    /// Total time spent in completed backoff waits.
    pub total_wait: Duration,
}

/// Retries `operation` according to `config`.
///
/// - Success is returned immediately.
/// - An error rejected by the classifier is returned unmodified as
///   [`RetryError::Permanent`] after that single attempt.
/// - A retryable error is followed by a backoff wait, unless the budget is
///   spent, in which case [`RetryError::Exhausted`] wraps the last error.
/// - If `cancel` fires during a wait, [`RetryError::Cancelled`] is returned and
///   no further attempts are made.
pub async fn retry<T, E, F, Fut>(
    config: &RetryConfig<E>,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_metadata(config, cancel, operation).await.result
}

/// Same as [`retry`] without a cancellation signal.
pub async fn retry_uncancellable<T, E, F, Fut>(
    config: &RetryConfig<E>,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry(config, &CancellationToken::new(), operation).await
}

/// Same as [`retry`], but also reports how many attempts were made and how
/// long was spent waiting.
pub async fn retry_with_metadata<T, E, F, Fut>(
    config: &RetryConfig<E>,
    cancel: &CancellationToken,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts();
    let backoff = config.backoff();
    backoff.reset();

    let mut attempt = 0u32;
    let mut total_wait = Duration::ZERO;

    loop {
        let error = match operation().await {
            Ok(value) => {
                return RetryOutcome { result: Ok(value), attempts: attempt + 1, total_wait };
            },
            Err(e) => e,
        };

        if !config.should_retry(&error) {
            tracing::debug!(attempt, "error is not retryable");
            return RetryOutcome {
                result: Err(RetryError::Permanent(error)),
                attempts: attempt + 1,
                total_wait,
            };
        }

        if attempt + 1 >= max_attempts {
            tracing::warn!(attempts = max_attempts, "retry attempts exhausted");
            return RetryOutcome {
                result: Err(RetryError::Exhausted { attempts: attempt + 1, source: error }),
                attempts: attempt + 1,
                total_wait,
            };
        }

        let delay = backoff.duration(attempt);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(attempt, delay_ms, "retrying after backoff");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(attempt, "retry cancelled during backoff");
                return RetryOutcome {
                    result: Err(RetryError::Cancelled),
                    attempts: attempt + 1,
                    total_wait,
                };
            }
            _ = tokio::time::sleep(delay) => {}
        }

        total_wait += delay;
        attempt += 1;
    }
}
