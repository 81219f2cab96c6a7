//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a single trial call tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open:      failure_count >= max_failures
//! Open → Half-Open:   more than reset_timeout since the last failure
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open:   trial call fails
//! ```
//!
//! State, counters and the last failure instant live behind one mutex.
//! Admission (check and transition) and outcome recording are each a single
//! critical section; the lock is never held while the protected call runs.
//!
//! Only one half-open trial is admitted at a time. Other callers arriving
//! while the trial is in flight are rejected as if the breaker were open. A
//! trial that ends without a verdict (dropped future, cancelled caller) hands
//! the slot to the next caller without touching the counters.

use core::future::Future;
use core::ops::Deref;
use core::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::error::BreakerError;

/// Observable breaker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    trial_in_flight: bool,
}

/// A lock-guarded circuit breaker protecting one dependency.
///
/// Create one per dependency and share it through an [`Arc`].
///
/// # Examples
///
/// ```
/// use storage_rail::{CircuitBreaker, CircuitState};
/// use core::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let breaker = CircuitBreaker::new(2, Duration::from_secs(30));
///
/// for _ in 0..2 {
///     let _ = breaker.call(|| async { Err::<(), _>("backend down") }).await;
/// }
/// assert_eq!(breaker.state(), CircuitState::Open);
///
/// let rejected = breaker.call(|| async { Ok::<_, &str>(()) }).await;
/// assert!(rejected.unwrap_err().is_open());
/// # }
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    max_failures: u32,
    reset_timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed breaker. `max_failures` below one is raised to one.
    pub fn new(max_failures: u32, reset_timeout: Duration) -> Self {
        Self {
            max_failures: max_failures.max(1),
            reset_timeout,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                trial_in_flight: false,
            }),
        }
    }

    // Every critical section leaves the state consistent, so a poisoned lock
    // is still safe to use.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    #[inline]
    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    /// Current state. An open breaker whose cooldown elapsed still reports
    /// `Open` until a call moves it to `HalfOpen`.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures recorded since the last success.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Forces the breaker back to `Closed` with cleared counters.
    pub fn reset(&self) {
        let mut s = self.lock();
        s.state = CircuitState::Closed;
        s.failure_count = 0;
        s.last_failure = None;
        s.trial_in_flight = false;
        tracing::info!("circuit breaker reset");
    }

    /// Asks for admission of one call.
    ///
    /// Returns `None` if the call must fail fast. The returned permit must be
    /// settled with [`BreakerPermit::success`] or [`BreakerPermit::failure`];
    /// dropping it unsettled records nothing.
    pub fn try_acquire(&self) -> Option<BreakerPermit<&Self>> {
        self.admit().map(|trial| BreakerPermit::new(self, trial))
    }

    /// Like [`try_acquire`](Self::try_acquire), but the permit owns a handle
    /// to the breaker so it can be moved into a `'static` future.
    pub fn try_acquire_owned(self: &Arc<Self>) -> Option<BreakerPermit<Arc<Self>>> {
        self.admit().map(|trial| BreakerPermit::new(Arc::clone(self), trial))
    }

    /// Runs `operation` if admitted. Every error counts as a failure.
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with(operation, |_| true).await
    }

    /// Runs `operation` if admitted, counting an error as a dependency failure
    /// only when `is_failure` says so. Errors that do not count leave the
    /// counters untouched.
    pub async fn call_with<T, E, F, Fut, P>(
        &self,
        operation: F,
        is_failure: P,
    ) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        let Some(permit) = self.try_acquire() else {
            tracing::debug!("circuit breaker open, rejecting call");
            return Err(BreakerError::Open);
        };

        match operation().await {
            Ok(value) => {
                permit.success();
                Ok(value)
            },
            Err(error) => {
                if is_failure(&error) {
                    permit.failure();
                } else {
                    permit.release();
                }
                Err(BreakerError::Inner(error))
            },
        }
    }

    /// Returns `Some(is_trial)` when the call is admitted.
    fn admit(&self) -> Option<bool> {
        let mut s = self.lock();
        match s.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                // A trial admitted before a late failure reopened the breaker
                // still holds the slot.
                if s.trial_in_flight {
                    return None;
                }
                let cooled_down =
                    s.last_failure.map_or(true, |at| at.elapsed() > self.reset_timeout);
                if !cooled_down {
                    return None;
                }
                s.state = CircuitState::HalfOpen;
                s.trial_in_flight = true;
                tracing::debug!("circuit breaker half-open, admitting trial call");
                Some(true)
            },
            CircuitState::HalfOpen if s.trial_in_flight => None,
            CircuitState::HalfOpen => {
                s.trial_in_flight = true;
                Some(true)
            },
        }
    }

    fn record_success(&self, trial: bool) {
        let mut s = self.lock();
        if trial {
            s.trial_in_flight = false;
        }
        let previous = s.state;
        s.failure_count = 0;
        s.state = CircuitState::Closed;
        if previous != CircuitState::Closed {
            tracing::info!("circuit breaker closed");
        }
    }

    fn record_failure(&self, trial: bool) {
        let mut s = self.lock();
        if trial {
            s.trial_in_flight = false;
        }
        s.failure_count = s.failure_count.saturating_add(1);
        s.last_failure = Some(Instant::now());
        let trip = s.state == CircuitState::HalfOpen || s.failure_count >= self.max_failures;
        if trip && s.state != CircuitState::Open {
            let reset_timeout_ms = u64::try_from(self.reset_timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(failures = s.failure_count, reset_timeout_ms, "circuit breaker opened");
            s.state = CircuitState::Open;
        }
    }

    fn release_trial(&self) {
        self.lock().trial_in_flight = false;
    }
}

/// Admission ticket for one call through a [`CircuitBreaker`].
#[must_use = "an unsettled permit records neither success nor failure"]
#[derive(Debug)]
pub struct BreakerPermit<B>
where
    B: Deref<Target = CircuitBreaker>,
{
    breaker: B,
    trial: bool,
    settled: bool,
}

impl<B> BreakerPermit<B>
where
    B: Deref<Target = CircuitBreaker>,
{
    fn new(breaker: B, trial: bool) -> Self {
        Self { breaker, trial, settled: false }
    }

    /// Returns `true` if this permit is the half-open trial.
    #[inline]
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Records a successful call.
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success(self.trial);
    }

    /// Records a failed call.
    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure(self.trial);
    }

    /// Gives the permit back without recording an outcome.
    #[inline]
    pub fn release(self) {}
}

impl<B> Drop for BreakerPermit<B>
where
    B: Deref<Target = CircuitBreaker>,
{
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial();
        }
    }
}
