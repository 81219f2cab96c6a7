//! Backoff strategies for retry loops.
//!
//! A [`Backoff`] maps a 0-indexed attempt number to the time a retry loop
//! waits before the next attempt. Strategies take `&self` so one instance can
//! be shared by many concurrent retry loops.
//!
//! # Examples
//!
//! ```
//! use storage_rail::backoff::{Backoff, ExponentialBackoff};
//! use core::time::Duration;
//!
//! let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(10))
//!     .with_jitter(0.0);
//!
//! // Delays: 100ms, 200ms, 400ms, 800ms, ... (capped at 10s)
//! assert_eq!(backoff.duration(0), Duration::from_millis(100));
//! assert_eq!(backoff.duration(2), Duration::from_millis(400));
//! assert_eq!(backoff.duration(20), Duration::from_secs(10));
//! ```

use core::time::Duration;
use std::sync::Arc;

use rand::Rng;

/// Maps an attempt number to a wait duration.
pub trait Backoff: Send + Sync {
    /// Returns the delay to wait after the given failed attempt (0-indexed).
    fn duration(&self, attempt: u32) -> Duration;

    /// Clears any internal counters before a new retry run.
    ///
    /// Stateless strategies keep the default no-op.
    #[inline]
    fn reset(&self) {}
}

impl<B: Backoff + ?Sized> Backoff for Arc<B> {
    #[inline]
    fn duration(&self, attempt: u32) -> Duration {
        (**self).duration(attempt)
    }

    #[inline]
    fn reset(&self) {
        (**self).reset()
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    #[inline]
    fn duration(&self, attempt: u32) -> Duration {
        (**self).duration(attempt)
    }

    #[inline]
    fn reset(&self) {
        (**self).reset()
    }
}

/// Exponential backoff with symmetric jitter.
///
/// For attempt `0` the initial delay is returned as-is. For later attempts the
/// base delay is `min(initial_delay * multiplier^attempt, max_delay)` and the
/// result is perturbed by up to `jitter * base` in either direction.
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialBackoff {
    /// Delay returned for the first attempt.
    pub initial_delay: Duration,
    /// Upper bound for the un-jittered delay.
    pub max_delay: Duration,
    /// Growth factor per attempt. Expected to be greater than `1.0`.
    pub multiplier: f64,
    /// Fraction of the base delay used as jitter amplitude, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

impl ExponentialBackoff {
    /// Creates a policy with a multiplier of `2.0` and 10% jitter.
    #[inline]
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self { initial_delay, max_delay, multiplier: 2.0, jitter: 0.1 }
    }

    /// Sets the initial delay.
    #[inline]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[inline]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    #[inline]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the jitter fraction, clamped to `[0, 1]`.
    #[inline]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_nan() { 0.0 } else { jitter.clamp(0.0, 1.0) };
        self
    }

    /// Returns the capped delay for `attempt` before jitter is applied.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powf(f64::from(attempt));
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(self.max_delay)
    }

    fn apply_jitter(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let u: f64 = rand::rng().random_range(-1.0..=1.0);
        let secs = base.as_secs_f64() * (1.0 + self.jitter * u);
        // Out-of-range values only come from rounding at the extremes.
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(base)
    }
}

impl Backoff for ExponentialBackoff {
    fn duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }
        self.apply_jitter(self.base_delay(attempt))
    }
}

/// Waits the same duration before every retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDelay {
    /// Delay between attempts.
    pub delay: Duration,
}

impl FixedDelay {
    /// Creates a new fixed delay policy.
    #[inline]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedDelay {
    #[inline]
    fn duration(&self, _attempt: u32) -> Duration {
        self.delay
    }
}
