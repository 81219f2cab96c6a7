//! Declarative configuration.
//!
//! Settings are plain data with defaults, so they can be embedded in a
//! profile file (with the `serde` feature) and turned into runtime objects
//! after validation. Durations are expressed in milliseconds.
//!
//! # Examples
//!
//! ```
//! use storage_rail::settings::{BreakerSettings, ResilienceSettings, RetrySettings};
//!
//! let settings = ResilienceSettings {
//!     retry: RetrySettings { max_attempts: 5, ..RetrySettings::default() },
//!     breaker: Some(BreakerSettings::default()),
//! };
//! assert!(settings.validate().is_ok());
//!
//! let bad = RetrySettings { max_attempts: 0, ..RetrySettings::default() };
//! assert!(bad.validate().is_err());
//! ```

use core::time::Duration;
use std::error::Error as StdError;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::backoff::ExponentialBackoff;
use crate::breaker::CircuitBreaker;
use crate::resilient::ResilientStorage;
use crate::retry::RetryConfig;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("multiplier must be a finite number greater than 1, got {0}")]
    InvalidMultiplier(f64),
    #[error("jitter must be within [0, 1], got {0}")]
    InvalidJitter(f64),
    #[error("initial_delay_ms ({initial}) exceeds max_delay_ms ({max})")]
    DelayRange { initial: u64, max: u64 },
    #[error("max_failures must be at least 1")]
    ZeroFailures,
}

/// Retry budget and backoff shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if !self.multiplier.is_finite() || self.multiplier <= 1.0 {
            return Err(ConfigError::InvalidMultiplier(self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidJitter(self.jitter));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ConfigError::DelayRange {
                initial: self.initial_delay_ms,
                max: self.max_delay_ms,
            });
        }
        Ok(())
    }

    /// Builds the backoff strategy described by these settings.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
        .with_multiplier(self.multiplier)
        .with_jitter(self.jitter)
    }

    /// Validates and builds a [`RetryConfig`] using the default classifier.
    pub fn build<E>(&self) -> Result<RetryConfig<E>, ConfigError>
    where
        E: StdError + 'static,
    {
        self.validate()?;
        Ok(RetryConfig::new(self.max_attempts, self.backoff()))
    }
}

/// Circuit breaker threshold and cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BreakerSettings {
    pub max_failures: u32,
    pub reset_timeout_ms: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self { max_failures: 5, reset_timeout_ms: 30_000 }
    }
}

impl BreakerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_failures == 0 {
            return Err(ConfigError::ZeroFailures);
        }
        Ok(())
    }

    pub fn build(&self) -> Result<CircuitBreaker, ConfigError> {
        self.validate()?;
        Ok(CircuitBreaker::new(self.max_failures, Duration::from_millis(self.reset_timeout_ms)))
    }
}

/// Complete resilience configuration for one backend.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ResilienceSettings {
    pub retry: RetrySettings,
    /// Circuit breaking is disabled when absent.
    pub breaker: Option<BreakerSettings>,
}

impl ResilienceSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate()?;
        if let Some(breaker) = &self.breaker {
            breaker.validate()?;
        }
        Ok(())
    }

    /// Wraps `inner` with a fresh breaker (if configured) and the retry policy.
    pub fn wrap<S>(&self, inner: S) -> Result<ResilientStorage<S>, ConfigError> {
        let storage = ResilientStorage::new(inner, self.retry.build()?);
        match &self.breaker {
            Some(breaker) => Ok(storage.with_breaker(Arc::new(breaker.build()?))),
            None => Ok(storage),
        }
    }
}
