//! Convenience re-exports for quick starts.
//!
//! ```
//! use storage_rail::prelude::*;
//!
//! let config: RetryConfig<StorageError> = RetryConfig::new(3, ExponentialBackoff::default());
//! assert_eq!(config.max_attempts(), 3);
//! ```

pub use crate::backoff::{Backoff, ExponentialBackoff, FixedDelay};
pub use crate::breaker::{CircuitBreaker, CircuitState};
pub use crate::classify::TransientError;
pub use crate::error::{BackendError, BreakerError, Operation, RetryError, StorageError};
pub use crate::resilient::ResilientStorage;
pub use crate::retry::{retry, RetryConfig};
pub use crate::settings::ResilienceSettings;
pub use crate::storage::{FileInfo, Storage};
pub use tokio_util::sync::CancellationToken;
