use criterion::Criterion;
use std::time::Duration;
use storage_rail::{BackendError, Operation, StorageError};

// ============================================================================
// Error fixtures
// ============================================================================

pub fn transient_error() -> StorageError {
    BackendError::transient(Operation::Read, "bucket/object.bin", "connection reset").into()
}

pub fn permanent_error() -> StorageError {
    BackendError::not_found(Operation::Read, "bucket/missing.bin").into()
}

pub fn wrapped_io_error() -> std::io::Error {
    std::io::Error::other(BackendError::permanent(Operation::Stat, "x", "denied"))
}

// ============================================================================
// Criterion configuration
// ============================================================================

pub fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(100)
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(5))
        .noise_threshold(0.05)
}
