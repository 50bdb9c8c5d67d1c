//! # Bench Errors
//!
//! Every failure the harness can hit. The binary treats all of them as fatal;
//! library code only reports them.

use thiserror::Error;

use pkv_common::StoreError;

use crate::scenario::Phase;

/// Result alias for the bench harness.
pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The random source could not fill the key buffer.
    #[error("random source failed: {0}")]
    RandomSource(#[from] rand::Error),
    #[error("key length must be at least 1")]
    InvalidKeyLength,
    #[error("population must contain at least one key")]
    EmptyPopulation,
    /// A scenario step was called out of order.
    #[error("scenario is {actual}, expected {expected}")]
    Phase { expected: Phase, actual: Phase },
    /// A populated key read back as absent.
    #[error("key {key:?} not found after setup")]
    Missing { key: String },
    /// A populated key read back with a different value.
    #[error("key {key:?} read back as {actual:?}")]
    Mismatch { key: String, actual: String },
    /// Pre-flight liveness check failed.
    #[error("store at {addr} is unreachable: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: StoreError,
    },
    #[error("writing report failed: {0}")]
    ReportIo(#[from] std::io::Error),
    #[error("encoding report failed: {0}")]
    ReportJson(#[from] serde_json::Error),
}
