//! # Store Capability Surface
//!
//! Purpose: Describe the operations the benchmark needs from a key-value
//! store, independent of how the store is reached.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: The bench harness is generic over `Store`, so the
//!    TCP client and the in-process store are interchangeable.
//! 2. **Explicit Outcomes**: Lookups return `Option` for absence and reserve
//!    `StoreError` for real failures.
//! 3. **Borrow-Friendly API**: Keys and values are passed as `&[u8]`.

use std::time::Duration;

use crate::error::StoreResult;

/// Expiration policy attached to a `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Key never expires.
    #[default]
    Never,
    /// Key expires after the given duration.
    After(Duration),
}

impl Expiry {
    /// Maps the zero-duration convention ("0 means no expiration") onto `Expiry`.
    pub fn from_ttl(ttl: Duration) -> Self {
        if ttl.is_zero() {
            Expiry::Never
        } else {
            Expiry::After(ttl)
        }
    }
}

/// Operations a key-value store must support for the lookup benchmark.
///
/// Methods take `&self`; implementations handle their own interior state
/// (a connection pool, a lock).
pub trait Store {
    /// Liveness check.
    fn ping(&self) -> StoreResult<()>;

    /// Fetches a value. Returns `Ok(None)` when the key is missing.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Writes a value with an optional expiration.
    fn set(&self, key: &[u8], value: &[u8], expiry: Expiry) -> StoreResult<()>;

    /// Writes a hash field. Returns true when the field was newly created.
    fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool>;

    /// Fetches a hash field. Returns `Ok(None)` when the key or field is missing.
    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Deletes keys and returns how many existed.
    fn del(&self, keys: &[&[u8]]) -> StoreResult<u64>;

    /// Releases the underlying resources. Later calls fail with `Closed`.
    fn close(&self) -> StoreResult<()>;
}

impl<S: Store + ?Sized> Store for &S {
    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8], expiry: Expiry) -> StoreResult<()> {
        (**self).set(key, value, expiry)
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool> {
        (**self).hset(key, field, value)
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).hget(key, field)
    }

    fn del(&self, keys: &[&[u8]]) -> StoreResult<u64> {
        (**self).del(keys)
    }

    fn close(&self) -> StoreResult<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_means_no_expiry() {
        assert_eq!(Expiry::from_ttl(Duration::ZERO), Expiry::Never);
        assert_eq!(
            Expiry::from_ttl(Duration::from_secs(3)),
            Expiry::After(Duration::from_secs(3))
        );
    }
}
