//! # Connectivity Probe and Session
//!
//! Pre-flight liveness check, the entry-point read, and the guard that
//! releases the store however the run ends.

use std::ops::Deref;
use std::time::Instant;

use tracing::{debug, info, warn};

use pkv_common::Store;

use crate::error::{BenchError, BenchResult};

/// Owns a store for one run and closes it on drop.
///
/// A close failure is logged, never propagated: by then the run's own result
/// is what matters.
pub struct Session<S: Store> {
    store: S,
}

impl<S: Store> Session<S> {
    pub fn new(store: S) -> Self {
        Session { store }
    }
}

impl<S: Store> Deref for Session<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.store
    }
}

impl<S: Store> Drop for Session<S> {
    fn drop(&mut self) {
        if let Err(err) = self.store.close() {
            warn!(%err, "closing store failed");
        }
    }
}

/// One `PING`. No retry: an unreachable store ends the run.
pub fn probe<S: Store>(store: &S, addr: &str) -> BenchResult<()> {
    let start = Instant::now();
    store.ping().map_err(|source| BenchError::Unreachable {
        addr: addr.to_string(),
        source,
    })?;
    debug!(addr, rtt = ?start.elapsed(), "store reachable");
    Ok(())
}

/// Entry-point sequence: probe, then one read of `key`.
///
/// Absence of `key` is the expected outcome and is only logged.
pub fn check<S: Store>(store: &S, addr: &str, key: &str) -> BenchResult<Option<Vec<u8>>> {
    probe(store, addr)?;
    let value = store.get(key.as_bytes())?;
    match &value {
        Some(value) => info!(key, value = %String::from_utf8_lossy(value), "read"),
        None => info!(key, "key not found"),
    }
    Ok(value)
}
