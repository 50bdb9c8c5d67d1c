//! # In-Memory Store
//!
//! Provide a single-process backend with string and hash values and
//! TTL-aware lookups.
//!
//! ## Design Principles
//!
//! 1. **One Keyspace**: Strings and hashes share the key namespace; using a
//!    key with the wrong command fails with `WRONGTYPE`.
//! 2. **TTL Fast Path**: Expiration is checked on access; `purge_expired`
//!    sweeps the rest.
//! 3. **Strategy Pattern**: Implements `Store` so the bench harness does not
//!    care whether it talks to this map or to a server.
//!
//! ## Structure Overview
//!
//! ```text
//! MemoryStore
//!   ├── inner: RwLock<Keyspace>
//!   │     └── map: HashMap<Box<[u8]>, Entry>
//!   │           └── Entry { value: Str(bytes) | Hash(field -> bytes), expires_at }
//!   └── closed: AtomicBool
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;

use pkv_common::{Expiry, Store, StoreError, StoreResult};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

type Fields = HashMap<Box<[u8]>, Vec<u8>, RandomState>;

#[derive(Debug)]
enum Data {
    Str(Vec<u8>),
    Hash(Fields),
}

#[derive(Debug)]
struct Entry {
    data: Data,
    // Absolute expiration timestamp.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

#[derive(Debug)]
struct Keyspace {
    map: HashMap<Box<[u8]>, Entry, RandomState>,
}

impl Keyspace {
    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live_mut(&mut self, key: &[u8], now: Instant) -> Option<&mut Entry> {
        if self.map.get(key).is_some_and(|entry| entry.is_expired(now)) {
            self.map.remove(key);
        }
        self.map.get_mut(key)
    }
}

/// Thread-safe in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Keyspace>,
    closed: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            inner: RwLock::new(Keyspace {
                map: HashMap::with_hasher(RandomState::new()),
            }),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Number of keys that have not expired.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let inner = self.inner.read();
        inner.map.values().filter(|entry| !entry.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry that has expired at `now` and returns the count.
    ///
    /// O(n) over the keyspace.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut inner = self.inner.write();
        let before = inner.map.len();
        inner.map.retain(|_, entry| !entry.is_expired(now));
        before - inner.map.len()
    }
}

impl Store for MemoryStore {
    fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let mut inner = self.inner.write();
        match inner.live_mut(key, Instant::now()) {
            None => Ok(None),
            Some(Entry { data: Data::Str(value), .. }) => Ok(Some(value.clone())),
            Some(_) => Err(StoreError::server(WRONGTYPE)),
        }
    }

    fn set(&self, key: &[u8], value: &[u8], expiry: Expiry) -> StoreResult<()> {
        self.ensure_open()?;
        let expires_at = match expiry {
            Expiry::Never => None,
            // A deadline past what `Instant` can represent never arrives.
            Expiry::After(ttl) => Instant::now().checked_add(ttl),
        };
        // SET replaces whatever was there, including a hash.
        self.inner.write().map.insert(
            key.into(),
            Entry {
                data: Data::Str(value.to_vec()),
                expires_at,
            },
        );
        Ok(())
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut inner = self.inner.write();
        if inner.live_mut(key, Instant::now()).is_none() {
            inner.map.insert(
                key.into(),
                Entry {
                    data: Data::Hash(HashMap::with_hasher(RandomState::new())),
                    expires_at: None,
                },
            );
        }
        match inner.map.get_mut(key) {
            Some(Entry { data: Data::Hash(fields), .. }) => {
                Ok(fields.insert(field.into(), value.to_vec()).is_none())
            }
            _ => Err(StoreError::server(WRONGTYPE)),
        }
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let mut inner = self.inner.write();
        match inner.live_mut(key, Instant::now()) {
            None => Ok(None),
            Some(Entry { data: Data::Hash(fields), .. }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(StoreError::server(WRONGTYPE)),
        }
    }

    fn del(&self, keys: &[&[u8]]) -> StoreResult<u64> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut inner = self.inner.write();
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = inner.map.remove(*key) {
                if !entry.is_expired(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
