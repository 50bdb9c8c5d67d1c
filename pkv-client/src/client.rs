//! # Synchronous Client API
//!
//! Purpose: Expose a compact, blocking API for the handful of RESP2 commands
//! the lookup benchmark issues.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `KVClient` hides pooling and protocol details.
//! 2. **Borrow-Friendly API**: Accept `&[u8]` to avoid unnecessary copies.
//! 3. **Explicit Absence**: A null bulk reply is `Ok(None)`, never an error.

use std::time::Duration;

use pkv_common::{Expiry, Store, StoreError, StoreResult};

use crate::pool::{ConnectionPool, PoolConfig};
use crate::resp::{Decimal, Reply};

/// Loopback address on the conventional store port.
pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";

/// Configuration for the synchronous client and its pool.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, e.g. "127.0.0.1:6379".
    pub addr: String,
    /// Maximum idle connections kept in the pool.
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use).
    pub max_total: usize,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    /// One connection: the benchmark is strictly sequential.
    fn default() -> Self {
        ClientConfig {
            addr: DEFAULT_ADDR.to_string(),
            max_idle: 1,
            max_total: 1,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}

/// Synchronous RESP2 client.
///
/// Each call acquires a pooled connection, executes one command, and returns
/// the connection to the pool. Nothing is dialed until the first command.
pub struct KVClient {
    pool: ConnectionPool,
}

impl KVClient {
    /// Creates a client for `addr` with default pool settings.
    pub fn connect(addr: impl Into<String>) -> Self {
        Self::with_config(ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        })
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let pool = ConnectionPool::new(PoolConfig {
            addr: config.addr,
            max_idle: config.max_idle,
            max_total: config.max_total.max(1),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            connect_timeout: config.connect_timeout,
        });
        KVClient { pool }
    }

    /// Address this client dials.
    pub fn addr(&self) -> &str {
        self.pool.addr()
    }

    fn call(&self, args: &[&[u8]]) -> StoreResult<Reply> {
        let mut conn = self.pool.acquire()?;
        conn.exec(args)?.into_result()
    }

    /// Sends `PING` and expects `PONG`.
    pub fn ping(&self) -> StoreResult<()> {
        match self.call(&[b"PING"])? {
            Reply::Status(text) if text.eq_ignore_ascii_case(b"PONG") => Ok(()),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    /// Fetches a value by key. Returns `Ok(None)` when the key is missing.
    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        expect_bulk(self.call(&[b"GET", key])?)
    }

    /// Sets a value. `Expiry::After` is sent as `PX <millis>`.
    pub fn set(&self, key: &[u8], value: &[u8], expiry: Expiry) -> StoreResult<()> {
        let reply = match expiry {
            Expiry::Never => self.call(&[b"SET", key, value])?,
            Expiry::After(ttl) => {
                let millis = Decimal::new(ttl.as_millis().clamp(1, u64::MAX as u128) as u64);
                self.call(&[b"SET", key, value, b"PX", millis.as_bytes()])?
            }
        };
        match reply {
            Reply::Status(_) => Ok(()),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    /// Sets one hash field. Returns true when the field was newly created.
    pub fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool> {
        match self.call(&[b"HSET", key, field, value])? {
            Reply::Integer(added) => Ok(added > 0),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    /// Fetches one hash field. Returns `Ok(None)` when key or field is missing.
    pub fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        expect_bulk(self.call(&[b"HGET", key, field])?)
    }

    /// Deletes all `keys` in one `DEL` and returns how many existed.
    pub fn del(&self, keys: &[&[u8]]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut args: Vec<&[u8]> = Vec::with_capacity(keys.len() + 1);
        args.push(b"DEL");
        args.extend_from_slice(keys);
        match self.call(&args)? {
            Reply::Integer(removed) if removed >= 0 => Ok(removed as u64),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    /// Shuts down pooled connections. Later commands fail with `Closed`.
    pub fn close(&self) -> StoreResult<()> {
        self.pool.close()
    }
}

fn expect_bulk(reply: Reply) -> StoreResult<Option<Vec<u8>>> {
    match reply {
        Reply::Bulk(data) => Ok(data),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

impl Store for KVClient {
    fn ping(&self) -> StoreResult<()> {
        KVClient::ping(self)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        KVClient::get(self, key)
    }

    fn set(&self, key: &[u8], value: &[u8], expiry: Expiry) -> StoreResult<()> {
        KVClient::set(self, key, value, expiry)
    }

    fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool> {
        KVClient::hset(self, key, field, value)
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        KVClient::hget(self, key, field)
    }

    fn del(&self, keys: &[&[u8]]) -> StoreResult<u64> {
        KVClient::del(self, keys)
    }

    fn close(&self) -> StoreResult<()> {
        KVClient::close(self)
    }
}
