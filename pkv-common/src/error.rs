//! # Store Errors
//!
//! Error taxonomy shared by every `Store` backend. Expected absence is not an
//! error here: lookups return `Ok(None)` for missing keys.

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or IO failure while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// RESP2 framing or parse error.
    #[error("protocol error")]
    Protocol,
    /// Store returned an error reply.
    #[error("server error: {}", String::from_utf8_lossy(.message))]
    Server { message: Vec<u8> },
    /// Reply type did not match the issued command.
    #[error("unexpected response")]
    UnexpectedResponse,
    /// Pool is at capacity and no idle connections are available.
    #[error("connection pool exhausted")]
    PoolExhausted,
    /// Address could not be parsed into a socket address.
    #[error("invalid address")]
    InvalidAddress,
    /// The store handle was closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Builds a `Server` error from a text message.
    pub fn server(message: impl AsRef<[u8]>) -> Self {
        StoreError::Server {
            message: message.as_ref().to_vec(),
        }
    }
}
