//! # PKV Sync Client
//!
//! Purpose: Provide a small, blocking RESP2 client that implements the
//! `Store` capability surface over TCP.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Reuse TCP connections to avoid repeated connects.
//! 2. **Minimal Allocation**: Reuse buffers for RESP framing and parsing.
//! 3. **Protocol Clarity**: Encode/parse RESP2 explicitly for correctness.
//! 4. **Explicit Release**: `close` shuts down every idle connection.

mod client;
mod pool;
mod resp;

pub use client::{ClientConfig, KVClient, DEFAULT_ADDR};
pub use pkv_common::{Expiry, Store, StoreError, StoreResult};
