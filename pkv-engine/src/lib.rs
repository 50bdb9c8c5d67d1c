//! # PKV Engine
//!
//! In-process implementation of the `Store` capability surface. Used by the
//! test suites and by `pkv run --store memory` dry runs.

mod memory;

pub use memory::MemoryStore;
