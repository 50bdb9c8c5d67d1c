// pkv-common - Shared store contract for the PKV lookup benchmark
//
// This crate defines the capability surface every store backend implements

pub mod error;
pub mod store;

// Re-export for convenience
pub use error::*;
pub use store::*;
