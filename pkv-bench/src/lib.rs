//! # PKV Lookup Benchmark
//!
//! Purpose: Measure point-lookup latency of a key-value store under
//! controlled key lengths, for plain keys and for fields of one hash.
//!
//! ## Structure Overview
//!
//! ```text
//! probe::check / probe::probe      pre-flight liveness check
//!   └── scenario::Scenario         setup → fixed → random → teardown
//!         ├── keygen::KeyGenerator random URL-safe keys
//!         ├── ScenarioBackend      ScalarBackend | HashBackend over any Store
//!         └── stats::LatencyRecorder
//! ```

pub mod config;
pub mod error;
pub mod keygen;
pub mod probe;
pub mod report;
pub mod scenario;
pub mod stats;
pub mod suite;

pub use error::{BenchError, BenchResult};
pub use keygen::KeyGenerator;
pub use probe::Session;
pub use scenario::{
    HashBackend, Phase, ScalarBackend, Scenario, ScenarioBackend, ScenarioCase, ScenarioKind,
};
