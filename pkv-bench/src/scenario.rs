//! # Scenario Runner
//!
//! Purpose: Run one populate → measure → teardown cycle for a fixed key
//! length against any `Store`.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: `ScenarioBackend` is the only thing that differs
//!    between plain keys and hash fields; the control flow is shared.
//! 2. **Ordered Phases**: `Pending → Populated → Done`. Calling a step in the
//!    wrong phase is an error, not a silent no-op.
//! 3. **Fail Fast**: A store error, a missing key or a wrong value ends the
//!    run. Nothing is retried and nothing is cleaned up on failure.
//! 4. **Driver-Agnostic**: `lookup_fixed`/`lookup_random` are single
//!    iterations so an external driver (criterion) owns the iteration count;
//!    `run` is the built-in driver.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use pkv_common::{Expiry, Store, StoreResult};

use crate::error::{BenchError, BenchResult};
use crate::keygen::KeyGenerator;
use crate::report::{ScenarioReport, VariantReport};
use crate::stats::LatencyRecorder;

/// Hash key shared by every field in a hash scenario.
pub const DEFAULT_HASH_KEY: &str = "key";

/// Which store operations a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// SET/GET on top-level keys.
    Scalar,
    /// HSET/HGET on fields of one hash.
    Hash,
}

impl ScenarioKind {
    /// Noun used in variant names: `<case>_same_key`, `<case>_random_field`.
    pub fn unit(self) -> &'static str {
        match self {
            ScenarioKind::Scalar => "key",
            ScenarioKind::Hash => "field",
        }
    }
}

/// One benchmark variant: a name and the length of every generated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioCase {
    pub name: String,
    pub kind: ScenarioKind,
    pub key_len: usize,
}

impl ScenarioCase {
    pub fn new(name: impl Into<String>, kind: ScenarioKind, key_len: usize) -> Self {
        ScenarioCase {
            name: name.into(),
            kind,
            key_len,
        }
    }

    /// Short and long keys for both kinds.
    pub fn defaults() -> Vec<ScenarioCase> {
        vec![
            ScenarioCase::new("short_key", ScenarioKind::Scalar, 4),
            ScenarioCase::new("long_key", ScenarioKind::Scalar, 100),
            ScenarioCase::new("short_field", ScenarioKind::Hash, 4),
            ScenarioCase::new("long_field", ScenarioKind::Hash, 100),
        ]
    }

    pub fn fixed_label(&self) -> String {
        format!("{}_same_{}", self.name, self.kind.unit())
    }

    pub fn random_label(&self) -> String {
        format!("{}_random_{}", self.name, self.kind.unit())
    }
}

/// Store operations one scenario kind needs.
///
/// Every id is written with itself as the value, so lookups can be checked
/// without keeping a second copy.
pub trait ScenarioBackend {
    fn kind(&self) -> ScenarioKind;

    /// Writes `id` with value `id`.
    fn populate(&self, id: &str) -> StoreResult<()>;

    /// Reads the value stored for `id`.
    fn lookup(&self, id: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Removes everything `populate` wrote in one bulk operation.
    fn cleanup(&self, ids: &[String]) -> StoreResult<u64>;
}

/// Plain keys: `SET id id`, `GET id`, `DEL ids...`.
pub struct ScalarBackend<S> {
    store: S,
}

impl<S: Store> ScalarBackend<S> {
    pub fn new(store: S) -> Self {
        ScalarBackend { store }
    }
}

impl<S: Store> ScenarioBackend for ScalarBackend<S> {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Scalar
    }

    fn populate(&self, id: &str) -> StoreResult<()> {
        self.store.set(id.as_bytes(), id.as_bytes(), Expiry::Never)
    }

    fn lookup(&self, id: &str) -> StoreResult<Option<Vec<u8>>> {
        self.store.get(id.as_bytes())
    }

    fn cleanup(&self, ids: &[String]) -> StoreResult<u64> {
        let keys: Vec<&[u8]> = ids.iter().map(String::as_bytes).collect();
        self.store.del(&keys)
    }
}

/// Fields of one hash: `HSET key id id`, `HGET key id`, `DEL key`.
pub struct HashBackend<S> {
    store: S,
    hash_key: Vec<u8>,
}

impl<S: Store> HashBackend<S> {
    pub fn new(store: S, hash_key: impl Into<Vec<u8>>) -> Self {
        HashBackend {
            store,
            hash_key: hash_key.into(),
        }
    }
}

impl<S: Store> ScenarioBackend for HashBackend<S> {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Hash
    }

    fn populate(&self, id: &str) -> StoreResult<()> {
        self.store
            .hset(&self.hash_key, id.as_bytes(), id.as_bytes())
            .map(|_| ())
    }

    fn lookup(&self, id: &str) -> StoreResult<Option<Vec<u8>>> {
        self.store.hget(&self.hash_key, id.as_bytes())
    }

    fn cleanup(&self, _ids: &[String]) -> StoreResult<u64> {
        self.store.del(&[self.hash_key.as_slice()])
    }
}

/// Lifecycle position of a `Scenario`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Populated,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Populated => "populated",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Teardown {
    pub elapsed: Duration,
    /// Keys the store reported as deleted.
    pub removed: u64,
}

/// One populate/measure/teardown cycle.
///
/// `R` drives both key generation and the uniform picks.
pub struct Scenario<B, R> {
    case: ScenarioCase,
    backend: B,
    rng: R,
    keys: Vec<String>,
    phase: Phase,
}

impl<B: ScenarioBackend, R: Rng> Scenario<B, R> {
    pub fn new(case: ScenarioCase, backend: B, rng: R) -> Self {
        debug_assert_eq!(case.kind, backend.kind(), "case/backend kind mismatch");
        Scenario {
            case,
            backend,
            rng,
            keys: Vec::new(),
            phase: Phase::Pending,
        }
    }

    pub fn case(&self) -> &ScenarioCase {
        &self.case
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Keys written during setup, in generation order (may repeat).
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn expect_phase(&self, expected: Phase) -> BenchResult<()> {
        if self.phase != expected {
            return Err(BenchError::Phase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Generates and writes `population` keys. Duplicates are kept.
    pub fn setup(&mut self, population: usize) -> BenchResult<Duration> {
        self.expect_phase(Phase::Pending)?;
        if population == 0 {
            return Err(BenchError::EmptyPopulation);
        }

        let start = Instant::now();
        let mut keygen = KeyGenerator::new(&mut self.rng);
        let mut keys = Vec::with_capacity(population);
        for _ in 0..population {
            let key = keygen.generate(self.case.key_len)?;
            self.backend.populate(&key)?;
            keys.push(key);
        }
        let elapsed = start.elapsed();

        self.keys = keys;
        self.phase = Phase::Populated;
        info!(case = %self.case.name, keys = population, ?elapsed, "setup");
        Ok(elapsed)
    }

    /// Picks one populated key uniformly at random.
    pub fn pick_key(&mut self) -> BenchResult<String> {
        self.expect_phase(Phase::Populated)?;
        self.keys
            .choose(&mut self.rng)
            .cloned()
            .ok_or(BenchError::EmptyPopulation)
    }

    /// One lookup of `key`, checked against the value written in setup.
    pub fn lookup_fixed(&self, key: &str) -> BenchResult<()> {
        self.expect_phase(Phase::Populated)?;
        verify(key, self.backend.lookup(key)?)
    }

    /// One uniformly random pick plus lookup, checked like `lookup_fixed`.
    pub fn lookup_random(&mut self) -> BenchResult<()> {
        self.expect_phase(Phase::Populated)?;
        let idx = self.rng.gen_range(0..self.keys.len());
        let key = &self.keys[idx];
        verify(key, self.backend.lookup(key)?)
    }

    /// Deletes everything setup wrote and drops the key set.
    pub fn teardown(&mut self) -> BenchResult<Teardown> {
        self.expect_phase(Phase::Populated)?;

        let start = Instant::now();
        let removed = self.backend.cleanup(&self.keys)?;
        let elapsed = start.elapsed();

        info!(case = %self.case.name, keys = self.keys.len(), removed, ?elapsed, "tearDown");
        self.keys = Vec::new();
        self.phase = Phase::Done;
        Ok(Teardown { elapsed, removed })
    }

    /// Full cycle with `iterations` timed lookups per variant.
    pub fn run(&mut self, population: usize, iterations: usize) -> BenchResult<ScenarioReport> {
        let setup = self.setup(population)?;
        let distinct = self.keys.iter().collect::<HashSet<_>>().len();

        let key = self.pick_key()?;
        debug!(case = %self.case.name, %key, "fixed key selected");
        let mut fixed = LatencyRecorder::with_capacity(iterations);
        for _ in 0..iterations {
            let start = Instant::now();
            self.lookup_fixed(&key)?;
            fixed.record(start.elapsed());
        }

        let mut random = LatencyRecorder::with_capacity(iterations);
        for _ in 0..iterations {
            let start = Instant::now();
            self.lookup_random()?;
            random.record(start.elapsed());
        }

        let teardown = self.teardown()?;

        Ok(ScenarioReport {
            name: self.case.name.clone(),
            kind: self.case.kind,
            key_len: self.case.key_len,
            population,
            distinct,
            setup_ns: duration_ns(setup),
            teardown_ns: duration_ns(teardown.elapsed),
            removed: teardown.removed,
            fixed: VariantReport {
                label: self.case.fixed_label(),
                latency: fixed.summary(),
            },
            random: VariantReport {
                label: self.case.random_label(),
                latency: random.summary(),
            },
        })
    }
}

fn duration_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

fn verify(key: &str, value: Option<Vec<u8>>) -> BenchResult<()> {
    match value {
        Some(value) if value == key.as_bytes() => Ok(()),
        Some(value) => Err(BenchError::Mismatch {
            key: key.to_string(),
            actual: String::from_utf8_lossy(&value).into_owned(),
        }),
        None => Err(BenchError::Missing {
            key: key.to_string(),
        }),
    }
}
