//! # Suite
//!
//! Runs every configured case in order against one store.

use rand::rngs::StdRng;
use rand::SeedableRng;

use pkv_common::Store;

use crate::config::BenchConfig;
use crate::error::BenchResult;
use crate::report::ScenarioReport;
use crate::scenario::{HashBackend, ScalarBackend, Scenario, ScenarioKind};

/// Runs `config.cases` sequentially; the first failure aborts the suite.
///
/// With a seed, case `i` uses `seed + i` so cases do not share key sets.
pub fn run_suite<S: Store>(store: &S, config: &BenchConfig) -> BenchResult<Vec<ScenarioReport>> {
    let mut reports = Vec::with_capacity(config.cases.len());
    for (idx, case) in config.cases.iter().enumerate() {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(idx as u64)),
            None => StdRng::from_entropy(),
        };

        let report = match case.kind {
            ScenarioKind::Scalar => Scenario::new(case.clone(), ScalarBackend::new(store), rng)
                .run(config.population, config.iterations)?,
            ScenarioKind::Hash => Scenario::new(
                case.clone(),
                HashBackend::new(store, config.hash_key.as_bytes()),
                rng,
            )
            .run(config.population, config.iterations)?,
        };
        reports.push(report);
    }
    Ok(reports)
}
