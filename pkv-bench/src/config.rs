//! # Command-Line Configuration
//!
//! `clap` arguments for the `pkv` binary and the resolved `BenchConfig` the
//! suite runs from.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pkv_client::{ClientConfig, DEFAULT_ADDR};

use crate::scenario::{ScenarioCase, ScenarioKind, DEFAULT_HASH_KEY};

const DEFAULT_POPULATION: usize = 1_000_000;
const DEFAULT_ITERATIONS: usize = 100_000;

#[derive(Debug, Parser)]
#[command(name = "pkv", version, about = "Key-value store lookup latency benchmark")]
pub struct Cli {
    /// Store address.
    #[arg(long, env = "PKV_ADDR", default_value = DEFAULT_ADDR, global = true)]
    pub addr: String,

    /// TCP connect/read/write timeout in milliseconds (none by default).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ping the store and read one key (default).
    Check {
        #[arg(long, default_value = "key")]
        key: String,
    },
    /// Run the lookup scenarios.
    Run(RunArgs),
    /// Print generated keys for a range of lengths.
    Keys(KeysArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Check {
            key: "key".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindFilter {
    Scalar,
    Hash,
    All,
}

impl KindFilter {
    pub fn includes(self, kind: ScenarioKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Scalar => kind == ScenarioKind::Scalar,
            KindFilter::Hash => kind == ScenarioKind::Hash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// The store at `--addr`.
    Server,
    /// An in-process map; no server needed.
    Memory,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, value_enum, default_value_t = KindFilter::All)]
    pub kind: KindFilter,

    /// Keys written per scenario.
    #[arg(long, default_value_t = DEFAULT_POPULATION)]
    pub population: usize,

    /// Timed lookups per variant.
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Hash holding the fields of hash scenarios.
    #[arg(long, default_value = DEFAULT_HASH_KEY)]
    pub hash_key: String,

    #[arg(long, value_enum, default_value_t = StoreKind::Server)]
    pub store: StoreKind,

    /// Seed for reproducible keys and picks.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also write the report as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct KeysArgs {
    #[arg(long, default_value_t = 1)]
    pub min_len: usize,

    #[arg(long, default_value_t = 99)]
    pub max_len: usize,

    /// Keys per length.
    #[arg(long, default_value_t = 1)]
    pub count: usize,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let timeout = self.timeout_ms.map(Duration::from_millis);
        ClientConfig {
            addr: self.addr.clone(),
            read_timeout: timeout,
            write_timeout: timeout,
            connect_timeout: timeout,
            ..ClientConfig::default()
        }
    }
}

/// Resolved settings for one suite run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub cases: Vec<ScenarioCase>,
    pub population: usize,
    pub iterations: usize,
    pub hash_key: String,
    pub seed: Option<u64>,
}

impl BenchConfig {
    pub fn from_args(args: &RunArgs) -> Self {
        BenchConfig {
            cases: ScenarioCase::defaults()
                .into_iter()
                .filter(|case| args.kind.includes(case.kind))
                .collect(),
            population: args.population,
            iterations: args.iterations,
            hash_key: args.hash_key.clone(),
            seed: args.seed,
        }
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            cases: ScenarioCase::defaults(),
            population: DEFAULT_POPULATION,
            iterations: DEFAULT_ITERATIONS,
            hash_key: DEFAULT_HASH_KEY.to_string(),
            seed: None,
        }
    }
}
