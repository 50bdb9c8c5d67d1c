//! # pkv
//!
//! Entry point: `check` pings the store and reads one key, `run` executes the
//! lookup scenarios, `keys` prints generated keys.

use std::process::ExitCode;
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pkv_bench::config::{BenchConfig, Cli, Command, KeysArgs, RunArgs, StoreKind};
use pkv_bench::report::{render_scenario, RunReport, ScenarioReport};
use pkv_bench::suite::run_suite;
use pkv_bench::{probe, KeyGenerator, Session};
use pkv_client::KVClient;
use pkv_common::Store;
use pkv_engine::MemoryStore;

fn main() -> ExitCode {
    init_tracing();
    let mut cli = Cli::parse();

    match run(&mut cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &mut Cli) -> Result<()> {
    match cli.command.take().unwrap_or_default() {
        Command::Check { key } => {
            let session = Session::new(KVClient::with_config(cli.client_config()));
            probe::check(&*session, session.addr(), &key)?;
            Ok(())
        }
        Command::Run(args) => run_scenarios(cli, &args),
        Command::Keys(args) => print_keys(&args),
    }
}

fn run_scenarios(cli: &Cli, args: &RunArgs) -> Result<()> {
    let config = BenchConfig::from_args(args);
    let started = SystemTime::now();

    let (addr, reports) = match args.store {
        StoreKind::Server => {
            let session = Session::new(KVClient::with_config(cli.client_config()));
            probe::probe(&*session, session.addr())?;
            (cli.addr.as_str(), execute(&*session, &config)?)
        }
        StoreKind::Memory => {
            let session = Session::new(MemoryStore::new());
            ("memory", execute(&*session, &config)?)
        }
    };

    if let Some(path) = &args.json {
        RunReport::new(addr, started, config.population, config.iterations, &reports)
            .write_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn execute<S: Store>(store: &S, config: &BenchConfig) -> Result<Vec<ScenarioReport>> {
    let reports = run_suite(store, config).context("scenario run aborted")?;
    for report in &reports {
        for line in render_scenario(report) {
            println!("{line}");
        }
    }
    Ok(reports)
}

fn print_keys(args: &KeysArgs) -> Result<()> {
    let mut keygen = match args.seed {
        Some(seed) => KeyGenerator::seeded(seed),
        None => KeyGenerator::from_entropy(),
    };
    for len in args.min_len..=args.max_len {
        for _ in 0..args.count {
            println!("{}", keygen.generate(len).context("generating key")?);
        }
    }
    Ok(())
}
