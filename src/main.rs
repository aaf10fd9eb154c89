//! fx-pfe CLI
//!
//! Compute and analyze potential future exposure for FX forwards from the
//! command line.
//!
//! # Usage
//!
//! ```bash
//! # Generate a synthetic trade file priced off historical rates
//! fx-pfe generate --trades 10000 --rates rates.csv --output trades.csv
//!
//! # Compute PFE over 1..30 days and store it under the QUIC engine
//! fx-pfe run --rates rates.csv --trades trades.csv --engine quic
//!
//! # Mean PFE by currency pair and maturity for one counterparty
//! fx-pfe analyze --engine quic --counterparty 48213
//!
//! # Mean PFE per horizon day, trade snapshots, counterparty list
//! fx-pfe profile --engine f22 --counterparty 48213
//! fx-pfe snapshot --limit 100 --offset 200
//! fx-pfe counterparties --engine quic
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`). An analytics query
//! matching no stored rows exits with status 4.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use fx_pfe_engine::analytics::aggregator::PfeAnalysis;
use fx_pfe_engine::analytics::directory::counterparty_directory;
use fx_pfe_engine::analytics::profile::{horizon_profile, pfe_snapshots};
use fx_pfe_engine::analytics::query::{PfeQuery, QueryError};
use fx_pfe_engine::config::{ConfigError, EngineConfig};
use fx_pfe_engine::core::counterparty::{CounterpartyId, TransactionId};
use fx_pfe_engine::exposure::batch::{BatchRunner, HorizonGrid};
use fx_pfe_engine::exposure::pfe::{PfeCalculator, PfeError};
use fx_pfe_engine::exposure::policy::Engine;
use fx_pfe_engine::market::rate_history::{
    CsvRateSource, MarketDataError, RateHistory, RateSource,
};
use fx_pfe_engine::market::volatility::VolatilityBuilder;
use fx_pfe_engine::simulation::trade_generator::{generate_trades, GeneratorConfig};
use fx_pfe_engine::store::csv_store::{read_trades_csv, write_trades_csv};
use fx_pfe_engine::store::{open_store, PfeStore, StoreError};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "fx-pfe",
    version,
    about = "Parametric potential future exposure for FX forwards"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Engine selection shared by every store-backed command.
#[derive(Args, Debug)]
struct EngineArgs {
    /// TOML engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// F22 or QUIC (case-insensitive); overrides the config file
    #[arg(short, long)]
    engine: Option<Engine>,
}

#[derive(Args, Debug)]
struct ScopeArgs {
    #[command(flatten)]
    engine: EngineArgs,
    #[arg(long)]
    counterparty: Option<CounterpartyId>,
    #[arg(long)]
    transaction: Option<TransactionId>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic trade file
    Generate {
        #[arg(long, default_value_t = 1_000)]
        trades: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Rate history used for spot rates
        #[arg(long)]
        rates: Option<PathBuf>,
        /// Trading dates precede and maturities follow this date (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compute PFE for a trade file and replace the engine's stored tables
    Run {
        #[command(flatten)]
        engine: EngineArgs,
        /// Rate history CSV; overrides `rates_path` from the config
        #[arg(long)]
        rates: Option<PathBuf>,
        #[arg(long)]
        trades: PathBuf,
        #[arg(long)]
        confidence: Option<f64>,
        #[arg(long)]
        max_horizon: Option<u32>,
    },
    /// Mean PFE by currency pair and maturity bucket (JSON)
    Analyze {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Mean PFE per horizon day (JSON)
    Profile {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Stored trades with PFE at 5, 15 and 30 days (JSON)
    Snapshot {
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long, default_value_t = 1_000)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Counterparties and their transactions (JSON)
    Counterparties {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
    #[error(transparent)]
    Pfe(#[from] PfeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("{0}")]
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Query(QueryError::EmptyQueryScope) => 4,
            CliError::Config(_) | CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Generate {
            trades,
            seed,
            rates,
            as_of,
            output,
        } => cmd_generate(trades, seed, rates.as_deref(), as_of, &output),
        Command::Run {
            engine,
            rates,
            trades,
            confidence,
            max_horizon,
        } => cmd_run(&engine, rates, &trades, confidence, max_horizon),
        Command::Analyze { scope } => cmd_analyze(&scope),
        Command::Profile { scope } => cmd_profile(&scope),
        Command::Snapshot {
            engine,
            limit,
            offset,
        } => cmd_snapshot(&engine, limit, offset),
        Command::Counterparties { engine } => cmd_counterparties(&engine),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let reported = matches!(e, CliError::Query(QueryError::EmptyQueryScope))
                && print_json(&ErrorOutput {
                    error: e.to_string(),
                })
                .is_ok();
            if !reported {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Load the config file if given, then apply command-line overrides.
fn resolve_config(args: &EngineArgs) -> Result<EngineConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(engine) = args.engine {
        config.engine = engine;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_generate(
    trade_count: usize,
    seed: u64,
    rates: Option<&Path>,
    as_of: Option<NaiveDate>,
    output: &Path,
) -> Result<(), CliError> {
    let history = rates.map(RateHistory::from_csv_path).transpose()?;
    let config = GeneratorConfig {
        trade_count,
        seed,
        as_of: as_of.unwrap_or_else(|| chrono::Local::now().date_naive()),
        ..Default::default()
    };
    let set = generate_trades(&config, history.as_ref());
    write_trades_csv(output, set.trades())?;
    eprintln!(
        "Generated {} trades across {} counterparties → {}",
        set.len(),
        set.counterparties().len(),
        output.display()
    );
    Ok(())
}

fn cmd_run(
    args: &EngineArgs,
    rates: Option<PathBuf>,
    trades_path: &Path,
    confidence: Option<f64>,
    max_horizon: Option<u32>,
) -> Result<(), CliError> {
    let mut config = resolve_config(args)?;
    if let Some(level) = confidence {
        config.confidence_level = level;
    }
    if let Some(days) = max_horizon {
        config.max_horizon_days = days;
    }
    if rates.is_some() {
        config.rates_path = rates;
    }
    config.validate()?;

    let rates_path = config.rates_path.clone().ok_or_else(|| {
        CliError::Usage("a rate history is required: pass --rates or set rates_path".to_string())
    })?;
    let (start, end) = config.history_window();
    let history = CsvRateSource::new(rates_path).fetch(&config.pairs, start, end)?;
    let model = VolatilityBuilder::build(&history)?;

    let trades = read_trades_csv(trades_path)?;
    let calculator = PfeCalculator::for_engine(config.engine, config.confidence_level)?;
    let runner = BatchRunner::new(
        &model,
        calculator,
        HorizonGrid::up_to(config.max_horizon_days),
    );
    let results = runner.run(&trades);

    let mut store = open_store(&config.connection_string)?;
    store.replace_trades(config.engine, &trades)?;
    store.replace_results(config.engine, &results)?;
    info!(
        "{} run complete: {} trades, {} results in {}",
        config.engine,
        trades.len(),
        results.len(),
        config.connection_string
    );
    Ok(())
}

fn scoped_query(scope: &ScopeArgs) -> Result<(EngineConfig, PfeQuery), CliError> {
    let config = resolve_config(&scope.engine)?;
    let mut query = PfeQuery::new(config.engine);
    query.counterparty_id = scope.counterparty;
    query.transaction_id = scope.transaction;
    Ok((config, query))
}

fn cmd_analyze(scope: &ScopeArgs) -> Result<(), CliError> {
    let (config, query) = scoped_query(scope)?;
    let store = open_store(&config.connection_string)?;
    let records = query.resolve(store.as_ref())?;
    print_json(&PfeAnalysis::analyze(&records)?)
}

fn cmd_profile(scope: &ScopeArgs) -> Result<(), CliError> {
    let (config, query) = scoped_query(scope)?;
    let store = open_store(&config.connection_string)?;
    let records = query.resolve(store.as_ref())?;
    print_json(&horizon_profile(&records))
}

fn cmd_snapshot(args: &EngineArgs, limit: usize, offset: usize) -> Result<(), CliError> {
    let config = resolve_config(args)?;
    let store = open_store(&config.connection_string)?;
    let trades = PfeQuery::new(config.engine).trades(store.as_ref())?;
    let results = store.results(config.engine)?;
    print_json(&pfe_snapshots(&trades, &results, limit, offset))
}

fn cmd_counterparties(args: &EngineArgs) -> Result<(), CliError> {
    let config = resolve_config(args)?;
    let store = open_store(&config.connection_string)?;
    let trades = PfeQuery::new(config.engine).trades(store.as_ref())?;
    print_json(&counterparty_directory(&trades))
}
