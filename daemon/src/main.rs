//! delegraph daemon — entry point for replaying governance event journals.
//!
//! Reads a newline-delimited JSON journal of typed chain events, drives it
//! through the pipeline against the in-memory backend, and prints a summary
//! of the derived voting-power state.

use anyhow::{Context, Result};
use blake2::{Blake2b512, Digest};
use clap::{Parser, Subcommand};
use delegraph_engine::{EngineConfig, ProxyResolver, ResolveError, Session};
use delegraph_pipeline::{replay, ChainEvent, Processor};
use delegraph_store::{
    AccountStore, DelegateStore, GrantStore, ProxyStore, SnapshotStore, TriggerStore,
};
use delegraph_store_memory::MemoryStore;
use delegraph_types::Address;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delegraph", about = "Governance sub-delegation voting-power indexer")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "DELEGRAPH_LOG_LEVEL")]
    log_level: String,

    /// Emit newline-delimited JSON logs instead of human-readable lines.
    #[arg(long, env = "DELEGRAPH_LOG_JSON")]
    log_json: bool,

    /// Trigger catch-up scan window, in seconds.
    #[arg(
        long,
        default_value_t = delegraph_engine::DEFAULT_TRIGGER_LOOKBACK,
        env = "DELEGRAPH_LOOKBACK"
    )]
    lookback: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay an event journal and print the derived state summary.
    Replay {
        /// Path to the newline-delimited JSON journal.
        #[arg(long)]
        events: PathBuf,
    },
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` overrides the CLI level when set.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Deterministic stand-in for the on-chain proxy-account read: the proxy
/// address is a hash of the owner address. Stable across runs, so replays
/// of the same journal derive identical state.
struct DerivedProxyResolver;

impl ProxyResolver for DerivedProxyResolver {
    fn resolve(&self, owner: &Address) -> Result<Address, ResolveError> {
        let digest = Blake2b512::digest(owner.as_str().as_bytes());
        Ok(Address::new(format!("0x{}", hex::encode(&digest[..20]))))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    match cli.command {
        Command::Replay { events } => run_replay(&events, cli.lookback),
    }
}

fn run_replay(path: &PathBuf, lookback: u64) -> Result<()> {
    let journal = read_journal(path)?;
    tracing::info!(path = %path.display(), events = journal.len(), lookback, "starting replay");

    let session = Session::new(
        MemoryStore::new(),
        DerivedProxyResolver,
        EngineConfig {
            trigger_lookback: lookback,
        },
    );
    let mut processor = Processor::new(session);
    let stats = replay(&mut processor, journal).context("replay failed")?;

    print_summary(&processor, &stats)?;
    Ok(())
}

fn read_journal(path: &PathBuf) -> Result<Vec<ChainEvent>> {
    let file =
        File::open(path).with_context(|| format!("cannot open journal {}", path.display()))?;
    let mut events = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("journal read error at line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ChainEvent = serde_json::from_str(&line)
            .with_context(|| format!("malformed event at line {}", idx + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn print_summary(
    processor: &Processor<MemoryStore, DerivedProxyResolver>,
    stats: &delegraph_pipeline::ReplayStats,
) -> Result<()> {
    let store = processor.session().store();
    println!("replay: {} events across {} blocks, {} trigger recomputations", stats.events, stats.blocks, stats.triggers_fired);
    println!(
        "state:  {} accounts, {} delegates, {} grants, {} proxies, {} pending triggers",
        store.account_count()?,
        store.delegate_count()?,
        store.grant_count()?,
        store.proxy_count()?,
        store.trigger_count()?,
    );
    println!(
        "daily:  {} balance snapshots, {} delegate snapshots",
        store.daily_balance_count()?,
        store.daily_delegate_count()?,
    );

    let mut delegates = store.iter_delegates()?;
    delegates.sort_by(|a, b| b.total_power.cmp(&a.total_power));
    println!("top delegates by total voting power:");
    for d in delegates.iter().take(10) {
        println!(
            "  {}  total={}  direct={}  sub={}{}",
            d.address,
            d.total_power,
            d.direct_power,
            d.sub_power,
            if d.is_proxy { "  (proxy)" } else { "" },
        );
    }
    Ok(())
}
