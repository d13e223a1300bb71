use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

mod client;
mod console;
mod repl;
mod utils;

use client::memory::{DATABASE_COUNT, MemoryBackend, MemoryStore};
use client::{ConnectConfig, Mode, TargetSpec};
use console::Dispatcher;

/// kvsh - interactive console for Redis-compatible key-value stores
///
/// Targets:
///   memory            Embedded in-memory store, database 0 (default)
///   memory:N          Embedded store, database N
///   memory://name/N   Embedded store with a profile name for the prompt
///   redis://host:port Remote endpoint (recognized; transport not bundled,
///                     backends plug in through the Connection trait)
///
/// Global flags / env:
///   -v / -vv        Increase verbosity
///   -q / --quiet    Errors only
///   -t / --target   Target store (or KVSH_TARGET env)
///   KVSH_TARGET     Environment fallback if -t not provided
///
/// Examples:
///   kvsh
///   kvsh -t memory:2 --name cache1
///   kvsh --cluster --name cache1
///   kvsh --json -q
#[derive(Parser, Debug)]
#[command(
    name = "kvsh",
    version,
    author,
    about = "kvsh - interactive console for Redis-compatible key-value stores",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Target store (memory[:db], memory://name/db, or redis:// URL)
    #[arg(short = 't', long = "target", value_name = "TARGET")]
    target: Option<String>,

    /// Display name used in the prompt
    #[arg(long, value_name = "NAME")]
    name: Option<String>,

    /// Initial database index (standalone mode)
    #[arg(long, value_name = "INDEX")]
    db: Option<u32>,

    /// Simulate cluster topology on the embedded store
    #[arg(long)]
    cluster: bool,

    /// Emit events as JSON lines instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    // Determine effective target (CLI flag > KVSH_TARGET env > embedded default)
    let mut raw_target = cli.target.clone();
    if raw_target.is_none()
        && let Ok(env_t) = std::env::var("KVSH_TARGET")
        && !env_t.trim().is_empty()
    {
        raw_target = Some(env_t);
    }
    let raw_target = raw_target.unwrap_or_else(|| "memory".to_string());

    let spec = match client::parse_target(&raw_target) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Invalid target '{}': {e}", raw_target);
            std::process::exit(2);
        }
    };

    let (profile_name, target_db) = match spec {
        TargetSpec::Memory { name, db } => (name, db),
        TargetSpec::Remote { url, .. } => {
            eprintln!(
                "Remote target '{url}' is not supported yet; only the embedded memory store is available."
            );
            std::process::exit(2);
        }
    };

    let db = cli.db.unwrap_or(target_db);
    if db as usize >= DATABASE_COUNT {
        eprintln!("Database index {db} is out of range (0..{DATABASE_COUNT}).");
        std::process::exit(2);
    }

    let mode = if cli.cluster {
        Mode::Cluster
    } else {
        Mode::Standalone
    };
    let name = cli
        .name
        .or(profile_name)
        .unwrap_or_else(|| "memory".to_string());
    let config = ConnectConfig {
        name,
        host: "local".to_string(),
        port: 0,
    };

    crate::log_info!("attaching to '{}' (mode {:?}, db {})", raw_target, mode, db);

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(async {
        let store = MemoryStore::new();
        let backend = MemoryBackend::attach(store, config, mode, db);
        let (dispatcher, events) = Dispatcher::new(Arc::new(backend));
        repl::run(dispatcher, events, repl::ReplOptions { json: cli.json }).await
    })
}
