//! Mooring CLI - a minimal package manager for Nim

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mooring::util::errors::FetchError;
use mooring::util::runlock::RunLock;
use mooring::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("mooring=debug")
    } else {
        EnvFilter::new("mooring=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let gctx = GlobalContext::new()?;

    // One live instance per machine. The guard's Drop releases the lock on
    // every return path, including unwinding; worker fatal paths release it
    // explicitly before exiting.
    let Some(_lock) = RunLock::acquire(&gctx.run_lock_path())? else {
        return Err(FetchError::AlreadyRunning {
            path: gctx.run_lock_path(),
        }
        .into());
    };

    // Execute command
    match cli.command {
        Commands::Fetch(args) => commands::fetch::execute(&gctx, args),
        Commands::Lock(args) => commands::lock::execute(&gctx, args),
        Commands::Sync(args) => commands::sync::execute(&gctx, args),
    }
}
