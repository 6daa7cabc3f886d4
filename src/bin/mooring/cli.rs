//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Mooring - a minimal package manager for Nim
#[derive(Parser)]
#[command(name = "mooring")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a package and its transitive dependencies into deps/
    Fetch(FetchArgs),

    /// Freeze the resolved dependency set into mooring.lock
    Lock(LockArgs),

    /// Reproduce the dependency set frozen in a lock file
    Sync(SyncArgs),
}

#[derive(Args)]
pub struct FetchArgs {
    /// Package name, git URL, or path to a .nimble manifest
    /// (defaults to the manifest in the current directory)
    pub target: Option<String>,

    /// Number of worker threads
    #[arg(short, long, env = "MOORING_JOBS")]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct LockArgs {
    /// Where to write the lock file (defaults to mooring.lock)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Lock file to synchronize from (defaults to mooring.lock)
    pub path: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, env = "MOORING_JOBS")]
    pub jobs: Option<usize>,
}
