//! Implementation of `mooring sync`.

use std::time::Instant;

use anyhow::{bail, Result};

use mooring::ops::fetch::FetchContext;
use mooring::ops::lockfile::sync_from_lock;
use mooring::scheduler::DEFAULT_WORKERS;
use mooring::GlobalContext;

use crate::cli::SyncArgs;

pub fn execute(gctx: &GlobalContext, args: SyncArgs) -> Result<()> {
    let started = Instant::now();

    let path = args.path.unwrap_or_else(|| gctx.lockfile_path());
    if !path.exists() {
        bail!(
            "no lock file at {}; run `mooring lock` first",
            path.display()
        );
    }

    let workers = args.jobs.unwrap_or(DEFAULT_WORKERS);
    let ctx = FetchContext::new(gctx.clone())?;
    sync_from_lock(&ctx, &path, workers)?;

    tracing::info!("done in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}
