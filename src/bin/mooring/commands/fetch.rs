//! Implementation of `mooring fetch`.

use std::time::Instant;

use anyhow::Result;

use mooring::core::manifest;
use mooring::ops::fetch::{fetch, FetchOptions};
use mooring::scheduler::DEFAULT_WORKERS;
use mooring::util::errors::FetchError;
use mooring::GlobalContext;

use crate::cli::FetchArgs;

pub fn execute(gctx: &GlobalContext, args: FetchArgs) -> Result<()> {
    let started = Instant::now();

    let target = match args.target {
        Some(target) => target,
        None => {
            // No target means "the package in this directory".
            let manifest_path =
                manifest::find_manifest(gctx.cwd()).ok_or_else(|| FetchError::ManifestNotFound {
                    path: gctx.cwd().to_path_buf(),
                })?;
            manifest_path.to_string_lossy().into_owned()
        }
    };

    let opts = FetchOptions {
        workers: args.jobs.unwrap_or(DEFAULT_WORKERS),
    };

    fetch(gctx.clone(), &target, &opts)?;

    tracing::info!("done in {:.1}s", started.elapsed().as_secs_f64());
    Ok(())
}
