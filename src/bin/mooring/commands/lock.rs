//! Implementation of `mooring lock`.

use anyhow::Result;

use mooring::core::manifest;
use mooring::ops::lockfile::{generate_lock, write_lock, GitOriginProbe};
use mooring::sources::git::GitCli;
use mooring::util::errors::FetchError;
use mooring::util::io::Io;
use mooring::GlobalContext;

use crate::cli::LockArgs;

pub fn execute(gctx: &GlobalContext, args: LockArgs) -> Result<()> {
    let io = Io::new();
    let git = GitCli::discover()?;

    let manifest_path =
        manifest::find_manifest(gctx.cwd()).ok_or_else(|| FetchError::ManifestNotFound {
            path: gctx.cwd().to_path_buf(),
        })?;

    let probe = GitOriginProbe { io: &io, git: &git };
    let entries = generate_lock(&io, &gctx.deps_dir(), &manifest_path, &probe)?;

    let output = args.output.unwrap_or_else(|| gctx.lockfile_path());
    write_lock(&io, &output, &entries)?;

    tracing::info!("froze {} packages into {}", entries.len(), output.display());
    Ok(())
}
