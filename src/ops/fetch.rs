//! The fetch engine: per-job dispatch and the top-level fetch entry point.
//!
//! Each queued identifier is one of four shapes: a `.nimble` manifest path,
//! a locked `name version url revision` record, a git URL, or a bare
//! package name. Whatever the shape, processing ends the same way: the
//! package's source root is added to `nim.cfg` and its declared
//! dependencies are enqueued, so pre-existing packages still contribute to
//! the config and to recursive expansion.
//!
//! There is no partial-success mode. Any unrecoverable failure inside a
//! worker releases the process singleton lock and terminates the run with a
//! non-zero status; an incomplete dependency graph must never be reported
//! as success.

use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;

use crate::core::dependency::Dependency;
use crate::core::manifest::{self, ManifestRecord, MANIFEST_EXT};
use crate::core::registry::{self, CatalogEntry, Registry};
use crate::ops::lockfile::LockEntry;
use crate::scheduler::{Scheduler, DEFAULT_WORKERS};
use crate::sources::git::{parse_source_url, GitCli};
use crate::util::context::GlobalContext;
use crate::util::errors::FetchError;
use crate::util::io::Io;
use crate::util::nimcfg;
use crate::util::runlock::RunLock;

/// Options for the fetch engine.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Worker pool size
    pub workers: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Everything a worker needs, shared across the pool by reference.
pub struct FetchContext {
    pub gctx: GlobalContext,
    pub io: Io,
    pub git: GitCli,
    pub scheduler: Scheduler,
    registry: Mutex<Option<Registry>>,
}

impl FetchContext {
    /// Build a context for one command invocation.
    pub fn new(gctx: GlobalContext) -> Result<FetchContext> {
        let git = GitCli::discover()?;
        Ok(FetchContext {
            gctx,
            io: Io::new(),
            git,
            scheduler: Scheduler::new(),
            registry: Mutex::new(None),
        })
    }

    /// Look up a package in the catalog, refreshing it first if this is the
    /// process's first lookup.
    fn lookup(&self, name: &str) -> Result<Option<CatalogEntry>> {
        self.scheduler.refresh_catalog_once(|| {
            registry::refresh_catalog(&self.io, self.git.program(), &self.gctx.catalog_dir())
        })?;

        let mut cached = self.registry.lock().unwrap();
        if cached.is_none() {
            *cached = Some(Registry::load(&self.io, &self.gctx.catalog_json_path())?);
        }
        Ok(cached.as_ref().unwrap().lookup(name).cloned())
    }
}

/// Fetch `target` and its transitive dependencies.
///
/// Enqueues the one seed job, then blocks until the pool drains.
pub fn fetch(gctx: GlobalContext, target: &str, opts: &FetchOptions) -> Result<()> {
    let ctx = FetchContext::new(gctx)?;
    ctx.scheduler.enqueue(target);
    run_pool(&ctx, opts.workers)
}

/// Drain the queue with the fatal-error policy applied to every job.
pub fn run_pool(ctx: &FetchContext, workers: usize) -> Result<()> {
    ctx.gctx.ensure_dir(&ctx.gctx.deps_dir())?;

    ctx.scheduler.run(workers, |job| {
        if let Err(err) = process_job(ctx, job) {
            fatal(ctx, job, err);
        }
        Ok(())
    })
}

/// Unrecoverable worker failure: report, release the singleton lock, die.
fn fatal(ctx: &FetchContext, job: &str, err: anyhow::Error) -> ! {
    tracing::error!("failed on `{}`: {:#}", job, err);
    RunLock::force_release(&ctx.gctx.run_lock_path());
    std::process::exit(1);
}

/// The shape of one queued identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    ManifestPath,
    LockedRecord,
    SourceUrl,
    PackageName,
}

/// Classify an identifier by its shape.
pub fn classify(job: &str) -> JobKind {
    if Path::new(job)
        .extension()
        .is_some_and(|ext| ext == MANIFEST_EXT)
    {
        JobKind::ManifestPath
    } else if job.split_whitespace().count() == 4 {
        JobKind::LockedRecord
    } else if job.contains("://") {
        JobKind::SourceUrl
    } else {
        JobKind::PackageName
    }
}

/// Process one queued identifier.
pub fn process_job(ctx: &FetchContext, job: &str) -> Result<()> {
    tracing::debug!("processing `{}`", job);

    match classify(job) {
        JobKind::ManifestPath => fetch_manifest_path(ctx, Path::new(job)),
        JobKind::LockedRecord => fetch_locked(ctx, job),
        JobKind::SourceUrl => fetch_url(ctx, job),
        JobKind::PackageName => fetch_named(ctx, job),
    }
}

/// The manifest's directory is already the fetched package.
fn fetch_manifest_path(ctx: &FetchContext, manifest_path: &Path) -> Result<()> {
    // Resolve relative invocations so the config entry is usable from
    // anywhere.
    let manifest_path = manifest_path
        .canonicalize()
        .unwrap_or_else(|_| manifest_path.to_path_buf());
    let record = manifest::parse_manifest(&ctx.io, &manifest_path)?;
    register(ctx, &record)
}

/// Bare name: resolve through the registry, then shallow-clone.
fn fetch_named(ctx: &FetchContext, name: &str) -> Result<()> {
    let dest = ctx.gctx.deps_dir().join(name);

    if dest.exists() {
        tracing::debug!("`{}` already present", name);
    } else {
        let entry = ctx.lookup(name)?.ok_or_else(|| FetchError::UnknownPackage {
            name: name.to_string(),
        })?;
        if entry.method != "git" {
            return Err(FetchError::UnsupportedMethod {
                name: name.to_string(),
                method: entry.method,
            }
            .into());
        }
        ctx.git.shallow_clone(&ctx.io, &entry.url, &dest, true)?;
    }

    register_dir(ctx, &dest)
}

/// Git URL: derive the name from the last path segment, check out the
/// fragment if one was given.
fn fetch_url(ctx: &FetchContext, raw: &str) -> Result<()> {
    let src = parse_source_url(raw)?;
    let dest = ctx.gctx.deps_dir().join(&src.name);

    if dest.exists() {
        tracing::debug!("`{}` already present", src.name);
    } else {
        ctx.git.shallow_clone(&ctx.io, &src.url, &dest, true)?;
        if !src.fragment.is_empty() {
            ctx.git.checkout_revision(&ctx.io, &dest, &src.fragment)?;
        }
    }

    register_dir(ctx, &dest)
}

/// Locked record: reproduce the exact revision.
///
/// An existing checkout at the wrong revision is fetched and checked out
/// over whatever local state it has; the managed deps workspace is treated
/// as disposable.
fn fetch_locked(ctx: &FetchContext, job: &str) -> Result<()> {
    let Some(entry) = LockEntry::parse_line(job) else {
        tracing::warn!("skipping malformed locked record `{}`", job);
        return Ok(());
    };
    let dest = ctx.gctx.deps_dir().join(&entry.name);

    if !dest.exists() {
        ctx.git
            .shallow_clone(&ctx.io, &entry.url, &dest, false)?;
        ctx.git.fetch_revision(&ctx.io, &dest, &entry.revision)?;
        ctx.git.checkout_revision(&ctx.io, &dest, &entry.revision)?;
    } else if ctx.git.current_revision(&ctx.io, &dest)? != entry.revision {
        tracing::info!("`{}` is at the wrong revision, resetting", entry.name);
        ctx.git.fetch_revision(&ctx.io, &dest, &entry.revision)?;
        ctx.git.checkout_revision(&ctx.io, &dest, &entry.revision)?;
    }

    register_dir(ctx, &dest)
}

/// Read the manifest inside an installed package directory and register it.
fn register_dir(ctx: &FetchContext, dir: &Path) -> Result<()> {
    let manifest_path =
        manifest::find_manifest(dir).ok_or_else(|| FetchError::ManifestNotFound {
            path: dir.to_path_buf(),
        })?;
    let record = manifest::parse_manifest(&ctx.io, &manifest_path)?;
    register(ctx, &record)
}

/// Add the package's source root to the config and enqueue its
/// dependencies. Config mutation shares the scheduler lock.
fn register(ctx: &FetchContext, record: &ManifestRecord) -> Result<()> {
    ctx.scheduler.with_lock(|| {
        nimcfg::add_search_path(&ctx.io, &ctx.gctx.nimcfg_path(), &record.source_root())
    })?;

    for dep in &record.dependencies {
        enqueue_dependency(&ctx.scheduler, dep);
    }
    Ok(())
}

/// Enqueue a declared dependency by name. Language pseudo-dependencies are
/// handled by the toolchain and never queued.
fn enqueue_dependency(scheduler: &Scheduler, dep: &Dependency) {
    if dep.is_language() {
        tracing::debug!("skipping language dependency `{}`", dep.name);
        return;
    }
    scheduler.enqueue(dep.name.clone());
}
