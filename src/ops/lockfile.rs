//! Lock file freeze and restore.
//!
//! The lock file is plain text, one `name version url revision` record per
//! line, space separated, no escaping — names and URLs containing spaces
//! are unsupported. Generation walks the dependency graph pre-order from
//! the root manifest with first-discovery-wins dedup, so an unchanged graph
//! always produces byte-identical output.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use crate::core::manifest::{self, ManifestRecord};
use crate::ops::fetch::{run_pool, FetchContext};
use crate::sources::git::GitCli;
use crate::util::errors::FetchError;
use crate::util::io::Io;

/// One resolved package, frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub name: String,
    pub version: String,
    pub url: String,
    pub revision: String,
}

impl LockEntry {
    /// Parse one lock line. Anything but exactly four fields is `None`.
    pub fn parse_line(line: &str) -> Option<LockEntry> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, version, url, revision] = fields.as_slice() else {
            return None;
        };
        Some(LockEntry {
            name: name.to_string(),
            version: version.to_string(),
            url: url.to_string(),
            revision: revision.to_string(),
        })
    }

    /// The line form written to the lock file.
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name, self.version, self.url, self.revision
        )
    }
}

/// Recovers the `(url, revision)` pair of an installed package when
/// freezing. Production probes the git checkout; tests stub this.
pub trait OriginProbe {
    fn origin(&self, name: &str, install_dir: &Path) -> Result<(String, String)>;
}

/// Probe backed by the package's own clone: origin remote URL plus the
/// checked-out HEAD. Works for registry- and URL-sourced packages alike,
/// and needs no network.
pub struct GitOriginProbe<'a> {
    pub io: &'a Io,
    pub git: &'a GitCli,
}

impl OriginProbe for GitOriginProbe<'_> {
    fn origin(&self, _name: &str, install_dir: &Path) -> Result<(String, String)> {
        let url = self.git.origin_url(self.io, install_dir)?;
        let revision = self.git.current_revision(self.io, install_dir)?;
        Ok((url, revision))
    }
}

/// Freeze the transitive dependency closure of the manifest at
/// `root_manifest`, reading each dependency's installed copy under
/// `deps_dir`.
///
/// Pre-order: each newly discovered package is emitted, then its own
/// manifest is recursed into before its siblings continue. Duplicates keep
/// their first-discovered position. Single-threaded and deterministic, in
/// contrast to the racing fetch pool.
pub fn generate_lock(
    io: &Io,
    deps_dir: &Path,
    root_manifest: &Path,
    probe: &dyn OriginProbe,
) -> Result<Vec<LockEntry>> {
    let root = manifest::parse_manifest(io, root_manifest)?;

    let mut listed = HashSet::new();
    let mut entries = Vec::new();
    visit(io, deps_dir, &root, probe, &mut listed, &mut entries)?;
    Ok(entries)
}

fn visit(
    io: &Io,
    deps_dir: &Path,
    record: &ManifestRecord,
    probe: &dyn OriginProbe,
    listed: &mut HashSet<String>,
    entries: &mut Vec<LockEntry>,
) -> Result<()> {
    for dep in &record.dependencies {
        if !listed.insert(dep.name.clone()) {
            continue;
        }

        let install_dir = deps_dir.join(&dep.name);
        let manifest_path =
            manifest::find_manifest(&install_dir).ok_or_else(|| FetchError::ManifestNotFound {
                path: install_dir.clone(),
            })?;
        let dep_record = manifest::parse_manifest(io, &manifest_path)?;
        let (url, revision) = probe.origin(&dep.name, &install_dir)?;

        entries.push(LockEntry {
            name: dep.name.clone(),
            version: dep_record.version.clone(),
            url,
            revision,
        });

        visit(io, deps_dir, &dep_record, probe, listed, entries)?;
    }
    Ok(())
}

/// Write lock entries to `path`, one per line.
pub fn write_lock(io: &Io, path: &Path, entries: &[LockEntry]) -> Result<()> {
    let mut contents = String::new();
    for entry in entries {
        contents.push_str(&entry.to_line());
        contents.push('\n');
    }
    io.write_file(path, &contents)
}

/// Reproduce the dependency set frozen in the lock file at `path`.
///
/// Every well-formed 4-field line becomes a locked-record job; malformed
/// lines are skipped, not errors. Blocks until the pool drains.
pub fn sync_from_lock(ctx: &FetchContext, path: &Path, workers: usize) -> Result<()> {
    let text = ctx.io.read_file(path)?;

    for line in text.lines() {
        match LockEntry::parse_line(line) {
            Some(entry) => ctx.scheduler.enqueue(entry.to_line()),
            None => {
                if !line.trim().is_empty() {
                    tracing::warn!("skipping malformed lock line: {}", line);
                }
            }
        }
    }

    run_pool(ctx, workers)
}
