//! Git operations, shelled out to the system `git`.
//!
//! Clones are shallow (`--depth 1`) to minimize transfer time. Every call
//! runs through [`Io`], so transient network failures are retried; the one
//! exception is the first checkout of a pinned revision, which is fired
//! once and falls back to a deeper fetch when the shallow history does not
//! contain the commit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::util::io::Io;
use crate::util::process::{find_git, ProcessBuilder};

/// Handle to the external git executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Locate git on this machine.
    pub fn discover() -> Result<GitCli> {
        let program = find_git().context("git executable not found in PATH")?;
        Ok(GitCli { program })
    }

    /// Create a handle for a known git path.
    pub fn at(program: impl Into<PathBuf>) -> GitCli {
        GitCli {
            program: program.into(),
        }
    }

    /// Path of the git executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn cmd(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
    }

    /// Shallow-clone `url` into `dest`. With `checkout` false the working
    /// tree is left unpopulated for a later exact-revision checkout.
    pub fn shallow_clone(&self, io: &Io, url: &str, dest: &Path, checkout: bool) -> Result<()> {
        tracing::info!("cloning {}", url);

        let mut cmd = self.cmd().args(["clone", "--depth", "1"]);
        if !checkout {
            cmd = cmd.arg("--no-checkout");
        }
        io.run_command(&cmd.arg(url).arg(dest))?;
        Ok(())
    }

    /// Fetch a specific revision into an existing shallow clone.
    pub fn fetch_revision(&self, io: &Io, dest: &Path, revision: &str) -> Result<()> {
        io.run_command(
            &self
                .cmd()
                .cwd(dest)
                .args(["fetch", "--depth", "1", "origin"])
                .arg(revision),
        )?;
        Ok(())
    }

    /// Check out `revision`, deepening the clone if the shallow history does
    /// not contain it.
    pub fn checkout_revision(&self, io: &Io, dest: &Path, revision: &str) -> Result<()> {
        let checkout = self.cmd().cwd(dest).args(["checkout", "--quiet"]).arg(revision);

        // First try against what we have; a miss here is expected, not a
        // transient failure worth re-running verbatim.
        let output = io.run_command_once(&checkout)?;
        if output.status.success() {
            return Ok(());
        }

        tracing::debug!(
            "revision {} not in shallow history of {}, deepening",
            revision,
            dest.display()
        );
        io.run_command(&self.cmd().cwd(dest).args(["fetch", "origin"]))?;
        io.run_command(&checkout)?;
        Ok(())
    }

    /// The currently checked-out commit hash.
    pub fn current_revision(&self, io: &Io, dest: &Path) -> Result<String> {
        let output = io.run_command(&self.cmd().cwd(dest).args(["rev-parse", "HEAD"]))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// The clone's origin remote URL.
    pub fn origin_url(&self, io: &Io, dest: &Path) -> Result<String> {
        let output = io.run_command(
            &self
                .cmd()
                .cwd(dest)
                .args(["config", "--get", "remote.origin.url"]),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// A source URL split into its useful parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    /// The URL to clone, with any fragment stripped
    pub url: String,

    /// Package name derived from the last path segment
    pub name: String,

    /// Optional branch/tag/revision from the URL fragment
    pub fragment: String,
}

/// Split a raw source URL: the last path segment (minus a `.git` suffix)
/// names the package, and a `#fragment` selects a branch, tag, or revision.
pub fn parse_source_url(raw: &str) -> Result<SourceUrl> {
    let mut parsed =
        Url::parse(raw).with_context(|| format!("invalid source URL: {}", raw))?;

    let fragment = parsed.fragment().unwrap_or("").to_string();
    parsed.set_fragment(None);

    let name = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.strip_suffix(".git").unwrap_or(s).to_string())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("cannot derive a package name from: {}", raw))?;

    Ok(SourceUrl {
        url: parsed.to_string(),
        name,
        fragment,
    })
}
