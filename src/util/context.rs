//! Global context for mooring operations.
//!
//! Provides centralized access to the workspace and the tool's global state
//! directory (registry catalog checkout, process singleton lock).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Project directories for mooring.
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("dev", "mooring", "mooring"));

/// Global context containing the workspace and state paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory (the workspace root)
    cwd: PathBuf,

    /// Directory for global mooring state
    state_dir: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    ///
    /// The state directory can be overridden with `MOORING_HOME`, which
    /// tests use to stay out of the real home directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let state_dir = if let Some(home) = std::env::var_os("MOORING_HOME") {
            PathBuf::from(home)
        } else if let Some(dirs) = PROJECT_DIRS.as_ref() {
            dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".mooring")
        };

        Ok(GlobalContext { cwd, state_dir })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Get the workspace root.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global state directory.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Directory packages are fetched into.
    pub fn deps_dir(&self) -> PathBuf {
        self.cwd.join("deps")
    }

    /// The workspace compiler configuration file.
    pub fn nimcfg_path(&self) -> PathBuf {
        self.cwd.join("nim.cfg")
    }

    /// The workspace lock file.
    pub fn lockfile_path(&self) -> PathBuf {
        self.cwd.join("mooring.lock")
    }

    /// Local checkout of the registry catalog.
    pub fn catalog_dir(&self) -> PathBuf {
        self.state_dir.join("packages")
    }

    /// The catalog document inside the checkout.
    pub fn catalog_json_path(&self) -> PathBuf {
        self.catalog_dir().join("packages.json")
    }

    /// The process singleton lock directory.
    pub fn run_lock_path(&self) -> PathBuf {
        self.state_dir.join("run.lock")
    }

    /// Ensure a directory exists, creating it if necessary.
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_workspace_paths_derive_from_cwd() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();

        assert_eq!(ctx.deps_dir(), tmp.path().join("deps"));
        assert_eq!(ctx.nimcfg_path(), tmp.path().join("nim.cfg"));
        assert_eq!(ctx.lockfile_path(), tmp.path().join("mooring.lock"));
    }

    #[test]
    fn test_state_paths_derive_from_state_dir() {
        let ctx = GlobalContext::new().unwrap();

        assert_eq!(ctx.catalog_dir(), ctx.state_dir().join("packages"));
        assert_eq!(
            ctx.catalog_json_path(),
            ctx.state_dir().join("packages").join("packages.json")
        );
        assert_eq!(ctx.run_lock_path(), ctx.state_dir().join("run.lock"));
    }

    #[test]
    fn test_ensure_dir() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();

        let nested = tmp.path().join("a/b/c");
        ctx.ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
