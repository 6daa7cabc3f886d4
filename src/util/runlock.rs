//! Process singleton lock.
//!
//! A single directory under the tool's state dir acts as a mutual-exclusion
//! token between concurrent mooring invocations. `create_dir` is atomic
//! against races, unlike an existence check followed by a create. A hard
//! crash (no unwinding) leaves a stale lock that must be removed by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// RAII guard for the singleton lock directory.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    held: bool,
}

impl RunLock {
    /// Try to acquire the lock. `Ok(None)` means another instance holds it.
    pub fn acquire(path: &Path) -> Result<Option<RunLock>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        match fs::create_dir(path) {
            Ok(()) => Ok(Some(RunLock {
                path: path.to_path_buf(),
                held: true,
            })),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("failed to create lock directory: {}", path.display())),
        }
    }

    /// Release the lock. Safe to call more than once.
    pub fn release(&mut self) {
        if self.held {
            let _ = fs::remove_dir(&self.path);
            self.held = false;
        }
    }

    /// Remove the lock directory without a guard in hand.
    ///
    /// Fatal worker paths terminate via `process::exit`, which skips Drop;
    /// they call this first.
    pub fn force_release(path: &Path) {
        let _ = fs::remove_dir(path);
    }

    /// The lock directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}
