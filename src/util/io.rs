//! Retry-wrapped filesystem and subprocess primitives.
//!
//! Every file read/write and git invocation in the fetch engine goes through
//! [`Io`], which retries transient failures with a linearly increasing delay
//! before escalating to [`FetchError::RetriesExhausted`]. A single mutex
//! serializes whole retry sequences so two workers cannot interleave retries
//! against the same file.

use std::fs;
use std::path::Path;
use std::process::Output;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::util::errors::FetchError;
use crate::util::process::ProcessBuilder;

/// Total attempts per operation: one initial try plus two retries.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base delay; a failed attempt `n` waits `n * RETRY_DELAY` before the next.
pub const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Decides whether an attempt should fail synthetically before the real
/// operation runs. Exists to exercise the retry path in tests; the retry
/// logic must behave identically with [`NoFaults`].
pub trait FaultPlan: Send + Sync {
    fn should_fail(&self, operation: &str) -> bool;
}

/// Never injects a failure.
pub struct NoFaults;

impl FaultPlan for NoFaults {
    fn should_fail(&self, _operation: &str) -> bool {
        false
    }
}

/// Fails each attempt with a fixed probability.
#[cfg(feature = "fault-injection")]
pub struct RandomFaults {
    pub probability: f64,
}

#[cfg(feature = "fault-injection")]
impl FaultPlan for RandomFaults {
    fn should_fail(&self, _operation: &str) -> bool {
        rand::random::<f64>() < self.probability
    }
}

/// The resilient I/O layer.
pub struct Io {
    faults: Box<dyn FaultPlan>,
    retry_lock: Mutex<()>,
}

impl Io {
    /// Create the production I/O layer.
    ///
    /// With the `fault-injection` feature enabled, the failure rate is read
    /// from `MOORING_FAULT_RATE` (default 0.1).
    pub fn new() -> Self {
        Io::with_faults(default_faults())
    }

    /// Create an I/O layer with an explicit fault plan.
    pub fn with_faults(faults: Box<dyn FaultPlan>) -> Self {
        Io {
            faults,
            retry_lock: Mutex::new(()),
        }
    }

    /// Read a file to string, retrying transient failures.
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let operation = format!("read {}", path.display());
        self.with_retry(&operation, || {
            fs::read_to_string(path)
                .with_context(|| format!("failed to read file: {}", path.display()))
        })
    }

    /// Write a string to a file, creating parent directories if needed.
    pub fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let operation = format!("write {}", path.display());
        self.with_retry(&operation, || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory: {}", parent.display())
                })?;
            }
            fs::write(path, contents)
                .with_context(|| format!("failed to write file: {}", path.display()))
        })
    }

    /// Run a subprocess, retrying on spawn failure or non-zero exit.
    pub fn run_command(&self, cmd: &ProcessBuilder) -> Result<Output> {
        let operation = format!("run `{}`", cmd.display_command());
        self.with_retry(&operation, || cmd.exec_and_check())
    }

    /// Fire-once subprocess execution: no retry, no exit-status check.
    ///
    /// Used where the caller branches on the raw exit status instead of
    /// retrying the same command (a failed shallow checkout falls back to a
    /// deeper fetch, it is not re-run as-is).
    pub fn run_command_once(&self, cmd: &ProcessBuilder) -> Result<Output> {
        self.attempt(&format!("run `{}`", cmd.display_command()), &mut || {
            cmd.exec()
        })
    }

    fn with_retry<T>(&self, operation: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let _guard = self.retry_lock.lock().unwrap();

        let mut last = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(operation, &mut f) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {:#}",
                        operation,
                        attempt,
                        MAX_ATTEMPTS,
                        err
                    );
                    last = Some(err);
                    if attempt < MAX_ATTEMPTS {
                        std::thread::sleep(RETRY_DELAY * attempt);
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            operation: operation.to_string(),
            attempts: MAX_ATTEMPTS,
            message: format!("{:#}", last.unwrap()),
        }
        .into())
    }

    fn attempt<T>(&self, operation: &str, f: &mut impl FnMut() -> Result<T>) -> Result<T> {
        if self.faults.should_fail(operation) {
            bail!("injected fault during {}", operation);
        }
        f()
    }
}

impl Default for Io {
    fn default() -> Self {
        Io::new()
    }
}

#[cfg(feature = "fault-injection")]
fn default_faults() -> Box<dyn FaultPlan> {
    let probability = std::env::var("MOORING_FAULT_RATE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.1);
    Box::new(RandomFaults { probability })
}

#[cfg(not(feature = "fault-injection"))]
fn default_faults() -> Box<dyn FaultPlan> {
    Box::new(NoFaults)
}
