//! Typed errors for the fetch engine.
//!
//! Transient failures are retried inside [`crate::util::io`] and never reach
//! callers; everything here propagates to the top level, which releases the
//! process singleton lock and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failure modes of a fetch run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A required manifest did not appear within the bounded retries.
    #[error("no .nimble manifest found at {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The registry has no entry for the requested package.
    #[error("package `{name}` is not in the registry")]
    UnknownPackage { name: String },

    /// The registry entry declares a fetch method we cannot perform.
    #[error("unsupported fetch method `{method}` for package `{name}`")]
    UnsupportedMethod { name: String, method: String },

    /// A transient operation kept failing until the retry budget ran out.
    #[error("{operation} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        message: String,
    },

    /// Another mooring process holds the singleton lock.
    #[error(
        "another mooring instance is running (lock at {}); remove the directory if it is stale",
        path.display()
    )]
    AlreadyRunning { path: PathBuf },
}
