//! Mooring - a minimal package manager for Nim projects.
//!
//! This crate provides the core library functionality for Mooring:
//! recursive dependency fetching into a workspace `deps/` directory,
//! `nim.cfg` search-path maintenance, and lock file freeze/restore.

pub mod core;
pub mod ops;
pub mod scheduler;
pub mod sources;
pub mod util;

pub use crate::core::{dependency::Dependency, manifest::ManifestRecord, registry::Registry};

pub use crate::ops::lockfile::LockEntry;
pub use crate::scheduler::Scheduler;
pub use crate::util::context::GlobalContext;
pub use crate::util::errors::FetchError;
pub use crate::util::io::Io;
