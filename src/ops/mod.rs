//! High-level operations.
//!
//! This module contains the implementation of mooring commands.

pub mod fetch;
pub mod lockfile;

pub use fetch::{fetch, FetchContext, FetchOptions};
pub use lockfile::{generate_lock, sync_from_lock, write_lock, LockEntry};
