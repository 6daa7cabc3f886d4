//! Package sources.
//!
//! All packages come from version control; the git collaborator shells out
//! to the system `git` through the resilient I/O layer.

pub mod git;

pub use git::{parse_source_url, GitCli, SourceUrl};
