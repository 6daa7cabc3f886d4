//! Core data structures for mooring.
//!
//! - Dependency requirements as declared in `.nimble` manifests
//! - Manifest records
//! - The registry catalog

pub mod dependency;
pub mod manifest;
pub mod registry;

pub use dependency::Dependency;
pub use manifest::{find_manifest, parse_manifest, ManifestRecord, MANIFEST_EXT};
pub use registry::{CatalogEntry, Registry};
