//! Registry catalog lookup.
//!
//! The catalog is the community `packages.json` index: a JSON array of
//! entries carrying at least `name`, `method`, and `url`, plus alias
//! entries pointing at a canonical name. It is consumed read-only; the
//! local checkout is refreshed at most once per process (the caller
//! serializes [`refresh_catalog`] behind the scheduler lock).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::io::Io;
use crate::util::process::ProcessBuilder;

/// Upstream URL of the catalog repository.
pub const CATALOG_URL: &str = "https://github.com/nim-lang/packages";

/// Alias chains longer than this indicate a broken catalog.
const MAX_ALIAS_HOPS: usize = 4;

/// One catalog record.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub name: String,

    /// Fetch method, normally `git`
    #[serde(default)]
    pub method: String,

    /// Canonical source URL
    #[serde(default)]
    pub url: String,

    /// Present on alias records instead of method/url
    #[serde(default)]
    pub alias: Option<String>,
}

/// A cached parse of the catalog document.
pub struct Registry {
    entries: HashMap<String, CatalogEntry>,
}

impl Registry {
    /// Load and parse the catalog document.
    pub fn load(io: &Io, json_path: &Path) -> Result<Registry> {
        let text = io.read_file(json_path)?;
        let parsed: Vec<CatalogEntry> = serde_json::from_str(&text)
            .with_context(|| format!("malformed catalog document: {}", json_path.display()))?;

        let mut entries = HashMap::with_capacity(parsed.len());
        for entry in parsed {
            entries.insert(entry.name.to_ascii_lowercase(), entry);
        }
        Ok(Registry { entries })
    }

    /// Map a package name to its catalog entry, following aliases.
    ///
    /// Returns `None` when the name is absent; callers treat that as fatal
    /// for fetch targets (language pseudo-dependencies are filtered before
    /// they reach a lookup).
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        let mut key = name.to_ascii_lowercase();

        for _ in 0..MAX_ALIAS_HOPS {
            let entry = self.entries.get(&key)?;
            match entry.alias {
                Some(ref target) => key = target.to_ascii_lowercase(),
                None => return Some(entry),
            }
        }
        None
    }

    /// Number of catalog records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bring the local catalog checkout up to date: clone if absent, pull if
/// present. Runs through the retry layer like every other git call.
pub fn refresh_catalog(io: &Io, git: &Path, catalog_dir: &Path) -> Result<()> {
    if catalog_dir.join(".git").exists() {
        tracing::debug!("refreshing catalog in {}", catalog_dir.display());
        io.run_command(
            &ProcessBuilder::new(git)
                .cwd(catalog_dir)
                .args(["pull", "--quiet"]),
        )?;
    } else {
        tracing::info!("fetching package catalog from {}", CATALOG_URL);
        io.run_command(
            &ProcessBuilder::new(git)
                .args(["clone", "--depth", "1", CATALOG_URL])
                .arg(catalog_dir),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::io::NoFaults;
    use tempfile::TempDir;

    fn io() -> Io {
        Io::with_faults(Box::new(NoFaults))
    }

    fn sample_registry(dir: &Path) -> Registry {
        let json = r#"[
            {"name": "pixie", "method": "git", "url": "https://github.com/treeform/pixie"},
            {"name": "Chroma", "method": "git", "url": "https://github.com/treeform/chroma"},
            {"name": "pixie2", "alias": "pixie"},
            {"name": "fossilpkg", "method": "fossil", "url": "https://example.com/fossilpkg"}
        ]"#;
        let path = dir.join("packages.json");
        std::fs::write(&path, json).unwrap();
        Registry::load(&io(), &path).unwrap()
    }

    #[test]
    fn test_lookup_hit() {
        let tmp = TempDir::new().unwrap();
        let registry = sample_registry(tmp.path());

        let entry = registry.lookup("pixie").unwrap();
        assert_eq!(entry.method, "git");
        assert_eq!(entry.url, "https://github.com/treeform/pixie");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let registry = sample_registry(tmp.path());

        assert!(registry.lookup("chroma").is_some());
        assert!(registry.lookup("CHROMA").is_some());
    }

    #[test]
    fn test_lookup_miss() {
        let tmp = TempDir::new().unwrap();
        let registry = sample_registry(tmp.path());

        assert!(registry.lookup("no-such-package").is_none());
    }

    #[test]
    fn test_lookup_follows_alias() {
        let tmp = TempDir::new().unwrap();
        let registry = sample_registry(tmp.path());

        let entry = registry.lookup("pixie2").unwrap();
        assert_eq!(entry.name, "pixie");
        assert_eq!(entry.url, "https://github.com/treeform/pixie");
    }

    #[test]
    fn test_malformed_catalog_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("packages.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Registry::load(&io(), &path).is_err());
    }
}
