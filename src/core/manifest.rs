//! `.nimble` manifest parsing.
//!
//! Manifests are read line by line; only `version`, `srcDir`, and
//! `requires` lines are recognized, everything else (script logic, tasks,
//! descriptions) is ignored. A record is built fresh on every call.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::dependency::Dependency;
use crate::util::errors::FetchError;
use crate::util::io::Io;

/// File extension of package manifests.
pub const MANIFEST_EXT: &str = "nimble";

/// The parsed contents of one `.nimble` file.
#[derive(Debug, Clone, Default)]
pub struct ManifestRecord {
    /// Declared package version
    pub version: String,

    /// Source subdirectory (`srcDir`), empty when sources live at the root
    pub source_subdir: String,

    /// Directory the manifest was read from
    pub install_dir: PathBuf,

    /// The toolchain's own version constraint, tracked separately because
    /// the compiler is never fetched as a package
    pub language_dependency: Option<Dependency>,

    /// Declared package dependencies, in manifest order
    pub dependencies: Vec<Dependency>,
}

impl ManifestRecord {
    /// The directory to put on the compiler search path.
    pub fn source_root(&self) -> PathBuf {
        if self.source_subdir.is_empty() {
            self.install_dir.clone()
        } else {
            self.install_dir.join(&self.source_subdir)
        }
    }
}

/// Parse the manifest at `path`.
///
/// The read goes through the retry layer: a freshly cloned package may still
/// be mid-write by the worker that produced it. Exhausting the retries maps
/// to [`FetchError::ManifestNotFound`].
pub fn parse_manifest(io: &Io, path: &Path) -> Result<ManifestRecord> {
    let text = io.read_file(path).map_err(|_| FetchError::ManifestNotFound {
        path: path.to_path_buf(),
    })?;

    let mut record = ManifestRecord {
        install_dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        ..Default::default()
    };

    for line in text.lines() {
        let line = line.trim();

        if let Some(value) = keyword_value(line, "version") {
            record.version = value.to_string();
        } else if let Some(value) = keyword_value(line, "srcDir") {
            record.source_subdir = value.to_string();
        } else if let Some(rest) = line.strip_prefix("requires") {
            for expr in quoted_parts(rest) {
                let dep = Dependency::parse(expr);
                if dep.name.is_empty() {
                    continue;
                }
                if dep.is_language() {
                    record.language_dependency = Some(dep);
                } else {
                    record.dependencies.push(dep);
                }
            }
        }
    }

    Ok(record)
}

/// Locate the manifest inside an installed package directory.
///
/// Prefers `<dirname>.nimble`, falls back to the first `*.nimble` entry.
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    if let Some(name) = dir.file_name() {
        let canonical = dir.join(format!("{}.{}", name.to_string_lossy(), MANIFEST_EXT));
        if canonical.is_file() {
            return Some(canonical);
        }
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == MANIFEST_EXT))
        .collect();
    entries.sort();
    entries.into_iter().next()
}

/// `keyword_value("version = \"1.2.3\"", "version")` -> `Some("1.2.3")`.
fn keyword_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?.trim_start();
    let rest = rest.strip_prefix('=')?;
    Some(rest.trim().trim_matches('"').trim())
}

/// The quoted segments of a line, left to right.
fn quoted_parts(rest: &str) -> impl Iterator<Item = &str> {
    rest.split('"')
        .enumerate()
        .filter(|(i, _)| i % 2 == 1)
        .map(|(_, part)| part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::io::NoFaults;
    use tempfile::TempDir;

    fn io() -> Io {
        Io::with_faults(Box::new(NoFaults))
    }

    fn write_manifest(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(format!("{}.nimble", name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_full_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(
            tmp.path(),
            "demo",
            r#"
version = "1.2.3"
author = "somebody"
srcDir = "src"

requires "nim >= 1.6.2"
"#,
        );

        let record = parse_manifest(&io(), &path).unwrap();
        assert_eq!(record.version, "1.2.3");
        assert_eq!(record.source_subdir, "src");
        assert_eq!(record.install_dir, tmp.path());
        assert!(record.dependencies.is_empty());

        let lang = record.language_dependency.unwrap();
        assert_eq!(lang.name, "nim");
        assert_eq!(lang.operator, ">=");
        assert_eq!(lang.version, "1.6.2");
    }

    #[test]
    fn test_parse_bare_requirement() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(tmp.path(), "demo", "requires \"pixie\"\n");

        let record = parse_manifest(&io(), &path).unwrap();
        assert_eq!(record.dependencies.len(), 1);
        assert_eq!(record.dependencies[0].name, "pixie");
        assert_eq!(record.dependencies[0].operator, "");
        assert_eq!(record.dependencies[0].version, "");
    }

    #[test]
    fn test_dependency_order_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(
            tmp.path(),
            "demo",
            "requires \"zippy\"\nrequires \"chroma >= 0.2.7\"\nrequires \"pixie\"\n",
        );

        let record = parse_manifest(&io(), &path).unwrap();
        let names: Vec<&str> = record.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["zippy", "chroma", "pixie"]);
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(
            tmp.path(),
            "demo",
            "description = \"not a dependency\"\ntask build, \"compile\":\n  exec \"nim c src/demo\"\n",
        );

        let record = parse_manifest(&io(), &path).unwrap();
        assert!(record.dependencies.is_empty());
        assert_eq!(record.version, "");
    }

    #[test]
    fn test_source_root_defaults_to_install_dir() {
        let tmp = TempDir::new().unwrap();
        let path = write_manifest(tmp.path(), "demo", "version = \"0.1.0\"\n");

        let record = parse_manifest(&io(), &path).unwrap();
        assert_eq!(record.source_root(), tmp.path());
    }

    #[test]
    fn test_missing_manifest_is_typed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.nimble");

        let err = parse_manifest(&io(), &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::ManifestNotFound { .. })
        ));
    }

    #[test]
    fn test_find_manifest_prefers_directory_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("pixie");
        std::fs::create_dir(&dir).unwrap();
        write_manifest(&dir, "aaa", "version = \"9\"\n");
        let canonical = write_manifest(&dir, "pixie", "version = \"1\"\n");

        assert_eq!(find_manifest(&dir).unwrap(), canonical);
    }

    #[test]
    fn test_find_manifest_falls_back_to_any_nimble() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("renamed-checkout");
        std::fs::create_dir(&dir).unwrap();
        let only = write_manifest(&dir, "pixie", "version = \"1\"\n");

        assert_eq!(find_manifest(&dir).unwrap(), only);
        assert_eq!(find_manifest(&tmp.path().join("missing")), None);
    }
}
