//! Workspace `nim.cfg` search-path maintenance.
//!
//! The fetch engine appends one `--path:"…"` line per fetched package so the
//! Nim compiler can see it. Multiple workers touch the same file; callers
//! hold the scheduler lock around these operations.

use std::path::Path;

use anyhow::Result;

use crate::util::io::Io;

/// Header written on first creation so an audit can tell tool-managed
/// configuration apart from hand-authored content.
pub const CONFIG_HEADER: &str = "# Search paths below are managed by mooring.";

/// Normalize separators so entries compare equal across platforms.
pub fn normalize_entry(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn path_line(entry: &str) -> String {
    format!("--path:\"{}\"", entry)
}

/// Append a search-path entry, creating the file with its header on first
/// write. Adding an entry that is already present is a no-op.
pub fn add_search_path(io: &Io, cfg_path: &Path, entry: &Path) -> Result<()> {
    let line = path_line(&normalize_entry(entry));

    let mut contents = if cfg_path.exists() {
        io.read_file(cfg_path)?
    } else {
        String::new()
    };

    if contents.lines().any(|l| l.trim() == line) {
        return Ok(());
    }

    if contents.is_empty() {
        contents.push_str(CONFIG_HEADER);
        contents.push('\n');
    } else if !contents.ends_with('\n') {
        contents.push('\n');
    }

    contents.push_str(&line);
    contents.push('\n');
    io.write_file(cfg_path, &contents)
}

/// Remove a search-path entry. Removing an absent entry is a no-op.
pub fn remove_search_path(io: &Io, cfg_path: &Path, entry: &Path) -> Result<()> {
    if !cfg_path.exists() {
        return Ok(());
    }

    let line = path_line(&normalize_entry(entry));
    let contents = io.read_file(cfg_path)?;

    let kept: Vec<&str> = contents.lines().filter(|l| l.trim() != line).collect();
    if kept.len() == contents.lines().count() {
        return Ok(());
    }

    let mut updated = kept.join("\n");
    if !updated.is_empty() {
        updated.push('\n');
    }
    io.write_file(cfg_path, &updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::io::NoFaults;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn io() -> Io {
        Io::with_faults(Box::new(NoFaults))
    }

    #[test]
    fn test_add_creates_file_with_header() {
        let tmp = TempDir::new().unwrap();
        let cfg = tmp.path().join("nim.cfg");

        add_search_path(&io(), &cfg, Path::new("deps/pixie/src")).unwrap();

        let contents = std::fs::read_to_string(&cfg).unwrap();
        assert!(contents.starts_with(CONFIG_HEADER));
        assert!(contents.contains("--path:\"deps/pixie/src\""));
    }

    #[test]
    fn test_add_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let cfg = tmp.path().join("nim.cfg");
        let entry = Path::new("deps/pixie/src");

        add_search_path(&io(), &cfg, entry).unwrap();
        let once = std::fs::read_to_string(&cfg).unwrap();

        add_search_path(&io(), &cfg, entry).unwrap();
        let twice = std::fs::read_to_string(&cfg).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_backslashes_are_normalized() {
        let tmp = TempDir::new().unwrap();
        let cfg = tmp.path().join("nim.cfg");

        add_search_path(&io(), &cfg, &PathBuf::from(r"deps\chroma\src")).unwrap();
        // The forward-slash spelling is the same entry.
        add_search_path(&io(), &cfg, Path::new("deps/chroma/src")).unwrap();

        let contents = std::fs::read_to_string(&cfg).unwrap();
        assert_eq!(contents.matches("chroma").count(), 1);
        assert!(contents.contains("--path:\"deps/chroma/src\""));
    }

    #[test]
    fn test_remove_deletes_only_matching_line() {
        let tmp = TempDir::new().unwrap();
        let cfg = tmp.path().join("nim.cfg");

        add_search_path(&io(), &cfg, Path::new("deps/a")).unwrap();
        add_search_path(&io(), &cfg, Path::new("deps/b")).unwrap();
        remove_search_path(&io(), &cfg, Path::new("deps/a")).unwrap();

        let contents = std::fs::read_to_string(&cfg).unwrap();
        assert!(!contents.contains("deps/a"));
        assert!(contents.contains("deps/b"));
        assert!(contents.starts_with(CONFIG_HEADER));
    }

    #[test]
    fn test_remove_missing_entry_is_noop() {
        let tmp = TempDir::new().unwrap();
        let cfg = tmp.path().join("nim.cfg");

        // No file at all.
        remove_search_path(&io(), &cfg, Path::new("deps/a")).unwrap();
        assert!(!cfg.exists());

        add_search_path(&io(), &cfg, Path::new("deps/b")).unwrap();
        let before = std::fs::read_to_string(&cfg).unwrap();
        remove_search_path(&io(), &cfg, Path::new("deps/absent")).unwrap();
        let after = std::fs::read_to_string(&cfg).unwrap();
        assert_eq!(before, after);
    }
}
