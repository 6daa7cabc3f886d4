//! CLI integration tests for mooring.
//!
//! Every test points `MOORING_HOME` at its own temp directory so the
//! singleton lock and catalog state never touch the real home (and tests
//! cannot lock each other out). Fixtures are dependency-free manifests, so
//! everything here runs offline.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the mooring binary command, homed in `home`.
fn mooring(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mooring").unwrap();
    cmd.env("MOORING_HOME", home.path().join("state"));
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// A manifest whose only requirement is the toolchain itself.
fn write_leaf_manifest(dir: &std::path::Path, name: &str) {
    fs::write(
        dir.join(format!("{}.nimble", name)),
        "version = \"0.1.0\"\nsrcDir = \"src\"\nrequires \"nim >= 1.6.0\"\n",
    )
    .unwrap();
    fs::create_dir_all(dir.join("src")).unwrap();
}

// ============================================================================
// mooring fetch
// ============================================================================

#[test]
fn test_fetch_defaults_to_cwd_manifest() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    write_leaf_manifest(&project, "app");

    mooring(&tmp)
        .arg("fetch")
        .current_dir(&project)
        .assert()
        .success();

    let cfg = fs::read_to_string(project.join("nim.cfg")).unwrap();
    assert!(cfg.starts_with("# Search paths below are managed by mooring."));
    assert!(cfg.contains("--path:"));
    assert!(cfg.contains("src"));
}

#[test]
fn test_fetch_is_idempotent() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    write_leaf_manifest(&project, "app");

    mooring(&tmp)
        .arg("fetch")
        .current_dir(&project)
        .assert()
        .success();
    let once = fs::read_to_string(project.join("nim.cfg")).unwrap();

    mooring(&tmp)
        .arg("fetch")
        .current_dir(&project)
        .assert()
        .success();
    let twice = fs::read_to_string(project.join("nim.cfg")).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn test_fetch_without_manifest_fails() {
    let tmp = temp_dir();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    mooring(&tmp)
        .arg("fetch")
        .current_dir(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest"));
}

// ============================================================================
// mooring lock / sync
// ============================================================================

#[test]
fn test_lock_with_no_dependencies_writes_empty_lockfile() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    write_leaf_manifest(&project, "app");

    mooring(&tmp)
        .arg("lock")
        .current_dir(&project)
        .assert()
        .success();

    let lock = fs::read_to_string(project.join("mooring.lock")).unwrap();
    assert_eq!(lock, "");
}

#[test]
fn test_sync_without_lockfile_fails() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();

    mooring(&tmp)
        .arg("sync")
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("lock"));
}

#[test]
fn test_sync_skips_malformed_lock_lines() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        project.join("mooring.lock"),
        "this line is quite badly wrong\nonly three fields\n\n",
    )
    .unwrap();

    mooring(&tmp)
        .arg("sync")
        .current_dir(&project)
        .assert()
        .success();

    // Nothing well-formed, nothing fetched.
    assert!(!project.join("deps").join("this").exists());
}

// ============================================================================
// process singleton lock
// ============================================================================

#[test]
fn test_second_instance_is_refused() {
    let tmp = temp_dir();
    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    write_leaf_manifest(&project, "app");

    // Simulate a live instance.
    fs::create_dir_all(tmp.path().join("state").join("run.lock")).unwrap();

    mooring(&tmp)
        .arg("fetch")
        .current_dir(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("another mooring instance"));
}

#[test]
fn test_lock_is_released_after_failure() {
    let tmp = temp_dir();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    // Fails (no manifest), but must still release the singleton lock.
    mooring(&tmp)
        .arg("fetch")
        .current_dir(&empty)
        .assert()
        .failure();

    assert!(!tmp.path().join("state").join("run.lock").exists());

    // A later invocation is not locked out.
    write_leaf_manifest(&empty, "empty");
    mooring(&tmp)
        .arg("fetch")
        .current_dir(&empty)
        .assert()
        .success();
}
