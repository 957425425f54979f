//! Directory discovery tests for `ensemble-loader`.
//!
//! Each test gets an isolated modules directory — no shared state.

use std::fs;
use std::path::Path;

use assert_fs::prelude::*;
use ensemble_core::{CommandUnit, ProcessRegistry, SupervisorError, WorkerName};
use ensemble_loader::{discover, Catalog, LoadError, UnitSource};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}

fn names(units: &[ensemble_loader::DiscoveredUnit]) -> Vec<&str> {
    units.iter().map(|u| u.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// 1. Manifests
// ---------------------------------------------------------------------------

#[rstest]
#[case("ticker.yaml")]
#[case("ticker.yml")]
#[case("ticker.YAML")]
fn manifest_extensions_are_recognised(#[case] file: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child(file).write_str("command: sleep\nargs: ['30']\n").expect("write");

    let units = discover(dir.path()).expect("discover");
    assert_eq!(names(&units), ["ticker"]);
    assert_eq!(units[0].source.kind(), "manifest");
    assert_eq!(units[0].unit.describe(), "sleep 30");
}

#[test]
fn manifest_paths_resolve_against_modules_dir() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("bin/tick.sh").write_str("#!/bin/sh\n").expect("write");
    dir.child("data").create_dir_all().expect("mkdir");
    dir.child("tick.yaml")
        .write_str("command: bin/tick.sh\ncwd: data\n")
        .expect("write");

    let units = discover(dir.path()).expect("discover");
    let root = fs::canonicalize(dir.path()).expect("canonicalize");
    let cmd = units[0].unit.command();
    assert_eq!(Path::new(cmd.get_program()), root.join("bin/tick.sh"));
    assert_eq!(cmd.get_current_dir(), Some(root.join("data").as_path()));
    assert!(units[0].unit.validate().is_ok());
}

#[test]
fn malformed_manifest_reports_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("broken.yaml").write_str("args: [unclosed\n").expect("write");

    let err = discover(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::Manifest { .. }), "got: {err}");
    assert!(err.to_string().contains("broken.yaml"));
}

// ---------------------------------------------------------------------------
// 2. Executables and skipped entries
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn executables_are_discovered_by_stem() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let script = dir.child("worker.sh");
    script.write_str("#!/bin/sh\nsleep 30\n").expect("write");
    make_executable(script.path());
    dir.child("notes.txt").write_str("not a worker").expect("write");

    let units = discover(dir.path()).expect("discover");
    assert_eq!(names(&units), ["worker"]);
    assert!(matches!(units[0].source, UnitSource::Executable(_)));
}

#[cfg(unix)]
#[test]
fn hidden_files_and_directories_are_skipped() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let hidden = dir.child(".secret.sh");
    hidden.write_str("#!/bin/sh\n").expect("write");
    make_executable(hidden.path());
    dir.child(".hidden.yaml").write_str("command: sleep\n").expect("write");
    dir.child("nested").create_dir_all().expect("mkdir");

    let units = discover(dir.path()).expect("discover");
    assert!(units.is_empty(), "got: {:?}", names(&units));
}

#[test]
fn entries_are_sorted_by_file_name() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    for name in ["c.yaml", "a.yaml", "b.yaml"] {
        dir.child(name).write_str("command: sleep\n").expect("write");
    }
    let units = discover(dir.path()).expect("discover");
    assert_eq!(names(&units), ["a", "b", "c"]);
}

#[test]
fn missing_directory_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let err = discover(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, LoadError::NotADirectory { .. }), "got: {err}");
    assert!(err.to_string().contains("absent"));
}

// ---------------------------------------------------------------------------
// 3. Feeding the registry
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn same_stem_twice_aborts_population() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("dup.yaml").write_str("command: sleep\n").expect("write");
    let script = dir.child("dup.sh");
    script.write_str("#!/bin/sh\n").expect("write");
    make_executable(script.path());
    dir.child("z.yaml").write_str("command: sleep\n").expect("write");

    let units = discover(dir.path()).expect("discover");
    assert_eq!(names(&units), ["dup", "dup", "z"]);

    let registry = ProcessRegistry::default();
    let err = registry
        .populate(units.into_iter().map(|u| u.into_pair()))
        .unwrap_err();
    assert!(matches!(err, SupervisorError::DuplicateName { .. }), "got: {err}");
    assert_eq!(registry.names(), vec![WorkerName::from("dup")]);
}

#[test]
fn catalog_units_come_before_directory_units() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("disk.yaml").write_str("command: sleep\n").expect("write");

    let catalog = Catalog::new().with("builtin", || CommandUnit::new("true").shared());
    let units = catalog.discover(dir.path()).expect("discover");
    assert_eq!(names(&units), ["builtin", "disk"]);
    assert_eq!(units[0].source, UnitSource::Catalog);
}
