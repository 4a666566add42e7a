//! End-to-end tests for the clean command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// The binary with config pointed at a per-test file so persisted state
/// never leaks between tests or from the developer's machine.
fn devsweep(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("devsweep").unwrap();
    cmd.arg("--config").arg(config_dir.join("devsweep.toml"));
    cmd
}

/// Workspace with cleanable caches of known byte sizes.
fn create_test_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let node = root.join("web-app");
    fs::create_dir_all(node.join("node_modules/react")).unwrap();
    fs::write(node.join("package.json"), "{}").unwrap();
    fs::write(node.join("node_modules/react/index.js"), "x".repeat(5000)).unwrap();

    let python = root.join("api");
    fs::create_dir_all(python.join("venv")).unwrap();
    fs::create_dir_all(python.join("src/__pycache__")).unwrap();
    fs::write(python.join("requirements.txt"), "flask==2.3.2\n").unwrap();
    fs::write(python.join("venv/lib.so"), "x".repeat(2000)).unwrap();
    fs::write(python.join("src/__pycache__/m.pyc"), "x".repeat(1000)).unwrap();

    let gradle = root.join("android-app");
    fs::create_dir_all(gradle.join("build")).unwrap();
    fs::create_dir_all(gradle.join(".gradle")).unwrap();
    fs::write(gradle.join("build.gradle"), "").unwrap();
    fs::write(gradle.join("build/out.jar"), "x".repeat(3000)).unwrap();
    fs::write(gradle.join(".gradle/lock"), "x".repeat(500)).unwrap();

    tmp
}

#[test]
fn dry_run_reports_without_deleting() {
    let tmp = create_test_workspace();

    devsweep(tmp.path())
        .args(["clean", "--dry-run", "--types", "node"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("web-app"));

    assert!(tmp.path().join("web-app/node_modules").exists());
}

#[test]
fn force_clean_removes_all_project_caches() {
    let tmp = create_test_workspace();

    devsweep(tmp.path())
        .args(["clean", "--force", "--types", "node,python,gradle"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded: 3"))
        .stdout(predicate::str::contains("Reclaimed:"));

    assert!(!tmp.path().join("web-app/node_modules").exists());
    assert!(!tmp.path().join("api/venv").exists());
    assert!(!tmp.path().join("api/src/__pycache__").exists());
    assert!(!tmp.path().join("android-app/build").exists());
    assert!(!tmp.path().join("android-app/.gradle").exists());

    // Markers and sources survive.
    assert!(tmp.path().join("web-app/package.json").exists());
    assert!(tmp.path().join("api/requirements.txt").exists());
}

#[test]
fn second_clean_finds_nothing() {
    let tmp = create_test_workspace();

    devsweep(tmp.path())
        .args(["clean", "--force", "--types", "node,python,gradle"])
        .arg(tmp.path())
        .assert()
        .success();

    devsweep(tmp.path())
        .args(["clean", "--force", "--types", "node,python,gradle"])
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No projects with cleanable caches found.",
        ));
}

#[test]
fn dir_delete_removes_and_reports() {
    let tmp = TempDir::new().unwrap();
    let junk = tmp.path().join("old-builds");
    fs::create_dir(&junk).unwrap();
    fs::write(junk.join("artifact.bin"), "x".repeat(4096)).unwrap();

    devsweep(tmp.path())
        .args(["clean", "--force", "--dir"])
        .arg(&junk)
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    assert!(!junk.exists());
}

#[test]
fn dir_dry_run_leaves_directory() {
    let tmp = TempDir::new().unwrap();
    let junk = tmp.path().join("old-builds");
    fs::create_dir(&junk).unwrap();

    devsweep(tmp.path())
        .args(["clean", "--dry-run", "--dir"])
        .arg(&junk)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete"));

    assert!(junk.exists());
}

#[test]
fn dir_refuses_protected_path() {
    let tmp = TempDir::new().unwrap();

    devsweep(tmp.path())
        .args(["clean", "--force", "--dir", "/usr"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("refusing"));

    assert!(Path::new("/usr").exists());
}

#[test]
fn gradle_global_purge_is_skipped() {
    let tmp = TempDir::new().unwrap();

    devsweep(tmp.path())
        .args(["clean", "--global", "--types", "gradle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped"));
}

#[test]
fn unknown_ecosystem_is_rejected() {
    let tmp = create_test_workspace();

    devsweep(tmp.path())
        .args(["clean", "--types", "ruby"])
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown ecosystem"));
}
