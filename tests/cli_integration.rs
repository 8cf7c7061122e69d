//! End-to-end tests for the `dvol` binary.
//!
//! Every invocation runs against a fresh temp pool with container
//! coordination disabled.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

struct TestPool {
    dir: TempDir,
}

impl TestPool {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn dvol(&self) -> Command {
        let mut cmd = Command::cargo_bin("dvol").expect("dvol binary");
        cmd.env_remove("DVOL_POOL")
            .env_remove("RUST_LOG")
            .arg("--disable-docker-integration")
            .arg("-p")
            .arg(self.root());
        cmd
    }

    fn tree(&self, volume: &str, branch: &str) -> PathBuf {
        self.root().join(volume).join("branches").join(branch)
    }

    fn init(&self, volume: &str) {
        self.dvol().args(["init", volume]).assert().success();
    }
}

// =============================================================================
// Volumes
// =============================================================================

#[test]
fn init_reports_volume_and_branch() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["init", "foo"])
        .assert()
        .success()
        .stdout("Created volume foo\nCreated branch foo/master\n");
    assert!(pool.tree("foo", "master").is_dir());
}

#[test]
fn relative_pool_gets_absolute_running_point() {
    let work = TempDir::new().expect("failed to create temp dir");
    let mut cmd = Command::cargo_bin("dvol").expect("dvol binary");
    cmd.current_dir(work.path())
        .env_remove("DVOL_POOL")
        .env_remove("RUST_LOG")
        .args(["--disable-docker-integration", "-p", "pool", "init", "foo"])
        .assert()
        .success();

    let running_point = work.path().join("pool/foo/running_point");
    let target = fs::read_link(&running_point).unwrap();
    assert!(target.is_absolute(), "relative link target {:?}", target);
    assert!(running_point.is_dir());
    fs::write(running_point.join("seen.txt"), "x").unwrap();
    assert!(work.path().join("pool/foo/branches/master/seen.txt").exists());
}

#[test]
fn init_existing_fails() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .args(["init", "foo"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("volume foo already exists"));
}

#[test]
fn init_invalid_name_fails() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["init", "foo/bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
    assert!(!pool.root().join("foo").exists());
}

#[test]
fn list_marks_active_volume() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.init("bar");
    pool.dvol().args(["switch", "foo"]).assert().success();

    pool.dvol()
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("  VOLUME"))
        .stdout(predicate::str::contains("* foo"))
        .stdout(predicate::str::contains("  bar"));
}

#[test]
fn switch_to_missing_volume_fails() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["switch", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("volume 'nope' does not exist"));
}

#[test]
fn rm_with_force() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .args(["rm", "-f", "foo"])
        .assert()
        .success()
        .stdout("Deleting volume 'foo'\n");
    assert!(!pool.root().join("foo").exists());
}

#[test]
fn rm_confirm_and_decline() {
    let pool = TestPool::new();
    pool.init("foo");

    pool.dvol()
        .args(["rm", "foo"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborting."));
    assert!(pool.root().join("foo").exists());

    pool.dvol()
        .args(["rm", "foo"])
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleting volume 'foo'"));
    assert!(!pool.root().join("foo").exists());
}

#[test]
fn rm_quiet_requires_force() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .args(["-q", "rm", "foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert!(pool.root().join("foo").exists());
}

// =============================================================================
// History
// =============================================================================

#[test]
fn commit_requires_message() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .arg("commit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("You must provide a commit message"));
}

#[test]
fn commit_without_active_volume() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["commit", "-m", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No active volume: use dvol switch to choose one",
        ));
}

#[test]
fn commit_log_reset_round_trip() {
    let pool = TestPool::new();
    pool.init("foo");
    let file = pool.tree("foo", "master").join("file.txt");
    fs::write(&file, "alpha").unwrap();

    let output = pool
        .dvol()
        .args(["commit", "-m", "hello"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let id = String::from_utf8(output).unwrap().trim().to_string();
    assert_eq!(id.len(), 40);

    pool.dvol()
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("commit {}", id)))
        .stdout(predicate::str::contains("Author: Who knows <mystery@person>"))
        .stdout(predicate::str::contains("Date: Whenever"))
        .stdout(predicate::str::contains("    hello"));

    fs::write(&file, "beta").unwrap();
    pool.dvol()
        .args(["reset", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please specify --hard"));
    assert_eq!(fs::read_to_string(&file).unwrap(), "beta");

    pool.dvol().args(["reset", "--hard", "HEAD"]).assert().success();
    assert_eq!(fs::read_to_string(&file).unwrap(), "alpha");
}

#[test]
fn log_json_is_oldest_first() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol().args(["commit", "-m", "one"]).assert().success();
    pool.dvol().args(["commit", "-m", "two"]).assert().success();

    let output = pool.dvol().args(["log", "--json"]).output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let messages: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["one", "two"]);
}

#[test]
fn reset_out_of_range() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol().args(["commit", "-m", "one"]).assert().success();
    pool.dvol()
        .args(["reset", "--hard", "HEAD^"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn log_uses_configured_author() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .args(["config", "set", "user.name", "Ada"])
        .assert()
        .success();
    pool.dvol()
        .args(["config", "set", "user.email", "ada@example.com"])
        .assert()
        .success();
    pool.dvol().args(["commit", "-m", "one"]).assert().success();

    pool.dvol()
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("Author: Ada <ada@example.com>"));
}

// =============================================================================
// Branches
// =============================================================================

#[test]
fn checkout_create_needs_commit() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol()
        .args(["checkout", "-b", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "You must commit ('dvol commit') before you can branch ('dvol checkout -b')",
        ));
    assert!(!pool.tree("foo", "dev").exists());
}

#[test]
fn checkout_and_branch_listing() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol().args(["commit", "-m", "one"]).assert().success();
    pool.dvol().args(["checkout", "-b", "dev"]).assert().success();

    pool.dvol()
        .arg("branch")
        .assert()
        .success()
        .stdout("* dev\n  master\n");

    pool.dvol()
        .args(["checkout", "-b", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cannot create existing branch dev"));
    pool.dvol()
        .args(["checkout", "nope"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cannot switch to non-existing branch nope",
        ));
}

#[test]
fn branch_delete() {
    let pool = TestPool::new();
    pool.init("foo");
    pool.dvol().args(["commit", "-m", "one"]).assert().success();
    pool.dvol().args(["checkout", "-b", "dev"]).assert().success();

    pool.dvol()
        .args(["branch", "-d", "dev", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot delete active branch"));

    pool.dvol().args(["checkout", "master"]).assert().success();
    pool.dvol()
        .args(["branch", "-d", "dev", "--force"])
        .assert()
        .success();
    assert!(!pool.tree("foo", "dev").exists());
    assert!(!pool.root().join("foo/branches/dev.json").exists());
}

// =============================================================================
// Configuration and completion
// =============================================================================

#[test]
fn config_get_set_list() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["config", "get", "docker.stop_retries"])
        .assert()
        .success()
        .stdout("5\n");

    pool.dvol()
        .args(["config", "set", "docker.stop_retries", "2"])
        .assert()
        .success()
        .stdout("Set docker.stop_retries = 2\n");
    assert!(pool.root().join("config.toml").exists());

    pool.dvol()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docker.stop_retries = 2"))
        .stdout(predicate::str::contains("user.name = Who knows"));
}

#[test]
fn config_rejects_bad_input() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["config", "get", "nope.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'nope.key' is not a valid configuration key",
        ));
    pool.dvol()
        .args(["config", "set", "docker.stop_retries", "0"])
        .assert()
        .failure();
}

#[test]
fn completion_generates_script() {
    let pool = TestPool::new();
    pool.dvol()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dvol"));
}
