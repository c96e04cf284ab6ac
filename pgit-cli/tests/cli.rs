//! Integration tests for the pgit binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for running pgit inside `dir`.
fn pgit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pgit").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn init_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    pgit(temp_dir.path()).arg("init").assert().success();
    temp_dir
}

fn commit(dir: &Path, message: &str) {
    pgit(dir)
        .args(["commit", "-m", message])
        .assert()
        .success();
}

fn log_ids(dir: &Path) -> Vec<String> {
    let output = pgit(dir).args(["log", "--json"]).output().unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_help_lists_commands() {
    let temp_dir = TempDir::new().unwrap();
    pgit(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hash-object"))
        .stdout(predicate::str::contains("checkout"));
}

#[test]
fn test_init_creates_control_dir() {
    let temp_dir = TempDir::new().unwrap();
    pgit(temp_dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized empty pgit repository"));

    assert!(temp_dir.path().join(".pgit/objects").is_dir());
    assert_eq!(
        fs::read_to_string(temp_dir.path().join(".pgit/HEAD")).unwrap(),
        "ref: refs/heads/master <- HEAD\n"
    );

    pgit(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_commands_outside_repository_fail() {
    let temp_dir = TempDir::new().unwrap();
    pgit(temp_dir.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pgit init"));
}

#[test]
fn test_hash_object_then_cat_file() {
    let temp_dir = init_repo();
    fs::write(temp_dir.path().join("hello.txt"), "hello\n").unwrap();

    let first = pgit(temp_dir.path())
        .args(["hash-object", "hello.txt"])
        .output()
        .unwrap();
    let second = pgit(temp_dir.path())
        .args(["hash-object", "hello.txt"])
        .output()
        .unwrap();
    assert_eq!(first.stdout, second.stdout);

    let oid = String::from_utf8(first.stdout).unwrap().trim().to_string();
    assert_eq!(oid.len(), 64);
    assert_eq!(
        fs::read_dir(temp_dir.path().join(".pgit/objects"))
            .unwrap()
            .count(),
        1
    );

    pgit(temp_dir.path())
        .args(["cat-file", &oid])
        .assert()
        .success()
        .stdout("hello\n");
    pgit(temp_dir.path())
        .args(["cat-file", "-t", &oid[..8]])
        .assert()
        .success()
        .stdout("blob\n");
}

#[test]
fn test_commit_and_log() {
    let temp_dir = init_repo();
    let file = temp_dir.path().join("a.txt");

    pgit(temp_dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("No commits yet"));

    fs::write(&file, "one\n").unwrap();
    commit(temp_dir.path(), "first");
    fs::write(&file, "two\n").unwrap();
    commit(temp_dir.path(), "second");

    let ids = log_ids(temp_dir.path());
    assert_eq!(ids.len(), 2);

    let master = fs::read_to_string(temp_dir.path().join(".pgit/refs/heads/master")).unwrap();
    assert_eq!(master.trim(), ids[0]);

    pgit(temp_dir.path())
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("commit {}", ids[0])))
        .stdout(predicate::str::contains(format!("commit {}", ids[1])));

    pgit(temp_dir.path())
        .args(["log", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(ids[1].as_str()).not());
}

#[test]
fn test_checkout_commit_detaches_and_restores() {
    let temp_dir = init_repo();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "original\n").unwrap();
    commit(temp_dir.path(), "first");
    let first = log_ids(temp_dir.path()).remove(0);

    fs::write(&file, "changed\n").unwrap();
    pgit(temp_dir.path())
        .args(["checkout", &first])
        .assert()
        .success()
        .stdout(predicate::str::contains("detached"));

    assert_eq!(fs::read_to_string(&file).unwrap(), "original\n");
    assert_eq!(
        fs::read_to_string(temp_dir.path().join(".pgit/HEAD")).unwrap(),
        format!("{}\n", first)
    );
}

#[test]
fn test_branch_checkout_commit_advances_branch() {
    let temp_dir = init_repo();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "base\n").unwrap();
    commit(temp_dir.path(), "base");

    pgit(temp_dir.path())
        .args(["branch", "feature"])
        .assert()
        .success();
    pgit(temp_dir.path())
        .args(["branch", "feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    pgit(temp_dir.path())
        .args(["checkout", "feature"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to branch feature"));

    fs::write(&file, "feature\n").unwrap();
    commit(temp_dir.path(), "on feature");
    let tip = log_ids(temp_dir.path()).remove(0);

    let read_ref = |name: &str| {
        fs::read_to_string(temp_dir.path().join(".pgit/refs/heads").join(name))
            .unwrap()
            .trim()
            .to_string()
    };
    assert_eq!(read_ref("feature"), tip);
    assert_ne!(read_ref("master"), tip);

    pgit(temp_dir.path())
        .arg("branch")
        .assert()
        .success()
        .stdout(predicate::str::contains("* feature"))
        .stdout(predicate::str::contains("  master"));
}

#[test]
fn test_status_and_show() {
    let temp_dir = init_repo();
    fs::write(temp_dir.path().join("a.txt"), "hello\n").unwrap();
    commit(temp_dir.path(), "first");

    pgit(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No uncommitted changes"));

    fs::write(temp_dir.path().join("a.txt"), "hello\nworld\n").unwrap();
    fs::write(temp_dir.path().join("b.txt"), "new\n").unwrap();
    pgit(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("~ a.txt"))
        .stdout(predicate::str::contains("+ b.txt"));

    commit(temp_dir.path(), "second");
    pgit(temp_dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("second"))
        .stdout(predicate::str::contains("+world"))
        .stdout(predicate::str::contains("NEW b.txt"));
}

#[test]
fn test_tag_and_reset() {
    let temp_dir = init_repo();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "1\n").unwrap();
    commit(temp_dir.path(), "first");
    pgit(temp_dir.path()).args(["tag", "v1"]).assert().success();
    fs::write(&file, "2\n").unwrap();
    commit(temp_dir.path(), "second");

    pgit(temp_dir.path())
        .arg("tag")
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"));

    pgit(temp_dir.path()).args(["reset", "v1"]).assert().success();

    assert_eq!(log_ids(temp_dir.path()).len(), 1);
    assert_eq!(fs::read_to_string(&file).unwrap(), "2\n");
}

#[test]
fn test_write_tree_and_read_tree() {
    let temp_dir = init_repo();
    fs::write(temp_dir.path().join("a.txt"), "kept\n").unwrap();
    let output = pgit(temp_dir.path()).arg("write-tree").output().unwrap();
    let tree = String::from_utf8(output.stdout).unwrap().trim().to_string();

    fs::write(temp_dir.path().join("a.txt"), "lost\n").unwrap();
    fs::write(temp_dir.path().join("extra.txt"), "gone\n").unwrap();
    pgit(temp_dir.path())
        .args(["read-tree", &tree])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("a.txt")).unwrap(),
        "kept\n"
    );
    assert!(!temp_dir.path().join("extra.txt").exists());
}

#[test]
fn test_dash_c_selects_repository() {
    let temp_dir = TempDir::new().unwrap();
    let repo_dir = temp_dir.path().join("project");

    pgit(temp_dir.path())
        .args(["init", "project"])
        .assert()
        .success();
    pgit(temp_dir.path())
        .args(["-C", "project", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("master"));
    assert!(repo_dir.join(".pgit").is_dir());
}
