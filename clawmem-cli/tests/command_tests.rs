//! End-to-end CLI coverage using a scratch database per test, mirroring the
//! teacher's `assert_cmd::Command::cargo_bin` integration style.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn cmd(db: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("clawmem").expect("clawmem binary not found");
    cmd.arg("--db").arg(db);
    cmd
}

#[test]
#[serial]
fn help_lists_every_subcommand() {
    let dir = TempDir::new().unwrap();
    cmd(&dir.path().join("index.sqlite"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Index configured collections"))
        .stdout(predicate::str::contains("Search the index"));
}

#[test]
#[serial]
fn config_show_reports_resolved_db_path() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("index.sqlite");
    cmd(&db)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(db.display().to_string()));
}

#[test]
#[serial]
fn health_reports_zero_documents_on_a_fresh_store() {
    let dir = TempDir::new().unwrap();
    cmd(&dir.path().join("index.sqlite"))
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("active documents: 0"));
}

#[test]
#[serial]
fn search_on_an_empty_store_succeeds_with_no_results() {
    let dir = TempDir::new().unwrap();
    cmd(&dir.path().join("index.sqlite"))
        .args(["--format", "json", "search", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"results\""));
}

#[test]
#[serial]
fn doc_lookup_on_a_missing_reference_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir.path().join("index.sqlite"))
        .args(["doc", "clawmem://missing/none.md"])
        .assert()
        .failure();
}

#[test]
#[serial]
fn vacuum_on_a_fresh_store_removes_nothing() {
    let dir = TempDir::new().unwrap();
    cmd(&dir.path().join("index.sqlite"))
        .arg("vacuum")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 0 orphaned content rows"));
}

#[test]
#[serial]
fn completions_generate_without_touching_the_store() {
    let dir = TempDir::new().unwrap();
    // A nonexistent db path must not matter: completions are handled before
    // AppContext::open.
    cmd(&dir.path().join("does-not-exist").join("index.sqlite"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clawmem"));
}
