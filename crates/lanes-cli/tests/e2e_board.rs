//! E2E workflow tests for the `lanes` binary.
//!
//! Each test gets its own database through `LANES_DB` and a scratch config
//! directory so the user's real config never leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn lanes_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lanes"));
    cmd.current_dir(dir);
    cmd.env("LANES_DB", dir.join("board.db"));
    cmd.env("LANES_LOG", "error");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd.env("HOME", dir);
    cmd.env_remove("FORMAT");
    cmd
}

fn json(dir: &Path, args: &[&str]) -> Value {
    let output = lanes_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn init(dir: &Path) {
    lanes_cmd(dir).arg("init").assert().success();
}

fn create(dir: &Path, title: &str, extra: &[&str]) -> i64 {
    let mut args = vec!["create", title];
    args.extend_from_slice(extra);
    json(dir, &args)["id"].as_i64().expect("id must exist")
}

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v["id"].as_i64().expect("id"))
        .collect()
}

#[test]
fn commands_before_init_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    lanes_cmd(dir.path())
        .arg("list")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn init_creates_default_columns_and_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());

    let columns = json(dir.path(), &["column", "list"]);
    let names: Vec<&str> = columns
        .as_array()
        .expect("array")
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, vec!["Todo", "In Progress", "Done"]);

    lanes_cmd(dir.path())
        .args(["init", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn blocked_tasks_are_not_ready() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let t2 = create(dir.path(), "T2", &[]);
    let t1 = create(dir.path(), "T1", &["--blocked-by", &t2.to_string()]);

    assert_eq!(ids(&json(dir.path(), &["ready"])), vec![t2]);

    let blocked = json(dir.path(), &["blocked"]);
    assert_eq!(blocked[0]["task"]["id"].as_i64(), Some(t1));
    assert_eq!(blocked[0]["blockers"][0].as_i64(), Some(t2));

    let shown = json(dir.path(), &["show", &t2.to_string()]);
    assert_eq!(shown["neighbours"]["dependents"][0].as_i64(), Some(t1));

    lanes_cmd(dir.path())
        .args(["unlink", &t1.to_string(), &t2.to_string()])
        .assert()
        .success();
    assert_eq!(ids(&json(dir.path(), &["ready"])).len(), 2);
}

#[test]
fn next_walks_to_done_then_fails() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let id = create(dir.path(), "ship it", &[]).to_string();

    json(dir.path(), &["move", &id, "--next"]);
    let second = json(dir.path(), &["move", &id, "--next"]);
    assert_eq!(second["column"], "Done");

    lanes_cmd(dir.path())
        .args(["move", &id, "--next"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E4103"));
}

#[test]
fn moving_to_the_current_column_succeeds_without_change() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let id = create(dir.path(), "stay", &[]).to_string();

    lanes_cmd(dir.path())
        .args(["move", &id, "--to", "todo", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in 'Todo'"));

    let report = json(dir.path(), &["move", &id, "--ready"]);
    assert_eq!(report["moved"], false);
}

#[test]
fn cycles_are_rejected_with_the_path() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let a = create(dir.path(), "a", &[]).to_string();
    let b = create(dir.path(), "b", &["--parent", &a]).to_string();

    lanes_cmd(dir.path())
        .args(["link", &b, &a, "--kind", "blocking"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E2004"));

    lanes_cmd(dir.path())
        .args(["link", &a, &a])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E2003"));
}

#[test]
fn failed_create_leaves_no_task() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    create(dir.path(), "only", &[]);

    lanes_cmd(dir.path())
        .args(["create", "dangling", "--blocks", "99"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3003"));
    assert_eq!(ids(&json(dir.path(), &["list"])).len(), 1);
}

#[test]
fn swap_and_delete_keep_positions_dense() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    let a = create(dir.path(), "a", &[]);
    let b = create(dir.path(), "b", &[]);
    let c = create(dir.path(), "c", &[]);

    lanes_cmd(dir.path())
        .args(["up", &a.to_string()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E4101"));

    json(dir.path(), &["down", &a.to_string()]);
    assert_eq!(ids(&json(dir.path(), &["list"])), vec![b, a, c]);

    json(dir.path(), &["delete", &b.to_string()]);
    let list = json(dir.path(), &["list"]);
    let positions: Vec<i64> = list
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["position"].as_i64().expect("position"))
        .collect();
    assert_eq!(positions, vec![0, 1]);
    lanes_cmd(dir.path()).arg("check").assert().success();
}

#[test]
fn columns_roles_labels_and_comments() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    json(
        dir.path(),
        &["column", "add", "Review", "--after", "In Progress", "--role", "in_progress"],
    );
    let id = create(dir.path(), "feature", &["--priority", "high"]).to_string();

    let started = json(dir.path(), &["move", &id, "--start"]);
    assert_eq!(started["column"], "Review");

    lanes_cmd(dir.path())
        .args(["column", "rm", "Review"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E2006"));

    let labels = json(dir.path(), &["label", "add", &id, "ui", "backend"]);
    assert_eq!(labels.as_array().expect("array").len(), 2);
    json(dir.path(), &["comment", &id, "needs a screenshot"]);

    let shown = json(dir.path(), &["show", &id]);
    assert_eq!(shown["column"]["name"], "Review");
    assert_eq!(shown["comments"][0]["body"], "needs a screenshot");
    assert_eq!(shown["task"]["priority"], "high");

    json(dir.path(), &["column", "role", "in_progress", "none"]);
    lanes_cmd(dir.path())
        .args(["move", &id, "--start"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("E5001"));
}

#[test]
fn projects_need_selecting_once_there_are_several() {
    let dir = TempDir::new().expect("tempdir");
    init(dir.path());
    json(dir.path(), &["project", "add", "work"]);

    lanes_cmd(dir.path())
        .arg("list")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3001"));

    let id = create(dir.path(), "report", &["--project", "work"]);
    assert_eq!(ids(&json(dir.path(), &["list", "--project", "work"])), vec![id]);
    assert!(ids(&json(dir.path(), &["list", "--project", "default"])).is_empty());

    lanes_cmd(dir.path())
        .args(["show", &id.to_string(), "--project", "default"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E2007"));

    json(dir.path(), &["project", "rm", "work"]);
    assert_eq!(
        json(dir.path(), &["project", "list"])
            .as_array()
            .expect("array")
            .len(),
        1
    );
}

#[test]
fn completions_generate_a_script() {
    let dir = TempDir::new().expect("tempdir");
    lanes_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lanes"));
}
