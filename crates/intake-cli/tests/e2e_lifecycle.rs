//! E2E CLI tests: set up an org chart, walk a client to approval, distribute
//! its bonus pool, and check the JSON contracts and error exits.
//!
//! Each test runs `intake` as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the intake binary, rooted in `dir`.
fn intake_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("intake"));
    cmd.current_dir(dir);
    cmd.env("INTAKE_ACTOR", "test-admin");
    // Suppress tracing output that goes to stderr
    cmd.env("INTAKE_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

/// Run a command with `--json` and parse stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = intake_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

/// `init` plus a three-level chain: root(4) <- sup(2) <- closer(0), and an
/// admin for the sweep.
fn init_project(dir: &Path) {
    intake_cmd(dir).arg("init").assert().success();
    run_json(dir, &["agent", "add", "test-admin", "--role", "admin"]);
    run_json(dir, &["agent", "add", "root", "--star", "4"]);
    run_json(dir, &["agent", "add", "sup", "--star", "2", "--supervisor", "root"]);
    run_json(dir, &["agent", "add", "closer", "--supervisor", "sup"]);
}

fn transition(dir: &Path, client: &str, status: &str) -> Value {
    run_json(dir, &["transition", client, status])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_store() {
    let dir = TempDir::new().expect("tempdir");
    let json = run_json(dir.path(), &["init"]);
    assert_eq!(json["schema_version"], 2);
    assert_eq!(json["config_written"], true);
    assert!(dir.path().join(".intake/config.toml").exists());
    assert!(dir.path().join(".intake/intake.sqlite3").exists());

    // Second run keeps the config.
    let again = run_json(dir.path(), &["init"]);
    assert_eq!(again["config_written"], false);
}

#[test]
fn commands_before_init_fail() {
    let dir = TempDir::new().expect("tempdir");
    intake_cmd(dir.path())
        .args(["rollup", "root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("intake init"));
}

#[test]
fn approval_then_pool_distributes_up_the_chain() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);
    run_json(root, &["client", "add", "c1", "--agent", "closer"]);

    transition(root, "c1", "phone_issued");
    let exec = transition(root, "c1", "in_execution");
    assert!(exec["execution_deadline"].is_string());
    assert_eq!(
        exec["created_task_ids"].as_array().map(Vec::len),
        Some(5),
        "four platform uploads plus the aggregate"
    );
    transition(root, "c1", "ready_for_approval");
    let approved = transition(root, "c1", "approved");
    assert_eq!(approved["to"], "approved");

    let pool = run_json(root, &["pool", "create", "c1"]);
    assert_eq!(pool["pool"]["status"], "distributed");
    assert_eq!(pool["pool"]["distributed_slices"], 4);
    assert_eq!(pool["pool"]["recycled_slices"], 0);

    let allocations = pool["allocations"].as_array().expect("allocations");
    let by_agent = |id: &str| -> Vec<&Value> {
        allocations
            .iter()
            .filter(|a| a["agent_id"] == id)
            .collect()
    };
    assert_eq!(by_agent("closer")[0]["allocation_type"], "direct");
    assert_eq!(by_agent("sup")[0]["slices"], 2);
    assert_eq!(by_agent("root")[0]["slices"], 2);

    // Same pool on the second call.
    let again = run_json(root, &["pool", "create", "c1"]);
    assert_eq!(again["pool"]["pool_id"], pool["pool"]["pool_id"]);
    assert_eq!(again["allocations"].as_array().map(Vec::len), Some(3));
}

#[test]
fn illegal_transition_exits_nonzero_with_code() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);
    run_json(root, &["client", "add", "c1", "--agent", "closer"]);

    let output = intake_cmd(root)
        .args(["transition", "c1", "approved", "--json"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr)
        .ok()
        .or_else(|| {
            // anyhow appends its own line after the JSON body
            let text = String::from_utf8_lossy(&output.stderr);
            let end = text.rfind('}')?;
            serde_json::from_str(&text[..=end]).ok()
        })
        .expect("JSON error on stderr");
    assert_eq!(err["error"]["error_code"], "E2002");

    let show = run_json(root, &["client", "show", "c1"]);
    assert_eq!(show["client"]["status"], "pending");
}

#[test]
fn mutating_commands_require_actor() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);
    run_json(root, &["client", "add", "c1", "--agent", "closer"]);

    intake_cmd(root)
        .env_remove("INTAKE_ACTOR")
        .args(["transition", "c1", "phone_issued"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--actor"));

    intake_cmd(root)
        .env_remove("INTAKE_ACTOR")
        .args(["--actor", "someone", "transition", "c1", "phone_issued"])
        .assert()
        .success();
}

#[test]
fn hierarchy_and_rollup_views() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);
    run_json(root, &["client", "add", "c1", "--agent", "closer"]);
    run_json(root, &["client", "add", "c2", "--agent", "sup"]);

    let view = run_json(root, &["hierarchy", "sup"]);
    assert_eq!(view["agent"]["agent_id"], "sup");
    assert_eq!(view["supervisor_chain"][0]["agent_id"], "root");
    assert_eq!(view["team_size"], 1);

    let rollup = run_json(root, &["rollup", "root"]);
    assert_eq!(rollup["member_count"], 3);
    assert_eq!(rollup["total_clients"], 2);
    assert_eq!(rollup["clients_by_status"]["pending"], 2);
}

#[test]
fn sweep_with_nothing_overdue_marks_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);
    run_json(root, &["client", "add", "c1", "--agent", "closer"]);
    transition(root, "c1", "phone_issued");
    transition(root, "c1", "in_execution");

    let report = run_json(root, &["sweep"]);
    assert_eq!(report["marked_count"], 0);
    assert_eq!(report["client_ids"].as_array().map(Vec::len), Some(0));
}

#[test]
fn star_recalc_reports_tier() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    init_project(root);

    let change = run_json(root, &["star", "recalc", "root"]);
    assert_eq!(change["previous_star_level"], 4);
    assert_eq!(change["star_level"], 0);
    assert_eq!(change["tier"], "rookie");
}
