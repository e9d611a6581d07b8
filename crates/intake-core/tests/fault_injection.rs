//! Fault injection with SQLite `RAISE(ABORT)` triggers.
//!
//! A trigger stands in for a storage failure on one specific row so the
//! all-or-nothing and per-client isolation guarantees can be observed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use intake_core::IntakeError;
use intake_core::clock::FixedClock;
use intake_core::config::IntakeConfig;
use intake_core::db::{self, query};
use intake_core::model::agent::AgentRole;
use intake_core::model::status::IntakeStatus;
use intake_core::model::task::TaskStatus;
use intake_core::sweep::sweep;
use intake_core::transition::{TransitionEngine, TransitionOptions};
use rusqlite::Connection;

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).single().expect("valid")
}

fn store(clients: &[&str]) -> Connection {
    let conn = db::open_in_memory().expect("store");
    query::insert_agent(
        &conn,
        &query::NewAgent::new("ops", "Ops").role(AgentRole::Admin),
        monday(),
    )
    .expect("admin");
    query::insert_agent(&conn, &query::NewAgent::new("agent", "Agent"), monday()).expect("agent");
    for id in clients {
        query::insert_client(
            &conn,
            &query::NewClient {
                client_id: (*id).into(),
                display_name: (*id).into(),
                agent_id: "agent".into(),
            },
            monday(),
        )
        .expect("client");
    }
    conn
}

fn fail_updates_for(conn: &Connection, client_id: &str) {
    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_client_update
         BEFORE UPDATE ON clients
         WHEN OLD.client_id = '{client_id}'
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
    ))
    .expect("trigger");
}

fn into_execution(engine: &TransitionEngine<'_>, id: &str) {
    for status in [IntakeStatus::PhoneIssued, IntakeStatus::InExecution] {
        engine
            .transition(id, status, "ops", &TransitionOptions::default())
            .expect("transition");
    }
}

#[test]
fn sweep_isolates_one_failing_client() {
    let conn = store(&["c1", "c2", "c3"]);
    let config = IntakeConfig::default();
    let start = FixedClock(monday());
    let engine = TransitionEngine::new(&conn, &config).with_clock(&start);
    for id in ["c1", "c2", "c3"] {
        into_execution(&engine, id);
    }

    fail_updates_for(&conn, "c2");

    let later = FixedClock(monday() + Duration::days(7));
    let engine = TransitionEngine::new(&conn, &config).with_clock(&later);
    let report = sweep(&engine).expect("sweep runs");

    assert_eq!(report.marked_count, 2);
    assert_eq!(report.client_ids, vec!["c1".to_string(), "c3".to_string()]);
    assert_eq!(report.failed_client_ids, vec!["c2".to_string()]);

    let status = |id: &str| {
        query::get_client(&conn, id)
            .expect("query")
            .expect("client")
            .status
    };
    assert_eq!(status("c1"), IntakeStatus::ExecutionDelayed);
    assert_eq!(status("c2"), IntakeStatus::InExecution);
    assert_eq!(status("c3"), IntakeStatus::ExecutionDelayed);

    // The failed client is picked up once the fault clears.
    conn.execute_batch("DROP TRIGGER fail_client_update")
        .expect("drop trigger");
    let retry = sweep(&engine).expect("retry sweep");
    assert_eq!(retry.client_ids, vec!["c2".to_string()]);
}

#[test]
fn failed_task_pass_still_reports_delayed_clients() {
    let conn = store(&["c1"]);
    let config = IntakeConfig::default();
    let start = FixedClock(monday());
    into_execution(&TransitionEngine::new(&conn, &config).with_clock(&start), "c1");

    conn.execute_batch(
        "CREATE TRIGGER fail_overdue_tasks
         BEFORE UPDATE ON tasks
         WHEN NEW.status = 'overdue'
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .expect("trigger");

    let later = FixedClock(monday() + Duration::days(7));
    let engine = TransitionEngine::new(&conn, &config).with_clock(&later);
    let report = sweep(&engine).expect("client moves are not hidden");

    assert_eq!(report.marked_count, 1);
    assert_eq!(report.client_ids, vec!["c1".to_string()]);
    assert!(report.task_pass_failed);
    assert_eq!(report.tasks_marked_overdue, 0);
    let client = query::get_client(&conn, "c1").expect("query").expect("client");
    assert_eq!(client.status, IntakeStatus::ExecutionDelayed);

    conn.execute_batch("DROP TRIGGER fail_overdue_tasks")
        .expect("drop trigger");
    let retry = sweep(&engine).expect("retry sweep");
    assert_eq!(retry.marked_count, 0);
    assert!(!retry.task_pass_failed);
    assert!(retry.tasks_marked_overdue > 0);
    assert!(
        query::list_tasks(&conn, "c1")
            .expect("tasks")
            .iter()
            .any(|t| t.status == TaskStatus::Overdue)
    );
}

#[test]
fn failed_task_insert_rolls_back_the_whole_transition() {
    let conn = store(&["c1"]);
    let config = IntakeConfig::default();
    let clock = FixedClock(monday());
    let engine = TransitionEngine::new(&conn, &config).with_clock(&clock);
    engine
        .transition("c1", IntakeStatus::PhoneIssued, "ops", &TransitionOptions::default())
        .expect("issue");

    let audit_before = query::audit_for_entity(&conn, "client", "c1")
        .expect("audit")
        .len();
    let tasks_before = query::list_tasks(&conn, "c1").expect("tasks").len();

    conn.execute_batch(
        "CREATE TRIGGER fail_upload
         BEFORE INSERT ON tasks
         WHEN NEW.task_type = 'upload_screenshot'
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
    )
    .expect("trigger");

    let err = engine
        .transition("c1", IntakeStatus::InExecution, "ops", &TransitionOptions::default())
        .expect_err("insert fails");
    assert!(matches!(err, IntakeError::Persistence(_)));
    assert!(!err.to_string().contains("injected"), "storage detail leaked");

    let client = query::get_client(&conn, "c1").expect("query").expect("client");
    assert_eq!(client.status, IntakeStatus::PhoneIssued);
    assert!(client.execution_deadline.is_none());
    assert_eq!(
        query::audit_for_entity(&conn, "client", "c1").expect("audit").len(),
        audit_before
    );
    assert_eq!(query::list_tasks(&conn, "c1").expect("tasks").len(), tasks_before);
}
