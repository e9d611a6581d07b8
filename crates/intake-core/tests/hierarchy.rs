//! Supervisor-tree views over a persisted org chart, including a corrupted
//! reporting cycle.

use chrono::{DateTime, TimeZone, Utc};
use intake_core::IntakeError;
use intake_core::db::{self, query};
use intake_core::hierarchy::{OrgChart, get_agent_hierarchy, get_team_rollup};
use intake_core::model::agent::Tier;
use rusqlite::Connection;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).single().expect("valid")
}

fn add(conn: &Connection, id: &str, supervisor: Option<&str>) {
    let mut row = query::NewAgent::new(id, id);
    if let Some(sup) = supervisor {
        row = row.supervisor(sup);
    }
    query::insert_agent(conn, &row, now()).expect("agent");
}

#[test]
fn two_node_cycle_terminates() {
    let conn = db::open_in_memory().expect("store");
    add(&conn, "a", None);
    add(&conn, "b", None);
    query::set_supervisor(&conn, "a", Some("b"), now()).expect("a -> b");
    query::set_supervisor(&conn, "b", Some("a"), now()).expect("b -> a");

    let chart = OrgChart::load(&conn).expect("chart");
    let chain = chart.ancestor_chain("a").expect("chain");
    assert!(chain.len() <= 2);
    assert_eq!(chain[0].agent_id, "b");

    let view = get_agent_hierarchy(&conn, "a").expect("view");
    assert_eq!(view.supervisor_chain.len(), 1);
    assert_eq!(view.team_size, 1);

    let rollup = get_team_rollup(&conn, "a").expect("rollup");
    assert_eq!(rollup.member_count, 2);
}

#[test]
fn deactivated_agents_leave_tree_but_stay_in_rollup() {
    let conn = db::open_in_memory().expect("store");
    add(&conn, "lead", None);
    add(&conn, "x", Some("lead"));
    add(&conn, "y", Some("lead"));
    add(&conn, "z", Some("y"));
    query::set_agent_active(&conn, "y", false, now()).expect("deactivate");

    let view = get_agent_hierarchy(&conn, "lead").expect("view");
    assert_eq!(view.team_size, 1);
    assert_eq!(view.subordinate_tree.children.len(), 1);
    assert_eq!(view.subordinate_tree.children[0].agent.agent_id, "x");

    let rollup = get_team_rollup(&conn, "lead").expect("rollup");
    assert_eq!(rollup.member_count, 4);
    assert_eq!(rollup.members_by_tier.get(&Tier::Rookie), Some(&4));
}

#[test]
fn unknown_agent_reports_not_found() {
    let conn = db::open_in_memory().expect("store");
    assert!(matches!(
        get_agent_hierarchy(&conn, "nobody"),
        Err(IntakeError::NotFound { entity: "agent", .. })
    ));
    assert!(matches!(
        get_team_rollup(&conn, "nobody"),
        Err(IntakeError::NotFound { .. })
    ));
}
