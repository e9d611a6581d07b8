//! Scheduled overdue sweep.
//!
//! Finds every client still `in_execution` past its deadline and pushes it to
//! `execution_delayed` through the normal transition path, acting as the
//! longest-tenured active administrator. Each client is its own unit of
//! work; one failure is logged and skipped, and the client stays eligible
//! for the next run.

use serde::Serialize;

use crate::db::query;
use crate::error::{IntakeError, StorageContext};
use crate::model::status::IntakeStatus;
use crate::transition::{TransitionEngine, TransitionOptions};

/// Reason recorded on every sweep-driven transition.
pub const SWEEP_REASON: &str = "Execution deadline passed without completion";

/// Result of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Clients moved to `execution_delayed`.
    pub marked_count: usize,
    pub client_ids: Vec<String>,
    /// Clients that were overdue but could not be moved this run.
    pub failed_client_ids: Vec<String>,
    /// Open tasks flipped to `overdue`.
    pub tasks_marked_overdue: usize,
    /// The task pass failed; client moves above still stand.
    pub task_pass_failed: bool,
}

/// Run the overdue sweep.
///
/// # Errors
///
/// Returns [`IntakeError::MissingReferenceData`] when no active administrator
/// exists to act as the system actor, and [`IntakeError::Persistence`] if the
/// overdue client list cannot be read. Failures for individual clients and
/// for the trailing task pass are logged and reported, never returned.
pub fn sweep(engine: &TransitionEngine<'_>) -> Result<SweepReport, IntakeError> {
    let conn = engine.conn();
    let now = engine.now();

    let actor = query::longest_tenured_admin(conn)
        .storage("resolve system actor")?
        .ok_or_else(|| {
            IntakeError::MissingReferenceData("no active administrator to run the sweep".into())
        })?;

    let overdue = query::overdue_client_ids(conn, now).storage("list overdue clients")?;
    let mut report = SweepReport::default();

    for client_id in overdue {
        match engine.transition(
            &client_id,
            IntakeStatus::ExecutionDelayed,
            &actor,
            &TransitionOptions::with_reason(SWEEP_REASON),
        ) {
            Ok(_) => report.client_ids.push(client_id),
            Err(err) => {
                tracing::warn!(
                    client_id = %client_id,
                    error = %err,
                    "sweep could not delay client; will retry next run"
                );
                report.failed_client_ids.push(client_id);
            }
        }
    }
    report.marked_count = report.client_ids.len();

    match query::mark_overdue_tasks(conn, now) {
        Ok(count) => report.tasks_marked_overdue = count,
        Err(err) => {
            tracing::warn!(error = %err, "sweep could not mark overdue tasks");
            report.task_pass_failed = true;
        }
    }
    if let Err(err) = query::record_sweep(conn, now) {
        tracing::warn!(error = %err, "sweep could not record its run time");
    }

    tracing::info!(
        actor = %actor,
        marked = report.marked_count,
        failed = report.failed_client_ids.len(),
        tasks_overdue = report.tasks_marked_overdue,
        "overdue sweep complete"
    );

    Ok(report)
}
