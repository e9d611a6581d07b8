//! `intake sweep`: push overdue executions to `execution_delayed`.
//!
//! Meant to be run from a scheduler. The sweep acts as the longest-tenured
//! active administrator, so no `--actor` is needed.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, render};
use anyhow::Result;
use intake_core::sweep;
use intake_core::transition::TransitionEngine;

pub fn run_sweep(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let engine = TransitionEngine::new(&conn, &ctx.config);
    let report = sweep::sweep(&engine).map_err(|e| fail(ctx.output, e))?;

    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ sweep complete")?;
        pretty_kv(w, "delayed", r.marked_count.to_string())?;
        for id in &r.client_ids {
            writeln!(w, "  - {id}")?;
        }
        if !r.failed_client_ids.is_empty() {
            pretty_kv(w, "failed", r.failed_client_ids.join(", "))?;
        }
        if r.task_pass_failed {
            pretty_kv(w, "tasks overdue", "failed (see log)")
        } else {
            pretty_kv(w, "tasks overdue", r.tasks_marked_overdue.to_string())
        }
    })
}
