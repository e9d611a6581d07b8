//! `intake transition`: move a client along the intake pipeline.
//!
//! Runs the transition engine as the resolved actor. Notices for approvals,
//! rejections and info requests are emitted as structured log events.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, render};
use anyhow::Result;
use clap::Args;
use intake_core::model::status::IntakeStatus;
use intake_core::notify::{Notifier, NotifyError, TransitionNotice};
use intake_core::transition::{TransitionEngine, TransitionOptions};

#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Client ID.
    pub client: String,

    /// Target status (e.g. phone_issued, in_execution, approved).
    pub status: IntakeStatus,

    /// Human-readable reason recorded in the audit log.
    #[arg(long)]
    pub reason: Option<String>,

    /// Business days until the execution deadline (overrides config).
    #[arg(long)]
    pub deadline_days: Option<u32>,
}

/// Hands notices to the log pipeline.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotifyError> {
        tracing::info!(
            target: "intake::notify",
            client_id = %notice.client_id,
            agent_id = %notice.agent_id,
            from = %notice.from,
            to = %notice.to,
            reason = notice.reason.as_deref().unwrap_or(""),
            "client status notice"
        );
        Ok(())
    }
}

pub fn run_transition(args: &TransitionArgs, ctx: &Context) -> Result<()> {
    let actor = ctx.require_actor()?;
    let conn = ctx.open_store()?;

    let notifier = LogNotifier;
    let engine = TransitionEngine::new(&conn, &ctx.config).with_notifier(&notifier);
    let options = TransitionOptions {
        reason: args.reason.clone(),
        deadline_days: args.deadline_days,
        metadata: None,
    };

    let outcome = engine
        .transition(&args.client, args.status, &actor, &options)
        .map_err(|e| fail(ctx.output, e))?;

    render(ctx.output, &outcome, |o, w| {
        writeln!(w, "✓ {}: {} -> {}", o.client_id, o.from, o.to)?;
        if let Some(deadline) = o.execution_deadline {
            pretty_kv(w, "deadline", deadline.to_rfc3339())?;
        }
        pretty_kv(w, "tasks created", o.created_task_ids.len().to_string())?;
        if o.cancelled_tasks > 0 {
            pretty_kv(w, "cancelled", o.cancelled_tasks.to_string())?;
        }
        if o.skipped_tasks > 0 {
            pretty_kv(w, "kept open", o.skipped_tasks.to_string())?;
        }
        Ok(())
    })
}
