//! Client lifecycle transitions.
//!
//! [`TransitionEngine::transition`] is the only writer of a client's status.
//! One call is one `BEGIN IMMEDIATE` unit covering:
//!
//! 1. the status (and execution deadline) update,
//! 2. the `status_change` audit entry,
//! 3. cancellation of open tasks when entering a terminal status,
//! 4. cancellation of status-specific tasks when leaving certain statuses,
//! 5. creation of the target status's checklist tasks, skipping upload and
//!    aggregate execution tasks that are still open from an earlier visit.
//!
//! Any failure rolls the whole unit back. Notifications go out only after
//! commit and never affect the result.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;

use crate::calendar::add_business_days;
use crate::clock::{Clock, SystemClock};
use crate::config::IntakeConfig;
use crate::db::{self, query};
use crate::error::{IntakeError, StorageContext, require_id};
use crate::model::status::IntakeStatus;
use crate::model::task::{TaskTemplate, TaskType};
use crate::notify::{self, NoopNotifier, Notifier, TransitionNotice};
use crate::tasks::{TemplateContext, cancelled_on_leave, templates_for};

static SYSTEM_CLOCK: SystemClock = SystemClock;
static NOOP_NOTIFIER: NoopNotifier = NoopNotifier;

/// Optional knobs for a single transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionOptions {
    /// Human-readable reason, recorded in the audit entry and notification.
    pub reason: Option<String>,
    /// Business days until the execution deadline. Overrides
    /// `execution.deadline_days`; only used when entering `in_execution`.
    pub deadline_days: Option<u32>,
    /// Extra structured context merged into the audit entry's metadata.
    pub metadata: Option<serde_json::Value>,
}

impl TransitionOptions {
    #[must_use]
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// What a successful transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub client_id: String,
    pub from: IntakeStatus,
    pub to: IntakeStatus,
    pub execution_deadline: Option<DateTime<Utc>>,
    pub created_task_ids: Vec<i64>,
    pub cancelled_tasks: usize,
    /// Templates not created because an equivalent task was still open.
    pub skipped_tasks: usize,
}

/// Applies status changes to clients.
pub struct TransitionEngine<'a> {
    conn: &'a Connection,
    config: &'a IntakeConfig,
    clock: &'a dyn Clock,
    notifier: &'a dyn Notifier,
}

impl<'a> TransitionEngine<'a> {
    /// Engine using the system clock and no notifications.
    #[must_use]
    pub fn new(conn: &'a Connection, config: &'a IntakeConfig) -> Self {
        Self {
            conn,
            config,
            clock: &SYSTEM_CLOCK,
            notifier: &NOOP_NOTIFIER,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub(crate) const fn conn(&self) -> &'a Connection {
        self.conn
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Move `client_id` to `target` on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Validation`] for empty ids or a zero deadline override
    /// - [`IntakeError::NotFound`] if the client does not exist
    /// - [`IntakeError::IllegalTransition`] if `target` is not a successor of
    ///   the current status
    /// - [`IntakeError::Persistence`] if the unit fails to commit; the client
    ///   keeps its previous status
    pub fn transition(
        &self,
        client_id: &str,
        target: IntakeStatus,
        actor_id: &str,
        options: &TransitionOptions,
    ) -> Result<TransitionOutcome, IntakeError> {
        require_id("client", client_id)?;
        require_id("actor", actor_id)?;
        let deadline_days = options
            .deadline_days
            .unwrap_or(self.config.execution.deadline_days);
        if options.deadline_days == Some(0)
            || (target == IntakeStatus::InExecution && deadline_days == 0)
        {
            return Err(IntakeError::Validation(
                "deadline_days must be at least 1".into(),
            ));
        }

        let now = self.clock.now();
        let tx = db::immediate(self.conn).storage("begin transition")?;

        let client = query::get_client(&tx, client_id)
            .storage("load client")?
            .ok_or_else(|| IntakeError::not_found("client", client_id))?;
        let from = client.status;

        if !from.can_transition_to(target) {
            return Err(IntakeError::IllegalTransition {
                from: from.to_string(),
                to: target.to_string(),
            });
        }

        let execution_deadline = (target == IntakeStatus::InExecution)
            .then(|| add_business_days(now, deadline_days));

        let moved =
            query::update_client_status(&tx, client_id, from, target, execution_deadline, now)
                .storage("update client status")?;
        if !moved {
            return Err(IntakeError::Persistence("update client status".into()));
        }

        let mut metadata = json!({
            "reason": options.reason,
            "execution_deadline": execution_deadline.map(|d| d.to_rfc3339()),
        });
        if let (Some(extra), Some(map)) = (&options.metadata, metadata.as_object_mut()) {
            map.insert("extra".into(), extra.clone());
        }
        query::append_audit(
            &tx,
            &query::NewAuditEntry {
                entity_type: "client",
                entity_id: client_id,
                action: "status_change",
                old_value: Some(from.as_str()),
                new_value: Some(target.as_str()),
                actor_id,
                metadata,
                at: now,
            },
        )
        .storage("append status audit")?;

        let mut cancelled_tasks = 0;
        if target.is_terminal() {
            cancelled_tasks += query::cancel_open_tasks(&tx, client_id, None, now)
                .storage("cancel open tasks")?;
        }
        let leave_types = cancelled_on_leave(from);
        if !leave_types.is_empty() {
            cancelled_tasks += query::cancel_open_tasks(&tx, client_id, Some(leave_types), now)
                .storage("cancel tasks on leave")?;
        }

        let ctx = TemplateContext {
            now,
            execution_deadline: execution_deadline.unwrap_or(now),
            platforms: &self.config.execution.platforms,
        };
        let mut templates = templates_for(target, &ctx);
        let mut skipped_tasks = 0;
        if target == IntakeStatus::InExecution {
            let before = templates.len();
            templates = drop_still_open(&tx, client_id, templates)?;
            skipped_tasks = before - templates.len();
            if skipped_tasks > 0 {
                tracing::debug!(
                    client_id,
                    skipped_tasks,
                    "re-entering execution; keeping open tasks"
                );
            }
        }

        let mut created_task_ids = Vec::with_capacity(templates.len());
        for template in &templates {
            let task_id = query::insert_task(&tx, client_id, &client.agent_id, template, now)
                .storage("create task")?;
            created_task_ids.push(task_id);
        }
        if !created_task_ids.is_empty() {
            query::append_audit(
                &tx,
                &query::NewAuditEntry {
                    entity_type: "client",
                    entity_id: client_id,
                    action: "tasks_created",
                    old_value: None,
                    new_value: None,
                    actor_id,
                    metadata: json!({ "status": target.as_str(), "task_ids": created_task_ids }),
                    at: now,
                },
            )
            .storage("append task audit")?;
        }

        tx.commit().storage("commit transition")?;

        tracing::info!(
            client_id,
            actor_id,
            from = %from,
            to = %target,
            created = created_task_ids.len(),
            cancelled = cancelled_tasks,
            "client transitioned"
        );

        if self.config.notifications.enabled && TransitionNotice::is_notifiable(from, target) {
            notify::dispatch(
                self.notifier,
                &TransitionNotice {
                    client_id: client_id.to_string(),
                    agent_id: client.agent_id.clone(),
                    from,
                    to: target,
                    reason: options.reason.clone(),
                },
            );
        }

        Ok(TransitionOutcome {
            client_id: client_id.to_string(),
            from,
            to: target,
            execution_deadline,
            created_task_ids,
            cancelled_tasks,
            skipped_tasks,
        })
    }
}

/// Remove upload templates whose platform already has an open upload task,
/// and the aggregate execution template if one is still open.
fn drop_still_open(
    conn: &Connection,
    client_id: &str,
    templates: Vec<TaskTemplate>,
) -> Result<Vec<TaskTemplate>, IntakeError> {
    let open = query::open_tasks(conn, client_id).storage("load open tasks")?;
    let open_platforms: HashSet<&str> = open
        .iter()
        .filter(|t| t.task_type == TaskType::UploadScreenshot)
        .filter_map(|t| t.platform.as_deref())
        .collect();
    let execution_open = open.iter().any(|t| t.task_type == TaskType::Execution);

    Ok(templates
        .into_iter()
        .filter(|template| match template.task_type {
            TaskType::UploadScreenshot => template
                .platform
                .as_deref()
                .is_none_or(|p| !open_platforms.contains(p)),
            TaskType::Execution => !execution_open,
            _ => true,
        })
        .collect())
}
