//! Checklist templates per lifecycle status.
//!
//! [`templates_for`] is a pure function: it decides which tasks should exist
//! once a client lands in a status, and nothing else. Deduplication against
//! tasks that are already open happens in the transition engine.

use chrono::{DateTime, Duration, Utc};

use crate::model::status::IntakeStatus;
use crate::model::task::{
    PRIORITY_HIGH, PRIORITY_NORMAL, PRIORITY_URGENT, TaskTemplate, TaskType,
};

/// Hours allowed for short-fuse follow-ups (verification, sign-out).
const SHORT_FUSE_HOURS: i64 = 24;
/// Hours a client has to answer an information request.
const INFO_REQUEST_HOURS: i64 = 48;
/// Days allowed to collect an issued phone after approval.
const PHONE_RETURN_DAYS: i64 = 7;

/// Inputs the templates depend on.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub now: DateTime<Utc>,
    /// Execution deadline; only consulted for [`IntakeStatus::InExecution`].
    pub execution_deadline: DateTime<Utc>,
    /// Tracked external platforms, in checklist order.
    pub platforms: &'a [String],
}

/// Tasks that should exist once a client enters `target`.
#[must_use]
pub fn templates_for(target: IntakeStatus, ctx: &TemplateContext<'_>) -> Vec<TaskTemplate> {
    match target {
        IntakeStatus::PhoneIssued => vec![
            simple(
                TaskType::Verification,
                "Confirm phone received by client",
                PRIORITY_URGENT,
                ctx.now + Duration::hours(SHORT_FUSE_HOURS),
            ),
            simple(
                TaskType::Verification,
                "Verify client identity documents",
                PRIORITY_URGENT,
                ctx.now + Duration::hours(SHORT_FUSE_HOURS),
            ),
        ],
        IntakeStatus::InExecution => {
            let mut tasks: Vec<TaskTemplate> = ctx
                .platforms
                .iter()
                .zip(1u32..)
                .map(|(platform, step)| TaskTemplate {
                    task_type: TaskType::UploadScreenshot,
                    title: format!("Upload {platform} registration screenshot"),
                    priority: PRIORITY_HIGH,
                    due_at: ctx.execution_deadline,
                    platform: Some(platform.clone()),
                    step_number: Some(step),
                })
                .collect();
            tasks.push(simple(
                TaskType::Execution,
                "Complete all platform registrations",
                PRIORITY_HIGH,
                ctx.execution_deadline,
            ));
            tasks
        }
        IntakeStatus::NeedsMoreInfo => vec![simple(
            TaskType::ProvideInfo,
            "Provide requested information",
            PRIORITY_URGENT,
            ctx.now + Duration::hours(INFO_REQUEST_HOURS),
        )],
        IntakeStatus::Approved => vec![
            simple(
                TaskType::PhoneSignout,
                "Sign out of all platforms on issued phone",
                PRIORITY_HIGH,
                ctx.now + Duration::hours(SHORT_FUSE_HOURS),
            ),
            simple(
                TaskType::PhoneReturn,
                "Collect issued phone",
                PRIORITY_NORMAL,
                ctx.now + Duration::days(PHONE_RETURN_DAYS),
            ),
        ],
        IntakeStatus::Pending
        | IntakeStatus::ExecutionDelayed
        | IntakeStatus::ReadyForApproval
        | IntakeStatus::Rejected
        | IntakeStatus::Inactive => Vec::new(),
    }
}

/// Task types whose open instances are cancelled when a client leaves
/// `from` for a non-terminal status.
#[must_use]
pub const fn cancelled_on_leave(from: IntakeStatus) -> &'static [TaskType] {
    match from {
        IntakeStatus::NeedsMoreInfo => &[TaskType::ProvideInfo],
        _ => &[],
    }
}

fn simple(task_type: TaskType, title: &str, priority: u8, due_at: DateTime<Utc>) -> TaskTemplate {
    TaskTemplate {
        task_type,
        title: title.to_string(),
        priority,
        due_at,
        platform: None,
        step_number: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn platforms() -> Vec<String> {
        vec!["alpha".into(), "beta".into(), "gamma".into()]
    }

    fn ctx(platforms: &[String]) -> TemplateContext<'_> {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().expect("valid");
        TemplateContext {
            now,
            execution_deadline: now + Duration::days(5),
            platforms,
        }
    }

    #[test]
    fn phone_issued_creates_two_short_fuse_verifications() {
        let p = platforms();
        let c = ctx(&p);
        let tasks = templates_for(IntakeStatus::PhoneIssued, &c);
        assert_eq!(tasks.len(), 2);
        for task in &tasks {
            assert_eq!(task.task_type, TaskType::Verification);
            assert_eq!(task.due_at, c.now + Duration::hours(24));
            assert_eq!(task.priority, PRIORITY_URGENT);
        }
    }

    #[test]
    fn in_execution_creates_one_upload_per_platform_plus_aggregate() {
        let p = platforms();
        let c = ctx(&p);
        let tasks = templates_for(IntakeStatus::InExecution, &c);
        assert_eq!(tasks.len(), p.len() + 1);

        let uploads: Vec<_> = tasks
            .iter()
            .filter(|t| t.task_type == TaskType::UploadScreenshot)
            .collect();
        assert_eq!(uploads.len(), 3);
        assert_eq!(uploads[1].platform.as_deref(), Some("beta"));
        assert_eq!(uploads[1].step_number, Some(2));
        assert!(tasks.iter().all(|t| t.due_at == c.execution_deadline));

        let aggregate = tasks.last().expect("aggregate task");
        assert_eq!(aggregate.task_type, TaskType::Execution);
        assert!(aggregate.platform.is_none());
    }

    #[test]
    fn needs_more_info_creates_single_follow_up() {
        let p = platforms();
        let c = ctx(&p);
        let tasks = templates_for(IntakeStatus::NeedsMoreInfo, &c);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_type, TaskType::ProvideInfo);
        assert_eq!(tasks[0].due_at, c.now + Duration::hours(48));
    }

    #[test]
    fn approved_creates_phone_signout_and_return() {
        let p = platforms();
        let c = ctx(&p);
        let types: Vec<_> = templates_for(IntakeStatus::Approved, &c)
            .into_iter()
            .map(|t| t.task_type)
            .collect();
        assert_eq!(types, vec![TaskType::PhoneSignout, TaskType::PhoneReturn]);
    }

    #[test]
    fn other_statuses_generate_nothing() {
        let p = platforms();
        let c = ctx(&p);
        for status in [
            IntakeStatus::Pending,
            IntakeStatus::ExecutionDelayed,
            IntakeStatus::ReadyForApproval,
            IntakeStatus::Rejected,
            IntakeStatus::Inactive,
        ] {
            assert!(templates_for(status, &c).is_empty(), "{status}");
        }
    }

    #[test]
    fn leaving_needs_more_info_cancels_provide_info() {
        assert_eq!(
            cancelled_on_leave(IntakeStatus::NeedsMoreInfo),
            &[TaskType::ProvideInfo]
        );
        assert!(cancelled_on_leave(IntakeStatus::InExecution).is_empty());
    }
}
