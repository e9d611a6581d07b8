//! Fire-and-forget notification hook invoked after committed transitions.
//!
//! Delivery itself (email, push, chat) lives outside this crate. The engine
//! calls [`Notifier::notify`] after the transition commits, logs any failure,
//! and never lets it change the transition outcome.

use serde::Serialize;
use std::sync::Mutex;

use crate::model::status::IntakeStatus;

/// What happened, for the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionNotice {
    pub client_id: String,
    pub agent_id: String,
    pub from: IntakeStatus,
    pub to: IntakeStatus,
    pub reason: Option<String>,
}

impl TransitionNotice {
    /// Transitions that warrant telling the owning agent.
    ///
    /// Approval, rejection, and a reviewer sending a ready application back
    /// for more information.
    #[must_use]
    pub const fn is_notifiable(from: IntakeStatus, to: IntakeStatus) -> bool {
        matches!(
            (from, to),
            (_, IntakeStatus::Approved | IntakeStatus::Rejected)
                | (IntakeStatus::ReadyForApproval, IntakeStatus::NeedsMoreInfo)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Notification dispatcher.
pub trait Notifier {
    /// Deliver (or enqueue) a notice. Must not block on slow transports.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the notice could not be handed off.
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotifyError>;
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notice: &TransitionNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Keeps notices in memory; useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<TransitionNotice>>,
    fail: bool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records and then reports failure for every notice.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    #[must_use]
    pub fn notices(&self) -> Vec<TransitionNotice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotifyError> {
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice.clone());
        }
        if self.fail {
            return Err(NotifyError("transport unavailable".into()));
        }
        Ok(())
    }
}

/// Hand `notice` to `notifier`, swallowing and logging failures.
pub(crate) fn dispatch(notifier: &dyn Notifier, notice: &TransitionNotice) {
    if let Err(err) = notifier.notify(notice) {
        tracing::warn!(
            client_id = %notice.client_id,
            from = %notice.from,
            to = %notice.to,
            error = %err,
            "notification dispatch failed; continuing"
        );
    }
}
