use chrono::{DateTime, Utc};
use serde::Serialize;

use super::status::IntakeStatus;

/// A client application moving through intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub client_id: String,
    pub display_name: String,
    pub status: IntakeStatus,
    /// Agent who owns (and eventually closes) this client.
    pub agent_id: String,
    pub execution_deadline: Option<DateTime<Utc>>,
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
