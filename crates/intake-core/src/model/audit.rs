use chrono::{DateTime, Utc};
use serde::Serialize;

/// One immutable row of the event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub entry_id: i64,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor_id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
