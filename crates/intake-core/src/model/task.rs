use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Checklist task kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Verification,
    UploadScreenshot,
    /// Aggregate "complete all registrations" task for the execution stage.
    Execution,
    ProvideInfo,
    PhoneSignout,
    PhoneReturn,
}

impl TaskType {
    pub const ALL: [Self; 6] = [
        Self::Verification,
        Self::UploadScreenshot,
        Self::Execution,
        Self::ProvideInfo,
        Self::PhoneSignout,
        Self::PhoneReturn,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::UploadScreenshot => "upload_screenshot",
            Self::Execution => "execution",
            Self::ProvideInfo => "provide_info",
            Self::PhoneSignout => "phone_signout",
            Self::PhoneReturn => "phone_return",
        }
    }
}

/// Task progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Overdue,
}

impl TaskStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Overdue,
    ];

    /// Statuses that still count as outstanding work.
    pub const OPEN: [Self; 3] = [Self::Pending, Self::InProgress, Self::Overdue];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Overdue => "overdue",
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress | Self::Overdue)
    }
}

/// Task urgency. Higher is more urgent.
pub type Priority = u8;

pub const PRIORITY_URGENT: Priority = 3;
pub const PRIORITY_HIGH: Priority = 2;
pub const PRIORITY_NORMAL: Priority = 1;

/// A task the template generator wants to exist. Not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTemplate {
    pub task_type: TaskType,
    pub title: String,
    pub priority: Priority,
    pub due_at: DateTime<Utc>,
    pub platform: Option<String>,
    pub step_number: Option<u32>,
}

/// A persisted checklist task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub task_id: i64,
    pub client_id: String,
    pub assigned_agent_id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub title: String,
    pub priority: Priority,
    pub due_at: DateTime<Utc>,
    pub platform: Option<String>,
    pub step_number: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = super::normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "task type",
                got: s.to_string(),
            })
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = super::normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "task status",
                got: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskStatus, TaskType};

    #[test]
    fn open_set_matches_is_open() {
        for status in TaskStatus::ALL {
            assert_eq!(status.is_open(), TaskStatus::OPEN.contains(&status));
        }
    }

    #[test]
    fn parse_task_type() {
        assert_eq!(
            "UPLOAD_SCREENSHOT".parse::<TaskType>().expect("parse"),
            TaskType::UploadScreenshot
        );
        let err = "upload".parse::<TaskType>().expect_err("should fail");
        assert_eq!(err.to_string(), "invalid task type: 'upload'");
    }
}
