use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// The stages a client application moves through during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    Pending,
    PhoneIssued,
    InExecution,
    ExecutionDelayed,
    NeedsMoreInfo,
    ReadyForApproval,
    Approved,
    Rejected,
    Inactive,
}

impl IntakeStatus {
    /// Every status, in pipeline order.
    pub const ALL: [Self; 9] = [
        Self::Pending,
        Self::PhoneIssued,
        Self::InExecution,
        Self::ExecutionDelayed,
        Self::NeedsMoreInfo,
        Self::ReadyForApproval,
        Self::Approved,
        Self::Rejected,
        Self::Inactive,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PhoneIssued => "phone_issued",
            Self::InExecution => "in_execution",
            Self::ExecutionDelayed => "execution_delayed",
            Self::NeedsMoreInfo => "needs_more_info",
            Self::ReadyForApproval => "ready_for_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
        }
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// Terminal statuses return an empty slice. No status lists itself.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::PhoneIssued, Self::Rejected, Self::Inactive],
            Self::PhoneIssued => &[
                Self::InExecution,
                Self::NeedsMoreInfo,
                Self::Rejected,
                Self::Inactive,
            ],
            Self::InExecution => &[
                Self::ReadyForApproval,
                Self::ExecutionDelayed,
                Self::NeedsMoreInfo,
                Self::Rejected,
                Self::Inactive,
            ],
            Self::ExecutionDelayed => &[
                Self::InExecution,
                Self::NeedsMoreInfo,
                Self::Rejected,
                Self::Inactive,
            ],
            Self::NeedsMoreInfo => &[
                Self::InExecution,
                Self::ReadyForApproval,
                Self::Rejected,
                Self::Inactive,
            ],
            Self::ReadyForApproval => &[
                Self::Approved,
                Self::NeedsMoreInfo,
                Self::InExecution,
                Self::Rejected,
            ],
            Self::Approved | Self::Rejected | Self::Inactive => &[],
        }
    }

    /// Whether `target` is a legal next status.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.successors().contains(&target)
    }

    /// Terminal statuses end the pipeline; nothing leaves them.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Inactive)
    }
}

impl fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntakeStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = super::normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "intake status",
                got: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::IntakeStatus;

    #[test]
    fn terminal_statuses_have_no_successors() {
        for status in IntakeStatus::ALL {
            assert_eq!(
                status.is_terminal(),
                status.successors().is_empty(),
                "{status}"
            );
        }
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for status in IntakeStatus::ALL {
            assert!(!status.can_transition_to(status), "{status}");
        }
    }

    #[test]
    fn every_non_initial_status_is_reachable() {
        for target in IntakeStatus::ALL {
            if target == IntakeStatus::Pending {
                continue;
            }
            let reachable = IntakeStatus::ALL
                .iter()
                .any(|from| from.can_transition_to(target));
            assert!(reachable, "{target} has no inbound edge");
        }
    }

    #[test]
    fn parse_accepts_mixed_case_and_whitespace() {
        assert_eq!(
            " In_Execution ".parse::<IntakeStatus>().expect("parse"),
            IntakeStatus::InExecution
        );
        assert!("executing".parse::<IntakeStatus>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for status in IntakeStatus::ALL {
            assert_eq!(
                status.to_string().parse::<IntakeStatus>().expect("parse"),
                status
            );
        }
    }
}
