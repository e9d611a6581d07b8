use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Highest attainable star level.
pub const MAX_STAR_LEVEL: u8 = 4;

/// Rank label derived from an agent's star level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Rookie,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    pub const ALL: [Self; 5] = [
        Self::Rookie,
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rookie => "rookie",
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    #[must_use]
    pub const fn star_level(self) -> u8 {
        match self {
            Self::Rookie => 0,
            Self::Bronze => 1,
            Self::Silver => 2,
            Self::Gold => 3,
            Self::Platinum => 4,
        }
    }

    /// Tier for a star level; anything above the maximum clamps to platinum.
    #[must_use]
    pub const fn from_star_level(level: u8) -> Self {
        match level {
            0 => Self::Rookie,
            1 => Self::Bronze,
            2 => Self::Silver,
            3 => Self::Gold,
            _ => Self::Platinum,
        }
    }

    /// Tier earned by an approved-client count.
    ///
    /// | approved | tier |
    /// |---|---|
    /// | 0–2 | rookie (0) |
    /// | 3–6 | bronze (1) |
    /// | 7–12 | silver (2) |
    /// | 13–20 | gold (3) |
    /// | 21+ | platinum (4) |
    #[must_use]
    pub const fn for_approved_count(approved: u64) -> Self {
        match approved {
            0..=2 => Self::Rookie,
            3..=6 => Self::Bronze,
            7..=12 => Self::Silver,
            13..=20 => Self::Gold,
            _ => Self::Platinum,
        }
    }
}

/// Agent role. Administrators can act as the system actor for scheduled jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Agent,
    Admin,
}

impl AgentRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

/// An agent in the reporting tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub agent_id: String,
    pub display_name: String,
    pub role: AgentRole,
    pub is_active: bool,
    pub star_level: u8,
    pub supervisor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    #[must_use]
    pub const fn tier(&self) -> Tier {
        Tier::from_star_level(self.star_level)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize(s).as_str() {
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                expected: "agent role",
                got: s.to_string(),
            }),
        }
    }
}
