use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ParseEnumError;

/// Number of slices in every bonus pool.
pub const TOTAL_SLICES: u8 = 4;

/// Flat bonus paid to the closer of every approved client, in cents.
pub const DIRECT_BONUS_CENTS: i64 = 20_000;

/// Value of one pool slice, in cents.
pub const SLICE_VALUE_CENTS: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Pending,
    Distributed,
}

impl PoolStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Distributed => "distributed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationType {
    /// Flat closer bonus, independent of star level.
    Direct,
    /// Slices taken during the supervisor-chain walk.
    StarSlice,
    /// Leftover slices handed to the highest-star agent of the walk.
    Backfill,
}

impl AllocationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::StarSlice => "star_slice",
            Self::Backfill => "backfill",
        }
    }
}

/// One agent's visit during the distribution walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStep {
    pub agent_id: String,
    pub star_level: u8,
    pub slices: u8,
}

/// Commission pot for one approved client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusPool {
    pub pool_id: i64,
    pub client_id: String,
    pub closer_id: String,
    pub status: PoolStatus,
    pub distributed_slices: u8,
    pub recycled_slices: u8,
    pub walk_snapshot: Vec<WalkStep>,
    pub created_at: DateTime<Utc>,
    pub distributed_at: Option<DateTime<Utc>>,
}

/// A single payout line of a distributed pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusAllocation {
    pub pool_id: i64,
    pub agent_id: String,
    pub allocation_type: AllocationType,
    pub slices: u8,
    pub amount_cents: i64,
    /// Star level at allocation time, not a live join.
    pub star_level: u8,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize(s).as_str() {
            "pending" => Ok(Self::Pending),
            "distributed" => Ok(Self::Distributed),
            _ => Err(ParseEnumError {
                expected: "pool status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for AllocationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize(s).as_str() {
            "direct" => Ok(Self::Direct),
            "star_slice" => Ok(Self::StarSlice),
            "backfill" => Ok(Self::Backfill),
            _ => Err(ParseEnumError {
                expected: "allocation type",
                got: s.to_string(),
            }),
        }
    }
}
