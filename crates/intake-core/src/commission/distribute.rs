//! Star-pool distribution: the supervisor-chain walk.
//!
//! The pool holds [`TOTAL_SLICES`] slices. The closer always receives the
//! flat direct bonus. Starting at the closer and moving up the supervisor
//! chain, each visited agent takes `min(star_level, remaining)` slices until
//! nothing remains or the chain ends. Leftovers go to the highest-star agent
//! of the walk (first one wins on ties) up to their star level; whatever is
//! still left is recycled.
//!
//! [`plan_distribution`] is pure. [`distribute`] persists a plan in one
//! `BEGIN IMMEDIATE` unit guarded by a pending → distributed compare-and-swap.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::iter;

use crate::db::{self, query};
use crate::error::{IntakeError, StorageContext};
use crate::hierarchy::OrgChart;
use crate::model::agent::{Agent, MAX_STAR_LEVEL};
use crate::model::bonus::{
    AllocationType, BonusAllocation, BonusPool, DIRECT_BONUS_CENTS, PoolStatus,
    SLICE_VALUE_CENTS, TOTAL_SLICES, WalkStep,
};

/// Outcome of the walk, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionPlan {
    pub closer_id: String,
    pub closer_star_level: u8,
    /// Every agent visited, in walk order, with the slices it took.
    pub steps: Vec<WalkStep>,
    /// Extra slices for the highest-star agent of the walk, if any.
    pub backfill: Option<WalkStep>,
    pub distributed_slices: u8,
    pub recycled_slices: u8,
}

impl DistributionPlan {
    /// Allocation lines for `pool_id`: the direct bonus first, then walk
    /// slices, then backfill. Zero-slice walk steps produce no line.
    #[must_use]
    pub fn allocations(&self, pool_id: i64) -> Vec<BonusAllocation> {
        let direct = BonusAllocation {
            pool_id,
            agent_id: self.closer_id.clone(),
            allocation_type: AllocationType::Direct,
            slices: 0,
            amount_cents: DIRECT_BONUS_CENTS,
            star_level: self.closer_star_level,
        };
        let slices = self
            .steps
            .iter()
            .filter(|step| step.slices > 0)
            .map(|step| slice_line(pool_id, step, AllocationType::StarSlice));
        let backfill = self
            .backfill
            .iter()
            .map(|step| slice_line(pool_id, step, AllocationType::Backfill));

        iter::once(direct).chain(slices).chain(backfill).collect()
    }
}

fn slice_line(pool_id: i64, step: &WalkStep, allocation_type: AllocationType) -> BonusAllocation {
    BonusAllocation {
        pool_id,
        agent_id: step.agent_id.clone(),
        allocation_type,
        slices: step.slices,
        amount_cents: i64::from(step.slices) * SLICE_VALUE_CENTS,
        star_level: step.star_level,
    }
}

/// Walk `closer` then `ancestors` (nearest first) and split the pool.
#[must_use]
pub fn plan_distribution(closer: &Agent, ancestors: &[&Agent]) -> DistributionPlan {
    let mut remaining = TOTAL_SLICES;
    let mut steps: Vec<WalkStep> = Vec::new();

    for agent in iter::once(closer).chain(ancestors.iter().copied()) {
        if remaining == 0 {
            break;
        }
        let star_level = agent.star_level.min(MAX_STAR_LEVEL);
        let slices = star_level.min(remaining);
        remaining -= slices;
        steps.push(WalkStep {
            agent_id: agent.agent_id.clone(),
            star_level,
            slices,
        });
    }

    let backfill = highest_star_step(&steps)
        .filter(|step| remaining > 0 && step.star_level > 0)
        .and_then(|step| {
            let extra = step.star_level.saturating_sub(step.slices).min(remaining);
            (extra > 0).then(|| WalkStep {
                agent_id: step.agent_id.clone(),
                star_level: step.star_level,
                slices: extra,
            })
        });
    if let Some(step) = &backfill {
        remaining -= step.slices;
    }

    DistributionPlan {
        closer_id: closer.agent_id.clone(),
        closer_star_level: closer.star_level.min(MAX_STAR_LEVEL),
        steps,
        backfill,
        distributed_slices: TOTAL_SLICES - remaining,
        recycled_slices: remaining,
    }
}

/// The visited agent with the highest star level. Ties go to the agent
/// nearest the closer.
fn highest_star_step(steps: &[WalkStep]) -> Option<&WalkStep> {
    steps.iter().fold(None, |best: Option<&WalkStep>, step| match best {
        Some(b) if b.star_level >= step.star_level => Some(b),
        _ => Some(step),
    })
}

/// Distribute a pending pool exactly once.
///
/// # Errors
///
/// - [`IntakeError::NotFound`] if the pool or its closer is missing
/// - [`IntakeError::AlreadyDistributed`] if the pool is not pending, including
///   when a concurrent caller wins the compare-and-swap
/// - [`IntakeError::Persistence`] if the unit fails; the pool stays pending
///   and no allocation is kept
pub(crate) fn distribute(
    conn: &Connection,
    now: DateTime<Utc>,
    actor_id: &str,
    pool_id: i64,
) -> Result<BonusPool, IntakeError> {
    let tx = db::immediate(conn).storage("begin distribution")?;

    let pool = query::get_pool(&tx, pool_id)
        .storage("load pool")?
        .ok_or_else(|| IntakeError::not_found("bonus pool", pool_id.to_string()))?;
    if pool.status != PoolStatus::Pending {
        return Err(IntakeError::AlreadyDistributed { pool_id });
    }

    let chart = OrgChart::load(&tx)?;
    let closer = chart
        .get(&pool.closer_id)
        .ok_or_else(|| IntakeError::not_found("agent", pool.closer_id.clone()))?;
    let ancestors = chart.ancestor_chain(&pool.closer_id)?;
    let plan = plan_distribution(closer, &ancestors);

    for allocation in plan.allocations(pool_id) {
        query::insert_allocation(&tx, &allocation, now).storage("write allocation")?;
    }

    let mut walk = plan.steps.clone();
    walk.extend(plan.backfill.iter().cloned());
    let flipped = query::mark_pool_distributed(
        &tx,
        pool_id,
        plan.distributed_slices,
        plan.recycled_slices,
        &walk,
        now,
    )
    .storage("mark pool distributed")?;
    if !flipped {
        return Err(IntakeError::AlreadyDistributed { pool_id });
    }

    let pool_key = pool_id.to_string();
    query::append_audit(
        &tx,
        &query::NewAuditEntry {
            entity_type: "bonus_pool",
            entity_id: &pool_key,
            action: "bonus_pool_distributed",
            old_value: Some(PoolStatus::Pending.as_str()),
            new_value: Some(PoolStatus::Distributed.as_str()),
            actor_id,
            metadata: json!({
                "client_id": pool.client_id,
                "distributed_slices": plan.distributed_slices,
                "recycled_slices": plan.recycled_slices,
                "walk": plan.steps,
                "backfill": plan.backfill,
            }),
            at: now,
        },
    )
    .storage("append distribution audit")?;

    tx.commit().storage("commit distribution")?;

    tracing::info!(
        pool_id,
        client_id = %pool.client_id,
        closer_id = %pool.closer_id,
        distributed = plan.distributed_slices,
        recycled = plan.recycled_slices,
        "bonus pool distributed"
    );

    query::get_pool(conn, pool_id)
        .storage("reload pool")?
        .ok_or_else(|| IntakeError::not_found("bonus pool", pool_key))
}
