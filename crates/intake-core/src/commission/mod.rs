//! Star levels and bonus pools.
//!
//! [`CommissionEngine`] owns the commission side of an approval:
//!
//! - [`CommissionEngine::recalculate_star_level`] maps an agent's approved
//!   client count to a [`Tier`] and persists its star level.
//! - [`CommissionEngine::create_bonus_pool`] opens the single pool an approved
//!   client is entitled to, distributes it, then refreshes the closer's stars.
//! - [`CommissionEngine::distribute_star_pool`] runs the walk in
//!   [`distribute`] at most once per pool.

pub mod distribute;

use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;

use crate::clock::{Clock, SystemClock};
use crate::db::{self, query};
use crate::error::{IntakeError, StorageContext, require_id};
use crate::model::agent::Tier;
use crate::model::bonus::BonusPool;
use crate::model::status::IntakeStatus;

pub use distribute::{DistributionPlan, plan_distribution};

/// Actor recorded on commission audit entries when none is supplied.
pub const SYSTEM_ACTOR: &str = "system";

static SYSTEM_CLOCK: SystemClock = SystemClock;

/// Result of a star-level recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarLevelChange {
    pub agent_id: String,
    pub approved_clients: u64,
    pub previous_star_level: u8,
    pub star_level: u8,
    pub tier: Tier,
}

impl StarLevelChange {
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.previous_star_level != self.star_level
    }
}

/// Computes star levels and creates and distributes bonus pools.
pub struct CommissionEngine<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
    actor_id: &'a str,
}

impl<'a> CommissionEngine<'a> {
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            clock: &SYSTEM_CLOCK,
            actor_id: SYSTEM_ACTOR,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Attribute audit entries to `actor_id` instead of [`SYSTEM_ACTOR`].
    #[must_use]
    pub const fn with_actor(mut self, actor_id: &'a str) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// Recompute and persist `agent_id`'s star level from its approved
    /// clients. Idempotent; an audit entry is written only on change.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::Validation`] for an empty id,
    /// [`IntakeError::NotFound`] for an unknown agent, or
    /// [`IntakeError::Persistence`] if the unit fails.
    pub fn recalculate_star_level(&self, agent_id: &str) -> Result<StarLevelChange, IntakeError> {
        require_id("agent", agent_id)?;
        let now = self.clock.now();
        let tx = db::immediate(self.conn).storage("begin star recalculation")?;

        let agent = query::get_agent(&tx, agent_id)
            .storage("load agent")?
            .ok_or_else(|| IntakeError::not_found("agent", agent_id))?;
        let approved_clients =
            query::count_approved_clients(&tx, agent_id).storage("count approved clients")?;
        let tier = Tier::for_approved_count(approved_clients);

        let change = StarLevelChange {
            agent_id: agent_id.to_string(),
            approved_clients,
            previous_star_level: agent.star_level,
            star_level: tier.star_level(),
            tier,
        };

        if change.changed() {
            query::set_star_level(&tx, agent_id, change.star_level, now)
                .storage("update star level")?;
            let old = change.previous_star_level.to_string();
            let new = change.star_level.to_string();
            query::append_audit(
                &tx,
                &query::NewAuditEntry {
                    entity_type: "agent",
                    entity_id: agent_id,
                    action: "star_level_changed",
                    old_value: Some(&old),
                    new_value: Some(&new),
                    actor_id: self.actor_id,
                    metadata: json!({
                        "approved_clients": approved_clients,
                        "tier": tier.as_str(),
                    }),
                    at: now,
                },
            )
            .storage("append star audit")?;
        }

        tx.commit().storage("commit star recalculation")?;

        if change.changed() {
            tracing::info!(
                agent_id,
                from = change.previous_star_level,
                to = change.star_level,
                tier = tier.as_str(),
                "star level changed"
            );
        }
        Ok(change)
    }

    /// Open, distribute and account for the bonus pool of an approved client.
    ///
    /// A client gets one pool ever: when a pool already exists it is returned
    /// unchanged and nothing is written. Pool creation and distribution are
    /// separate units; if distribution fails the pool stays pending and
    /// [`Self::distribute_star_pool`] can be retried.
    ///
    /// # Errors
    ///
    /// - [`IntakeError::Validation`] for an empty id or a client that is not
    ///   approved
    /// - [`IntakeError::NotFound`] for an unknown client
    /// - any error of [`Self::distribute_star_pool`] or
    ///   [`Self::recalculate_star_level`]
    pub fn create_bonus_pool(&self, client_id: &str) -> Result<BonusPool, IntakeError> {
        require_id("client", client_id)?;
        let now = self.clock.now();
        let tx = db::immediate(self.conn).storage("begin pool creation")?;

        let client = query::get_client(&tx, client_id)
            .storage("load client")?
            .ok_or_else(|| IntakeError::not_found("client", client_id))?;

        if let Some(existing) = query::get_pool_for_client(&tx, client_id).storage("load pool")? {
            tracing::debug!(client_id, pool_id = existing.pool_id, "bonus pool already exists");
            return Ok(existing);
        }
        if client.status != IntakeStatus::Approved {
            return Err(IntakeError::Validation(format!(
                "client '{client_id}' is {}, bonus pools require an approved client",
                client.status
            )));
        }

        let Some(pool_id) = query::insert_pool_if_absent(&tx, client_id, &client.agent_id, now)
            .storage("create pool")?
        else {
            drop(tx);
            return query::get_pool_for_client(self.conn, client_id)
                .storage("load pool")?
                .ok_or_else(|| IntakeError::not_found("bonus pool", client_id));
        };

        let pool_key = pool_id.to_string();
        query::append_audit(
            &tx,
            &query::NewAuditEntry {
                entity_type: "bonus_pool",
                entity_id: &pool_key,
                action: "bonus_pool_created",
                old_value: None,
                new_value: Some("pending"),
                actor_id: self.actor_id,
                metadata: json!({ "client_id": client_id, "closer_id": client.agent_id }),
                at: now,
            },
        )
        .storage("append pool audit")?;
        tx.commit().storage("commit pool creation")?;

        tracing::info!(client_id, pool_id, closer_id = %client.agent_id, "bonus pool created");

        let pool = self.distribute_star_pool(pool_id)?;
        self.recalculate_star_level(&client.agent_id)?;
        Ok(pool)
    }

    /// Distribute a pending pool across the closer's supervisor chain.
    ///
    /// # Errors
    ///
    /// [`IntakeError::NotFound`] for an unknown pool,
    /// [`IntakeError::AlreadyDistributed`] when the pool is not pending, or
    /// [`IntakeError::Persistence`] if the unit fails.
    pub fn distribute_star_pool(&self, pool_id: i64) -> Result<BonusPool, IntakeError> {
        distribute::distribute(self.conn, self.clock.now(), self.actor_id, pool_id)
    }
}
