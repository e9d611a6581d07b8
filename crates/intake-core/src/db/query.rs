//! `SQLite` query helpers for the intake store.
//!
//! Typed structs in, typed structs out; callers never see raw rows. Every
//! function takes a shared `&Connection` (a [`rusqlite::Transaction`] derefs
//! to one) so the same helpers compose inside and outside atomic units.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{from_us, to_us};
use crate::model::agent::{Agent, AgentRole};
use crate::model::audit::AuditEntry;
use crate::model::bonus::{AllocationType, BonusAllocation, BonusPool, WalkStep};
use crate::model::client::Client;
use crate::model::status::IntakeStatus;
use crate::model::task::{Task, TaskStatus, TaskTemplate, TaskType};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Fields for registering an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgent {
    pub agent_id: String,
    pub display_name: String,
    pub role: AgentRole,
    pub star_level: u8,
    pub supervisor_id: Option<String>,
}

impl NewAgent {
    #[must_use]
    pub fn new(agent_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            display_name: display_name.into(),
            role: AgentRole::Agent,
            star_level: 0,
            supervisor_id: None,
        }
    }

    #[must_use]
    pub const fn role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub const fn star_level(mut self, level: u8) -> Self {
        self.star_level = level;
        self
    }

    #[must_use]
    pub fn supervisor(mut self, supervisor_id: impl Into<String>) -> Self {
        self.supervisor_id = Some(supervisor_id.into());
        self
    }
}

/// Fields for registering a client. New clients always start `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub client_id: String,
    pub display_name: String,
    pub agent_id: String,
}

/// An audit row about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry<'a> {
    pub entity_type: &'a str,
    pub entity_id: &'a str,
    pub action: &'a str,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub actor_id: &'a str,
    pub metadata: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// Per-agent client counters used by team rollups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCounts {
    pub total: u64,
    pub by_status: BTreeMap<IntakeStatus, u64>,
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn small_int(row: &Row<'_>, idx: usize) -> rusqlite::Result<u8> {
    let raw: i64 = row.get(idx)?;
    u8::try_from(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

const AGENT_COLUMNS: &str =
    "agent_id, display_name, role, is_active, star_level, supervisor_id, created_at_us";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<Agent> {
    Ok(Agent {
        agent_id: row.get(0)?,
        display_name: row.get(1)?,
        role: parse_col(row, 2)?,
        is_active: row.get(3)?,
        star_level: small_int(row, 4)?,
        supervisor_id: row.get(5)?,
        created_at: from_us(row.get(6)?),
    })
}

const CLIENT_COLUMNS: &str =
    "client_id, display_name, status, agent_id, execution_deadline_us, \
     status_changed_at_us, created_at_us";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let deadline: Option<i64> = row.get(4)?;
    Ok(Client {
        client_id: row.get(0)?,
        display_name: row.get(1)?,
        status: parse_col(row, 2)?,
        agent_id: row.get(3)?,
        execution_deadline: deadline.map(from_us),
        status_changed_at: from_us(row.get(5)?),
        created_at: from_us(row.get(6)?),
    })
}

const TASK_COLUMNS: &str =
    "task_id, client_id, assigned_agent_id, task_type, status, title, priority, \
     due_at_us, platform, step_number, created_at_us";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        task_id: row.get(0)?,
        client_id: row.get(1)?,
        assigned_agent_id: row.get(2)?,
        task_type: parse_col(row, 3)?,
        status: parse_col(row, 4)?,
        title: row.get(5)?,
        priority: small_int(row, 6)?,
        due_at: from_us(row.get(7)?),
        platform: row.get(8)?,
        step_number: row.get(9)?,
        created_at: from_us(row.get(10)?),
    })
}

const POOL_COLUMNS: &str =
    "pool_id, client_id, closer_id, status, distributed_slices, recycled_slices, \
     walk_snapshot_json, created_at_us, distributed_at_us";

fn pool_from_row(row: &Row<'_>) -> rusqlite::Result<BonusPool> {
    let snapshot_json: String = row.get(6)?;
    let walk_snapshot: Vec<WalkStep> = serde_json::from_str(&snapshot_json)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(err)))?;
    let distributed_at: Option<i64> = row.get(8)?;
    Ok(BonusPool {
        pool_id: row.get(0)?,
        client_id: row.get(1)?,
        closer_id: row.get(2)?,
        status: parse_col(row, 3)?,
        distributed_slices: small_int(row, 4)?,
        recycled_slices: small_int(row, 5)?,
        walk_snapshot,
        created_at: from_us(row.get(7)?),
        distributed_at: distributed_at.map(from_us),
    })
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Insert a new agent.
///
/// # Errors
///
/// Returns an error on constraint violation (duplicate id, unknown
/// supervisor, star level out of range) or database failure.
pub fn insert_agent(
    conn: &Connection,
    agent: &NewAgent,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO agents (
            agent_id, display_name, role, is_active, star_level, supervisor_id,
            created_at_us, updated_at_us
        ) VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?6)",
        params![
            agent.agent_id,
            agent.display_name,
            agent.role.as_str(),
            agent.star_level,
            agent.supervisor_id,
            to_us(now),
        ],
    )?;
    Ok(())
}

/// Point `agent_id` at a new supervisor (or detach it with `None`).
///
/// Returns `false` when the agent does not exist.
///
/// # Errors
///
/// Returns an error on constraint violation or database failure.
pub fn set_supervisor(
    conn: &Connection,
    agent_id: &str,
    supervisor_id: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE agents SET supervisor_id = ?2, updated_at_us = ?3 WHERE agent_id = ?1",
        params![agent_id, supervisor_id, to_us(now)],
    )?;
    Ok(changed > 0)
}

/// Mark an agent active or inactive.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn set_agent_active(
    conn: &Connection,
    agent_id: &str,
    active: bool,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE agents SET is_active = ?2, updated_at_us = ?3 WHERE agent_id = ?1",
        params![agent_id, active, to_us(now)],
    )?;
    Ok(changed > 0)
}

/// Fetch one agent.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn get_agent(conn: &Connection, agent_id: &str) -> rusqlite::Result<Option<Agent>> {
    conn.query_row(
        &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE agent_id = ?1"),
        params![agent_id],
        agent_from_row,
    )
    .optional()
}

/// Every agent, ordered by creation time then id.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn list_agents(conn: &Connection) -> rusqlite::Result<Vec<Agent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at_us ASC, agent_id ASC"
    ))?;
    let rows = stmt.query_map([], agent_from_row)?;
    rows.collect()
}

/// Persist a recalculated star level.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn set_star_level(
    conn: &Connection,
    agent_id: &str,
    star_level: u8,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE agents SET star_level = ?2, updated_at_us = ?3 WHERE agent_id = ?1",
        params![agent_id, star_level, to_us(now)],
    )?;
    Ok(())
}

/// The longest-tenured active administrator, if any.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn longest_tenured_admin(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT agent_id FROM agents
         WHERE role = 'admin' AND is_active = 1
         ORDER BY created_at_us ASC, agent_id ASC
         LIMIT 1",
        [],
        |row| row.get(0),
    )
    .optional()
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// Insert a new client in the `pending` status.
///
/// # Errors
///
/// Returns an error on constraint violation or database failure.
pub fn insert_client(
    conn: &Connection,
    client: &NewClient,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO clients (
            client_id, display_name, status, agent_id, execution_deadline_us,
            status_changed_at_us, created_at_us
        ) VALUES (?1, ?2, 'pending', ?3, NULL, ?4, ?4)",
        params![client.client_id, client.display_name, client.agent_id, to_us(now)],
    )?;
    Ok(())
}

/// Fetch one client.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn get_client(conn: &Connection, client_id: &str) -> rusqlite::Result<Option<Client>> {
    conn.query_row(
        &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = ?1"),
        params![client_id],
        client_from_row,
    )
    .optional()
}

/// Write a new status. Only the transition engine calls this.
///
/// The `expected` status is part of the `WHERE` clause, so a concurrent
/// writer that moved the client first makes this a no-op (returns `false`).
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn update_client_status(
    conn: &Connection,
    client_id: &str,
    expected: IntakeStatus,
    target: IntakeStatus,
    execution_deadline: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE clients
         SET status = ?3,
             execution_deadline_us = COALESCE(?4, execution_deadline_us),
             status_changed_at_us = ?5
         WHERE client_id = ?1 AND status = ?2",
        params![
            client_id,
            expected.as_str(),
            target.as_str(),
            execution_deadline.map(to_us),
            to_us(now),
        ],
    )?;
    Ok(changed > 0)
}

/// Ids of clients in execution whose deadline is strictly before `now`,
/// oldest deadline first.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn overdue_client_ids(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT client_id FROM clients
         WHERE status = 'in_execution'
           AND execution_deadline_us IS NOT NULL
           AND execution_deadline_us < ?1
         ORDER BY execution_deadline_us ASC, client_id ASC",
    )?;
    let rows = stmt.query_map(params![to_us(now)], |row| row.get(0))?;
    rows.collect()
}

/// Number of approved clients owned by `agent_id`.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn count_approved_clients(conn: &Connection, agent_id: &str) -> rusqlite::Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM clients WHERE agent_id = ?1 AND status = 'approved'",
        params![agent_id],
        |row| row.get(0),
    )?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Client counters grouped by status for one agent.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn client_counts_for_agent(
    conn: &Connection,
    agent_id: &str,
) -> rusqlite::Result<ClientCounts> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM clients WHERE agent_id = ?1 GROUP BY status",
    )?;
    let rows = stmt.query_map(params![agent_id], |row| {
        let status: IntakeStatus = parse_col(row, 0)?;
        let count: i64 = row.get(1)?;
        Ok((status, u64::try_from(count).unwrap_or(0)))
    })?;

    let mut counts = ClientCounts::default();
    for row in rows {
        let (status, count) = row?;
        counts.total += count;
        *counts.by_status.entry(status).or_insert(0) += count;
    }
    Ok(counts)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Persist one task generated from a template.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn insert_task(
    conn: &Connection,
    client_id: &str,
    assigned_agent_id: &str,
    template: &TaskTemplate,
    now: DateTime<Utc>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tasks (
            client_id, assigned_agent_id, task_type, status, title, priority,
            due_at_us, platform, step_number, created_at_us, updated_at_us
        ) VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            client_id,
            assigned_agent_id,
            template.task_type.as_str(),
            template.title,
            template.priority,
            to_us(template.due_at),
            template.platform,
            template.step_number,
            to_us(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All tasks for a client, oldest first.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn list_tasks(conn: &Connection, client_id: &str) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE client_id = ?1 ORDER BY task_id ASC"
    ))?;
    let rows = stmt.query_map(params![client_id], task_from_row)?;
    rows.collect()
}

/// Open (pending, in progress, or overdue) tasks for a client.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn open_tasks(conn: &Connection, client_id: &str) -> rusqlite::Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE client_id = ?1 AND status IN ('pending', 'in_progress', 'overdue')
         ORDER BY task_id ASC"
    ))?;
    let rows = stmt.query_map(params![client_id], task_from_row)?;
    rows.collect()
}

/// Cancel open tasks for a client, optionally restricted to `task_types`.
///
/// Returns the number of tasks cancelled.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn cancel_open_tasks(
    conn: &Connection,
    client_id: &str,
    task_types: Option<&[TaskType]>,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    let open = TaskStatus::OPEN.map(TaskStatus::as_str);
    match task_types {
        None => conn.execute(
            "UPDATE tasks SET status = 'cancelled', updated_at_us = ?2
             WHERE client_id = ?1 AND status IN (?3, ?4, ?5)",
            params![client_id, to_us(now), open[0], open[1], open[2]],
        ),
        Some(types) => {
            let mut cancelled = 0;
            for task_type in types {
                cancelled += conn.execute(
                    "UPDATE tasks SET status = 'cancelled', updated_at_us = ?2
                     WHERE client_id = ?1 AND task_type = ?6 AND status IN (?3, ?4, ?5)",
                    params![
                        client_id,
                        to_us(now),
                        open[0],
                        open[1],
                        open[2],
                        task_type.as_str()
                    ],
                )?;
            }
            Ok(cancelled)
        }
    }
}

/// Update a single task's status (agent checklist work).
///
/// # Errors
///
/// Returns an error on database failure.
pub fn set_task_status(
    conn: &Connection,
    task_id: i64,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE tasks SET status = ?2, updated_at_us = ?3 WHERE task_id = ?1",
        params![task_id, status.as_str(), to_us(now)],
    )?;
    Ok(changed > 0)
}

/// Flip pending/in-progress tasks due strictly before `now` to overdue.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn mark_overdue_tasks(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tasks SET status = 'overdue', updated_at_us = ?1
         WHERE status IN ('pending', 'in_progress') AND due_at_us < ?1",
        params![to_us(now)],
    )
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

/// Append one audit row and return its id.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn append_audit(conn: &Connection, entry: &NewAuditEntry<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO audit_log (
            entity_type, entity_id, action, old_value, new_value, actor_id,
            metadata_json, created_at_us
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.entity_type,
            entry.entity_id,
            entry.action,
            entry.old_value,
            entry.new_value,
            entry.actor_id,
            entry.metadata.to_string(),
            to_us(entry.at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Audit history for one entity, oldest first.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn audit_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> rusqlite::Result<Vec<AuditEntry>> {
    let mut stmt = conn.prepare(
        "SELECT entry_id, entity_type, entity_id, action, old_value, new_value,
                actor_id, metadata_json, created_at_us
         FROM audit_log
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY entry_id ASC",
    )?;
    let rows = stmt.query_map(params![entity_type, entity_id], |row| {
        let metadata_json: String = row.get(7)?;
        let metadata = serde_json::from_str(&metadata_json).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(err))
        })?;
        Ok(AuditEntry {
            entry_id: row.get(0)?,
            entity_type: row.get(1)?,
            entity_id: row.get(2)?,
            action: row.get(3)?,
            old_value: row.get(4)?,
            new_value: row.get(5)?,
            actor_id: row.get(6)?,
            metadata,
            created_at: from_us(row.get(8)?),
        })
    })?;
    rows.collect()
}

// ---------------------------------------------------------------------------
// Bonus pools
// ---------------------------------------------------------------------------

/// Insert a pending pool unless the client already has one.
///
/// Returns the new pool id, or `None` when the unique `client_id` constraint
/// kept an existing pool in place.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn insert_pool_if_absent(
    conn: &Connection,
    client_id: &str,
    closer_id: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<Option<i64>> {
    let inserted = conn.execute(
        "INSERT INTO bonus_pools (client_id, closer_id, status, created_at_us)
         VALUES (?1, ?2, 'pending', ?3)
         ON CONFLICT(client_id) DO NOTHING",
        params![client_id, closer_id, to_us(now)],
    )?;
    Ok((inserted > 0).then(|| conn.last_insert_rowid()))
}

/// Fetch a pool by id.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn get_pool(conn: &Connection, pool_id: i64) -> rusqlite::Result<Option<BonusPool>> {
    conn.query_row(
        &format!("SELECT {POOL_COLUMNS} FROM bonus_pools WHERE pool_id = ?1"),
        params![pool_id],
        pool_from_row,
    )
    .optional()
}

/// Fetch the pool for a client.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn get_pool_for_client(
    conn: &Connection,
    client_id: &str,
) -> rusqlite::Result<Option<BonusPool>> {
    conn.query_row(
        &format!("SELECT {POOL_COLUMNS} FROM bonus_pools WHERE client_id = ?1"),
        params![client_id],
        pool_from_row,
    )
    .optional()
}

/// Compare-and-swap a pool from `pending` to `distributed`.
///
/// Returns `false` when the pool was no longer pending.
///
/// # Errors
///
/// Returns an error on database failure or when the slice totals violate the
/// table's conservation check.
pub(crate) fn mark_pool_distributed(
    conn: &Connection,
    pool_id: i64,
    distributed_slices: u8,
    recycled_slices: u8,
    walk: &[WalkStep],
    now: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let snapshot = serde_json::to_string(walk)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
    let changed = conn.execute(
        "UPDATE bonus_pools
         SET status = 'distributed',
             distributed_slices = ?2,
             recycled_slices = ?3,
             walk_snapshot_json = ?4,
             distributed_at_us = ?5
         WHERE pool_id = ?1 AND status = 'pending'",
        params![pool_id, distributed_slices, recycled_slices, snapshot, to_us(now)],
    )?;
    Ok(changed > 0)
}

/// Write one allocation line.
///
/// # Errors
///
/// Returns an error on database failure or duplicate `(pool, agent, type)`.
pub(crate) fn insert_allocation(
    conn: &Connection,
    allocation: &BonusAllocation,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bonus_allocations (
            pool_id, agent_id, allocation_type, slices, amount_cents, star_level, created_at_us
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            allocation.pool_id,
            allocation.agent_id,
            allocation.allocation_type.as_str(),
            allocation.slices,
            allocation.amount_cents,
            allocation.star_level,
            to_us(now),
        ],
    )?;
    Ok(())
}

/// Allocation lines of a pool, in insertion order.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn list_allocations(conn: &Connection, pool_id: i64) -> rusqlite::Result<Vec<BonusAllocation>> {
    let mut stmt = conn.prepare(
        "SELECT pool_id, agent_id, allocation_type, slices, amount_cents, star_level
         FROM bonus_allocations
         WHERE pool_id = ?1
         ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![pool_id], |row| {
        let allocation_type: AllocationType = parse_col(row, 2)?;
        Ok(BonusAllocation {
            pool_id: row.get(0)?,
            agent_id: row.get(1)?,
            allocation_type,
            slices: small_int(row, 3)?,
            amount_cents: row.get(4)?,
            star_level: small_int(row, 5)?,
        })
    })?;
    rows.collect()
}

/// Record when the last sweep ran.
///
/// # Errors
///
/// Returns an error on database failure.
pub(crate) fn record_sweep(conn: &Connection, now: DateTime<Utc>) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE store_meta SET last_sweep_at_us = ?1 WHERE id = 1",
        params![to_us(now)],
    )?;
    Ok(())
}

/// When the last sweep ran, if ever.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn last_sweep_at(conn: &Connection) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let us: Option<i64> = conn.query_row(
        "SELECT last_sweep_at_us FROM store_meta WHERE id = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(us.map(from_us))
}
