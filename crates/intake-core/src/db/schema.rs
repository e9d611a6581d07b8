//! Canonical SQLite schema for the intake store.
//!
//! - `agents` holds the reporting tree as a parent pointer (`supervisor_id`)
//!   with an index on that column serving as the children index
//! - `clients` carries the lifecycle status; only the transition engine
//!   writes `status`
//! - `tasks` and `audit_log` are append-mostly; tasks only flip status
//! - `bonus_pools` / `bonus_allocations` are written once per approved client

/// Migration v1: core tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS agents (
    agent_id TEXT PRIMARY KEY CHECK (length(trim(agent_id)) > 0),
    display_name TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'agent' CHECK (role IN ('agent', 'admin')),
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    star_level INTEGER NOT NULL DEFAULT 0 CHECK (star_level BETWEEN 0 AND 4),
    supervisor_id TEXT REFERENCES agents(agent_id) ON DELETE SET NULL,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    CHECK (supervisor_id IS NULL OR supervisor_id <> agent_id)
);

CREATE TABLE IF NOT EXISTS clients (
    client_id TEXT PRIMARY KEY CHECK (length(trim(client_id)) > 0),
    display_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN (
        'pending', 'phone_issued', 'in_execution', 'execution_delayed',
        'needs_more_info', 'ready_for_approval', 'approved', 'rejected', 'inactive'
    )),
    agent_id TEXT NOT NULL REFERENCES agents(agent_id),
    execution_deadline_us INTEGER,
    status_changed_at_us INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL REFERENCES clients(client_id) ON DELETE CASCADE,
    assigned_agent_id TEXT NOT NULL REFERENCES agents(agent_id),
    task_type TEXT NOT NULL CHECK (task_type IN (
        'verification', 'upload_screenshot', 'execution',
        'provide_info', 'phone_signout', 'phone_return'
    )),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN (
        'pending', 'in_progress', 'completed', 'cancelled', 'overdue'
    )),
    title TEXT NOT NULL,
    priority INTEGER NOT NULL CHECK (priority BETWEEN 1 AND 3),
    due_at_us INTEGER NOT NULL,
    platform TEXT,
    step_number INTEGER,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_log (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    action TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    actor_id TEXT NOT NULL,
    metadata_json TEXT NOT NULL DEFAULT '{}',
    created_at_us INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS audit_log_no_update
BEFORE UPDATE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
BEFORE DELETE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;

CREATE TABLE IF NOT EXISTS bonus_pools (
    pool_id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL UNIQUE REFERENCES clients(client_id),
    closer_id TEXT NOT NULL REFERENCES agents(agent_id),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'distributed')),
    distributed_slices INTEGER NOT NULL DEFAULT 0,
    recycled_slices INTEGER NOT NULL DEFAULT 0,
    walk_snapshot_json TEXT NOT NULL DEFAULT '[]',
    created_at_us INTEGER NOT NULL,
    distributed_at_us INTEGER,
    CHECK (status = 'pending' OR distributed_slices + recycled_slices = 4)
);

CREATE TABLE IF NOT EXISTS bonus_allocations (
    pool_id INTEGER NOT NULL REFERENCES bonus_pools(pool_id) ON DELETE CASCADE,
    agent_id TEXT NOT NULL REFERENCES agents(agent_id),
    allocation_type TEXT NOT NULL CHECK (allocation_type IN ('direct', 'star_slice', 'backfill')),
    slices INTEGER NOT NULL CHECK (slices >= 0),
    amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
    star_level INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (pool_id, agent_id, allocation_type)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_sweep_at_us INTEGER
);

INSERT OR IGNORE INTO store_meta (id, schema_version, last_sweep_at_us)
VALUES (1, 1, NULL);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_agents_supervisor
    ON agents(supervisor_id);

CREATE INDEX IF NOT EXISTS idx_agents_role_active_created
    ON agents(role, is_active, created_at_us);

CREATE INDEX IF NOT EXISTS idx_clients_status_deadline
    ON clients(status, execution_deadline_us);

CREATE INDEX IF NOT EXISTS idx_clients_agent_status
    ON clients(agent_id, status);

CREATE INDEX IF NOT EXISTS idx_tasks_client_status_type
    ON tasks(client_id, status, task_type);

CREATE INDEX IF NOT EXISTS idx_tasks_status_due
    ON tasks(status, due_at_us);

CREATE INDEX IF NOT EXISTS idx_audit_entity_created
    ON audit_log(entity_type, entity_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_bonus_allocations_agent
    ON bonus_allocations(agent_id, pool_id);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the lifecycle, sweep and hierarchy query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_agents_supervisor",
    "idx_agents_role_active_created",
    "idx_clients_status_deadline",
    "idx_clients_agent_status",
    "idx_tasks_client_status_type",
    "idx_tasks_status_due",
    "idx_audit_entity_created",
    "idx_bonus_allocations_agent",
];
