//! intake-core library.
//!
//! Client lifecycle state machine, overdue sweep, supervisor-tree resolution
//! and the star-pool commission engine, backed by a single SQLite store.
//!
//! Entry points:
//!
//! - [`transition::TransitionEngine::transition`]
//! - [`sweep::sweep`]
//! - [`commission::CommissionEngine::create_bonus_pool`]
//! - [`hierarchy::get_agent_hierarchy`] and [`hierarchy::get_team_rollup`]

pub mod calendar;
pub mod clock;
pub mod commission;
pub mod config;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod model;
pub mod notify;
pub mod sweep;
pub mod tasks;
pub mod transition;

/// # Conventions
///
/// - **Errors**: domain operations return [`error::IntakeError`]; setup and
///   config loading use `anyhow::Result`.
/// - **Logging**: use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
/// - **Time**: every operation reads "now" from a [`clock::Clock`]; timestamps
///   are stored as UTC microseconds.
pub use error::{ErrorCode, IntakeError};
