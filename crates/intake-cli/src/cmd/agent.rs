//! `intake agent`: register agents and maintain the reporting tree.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, render};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use intake_core::IntakeError;
use intake_core::clock::{Clock, SystemClock};
use intake_core::db::query::{self, NewAgent};
use intake_core::model::agent::{AgentRole, MAX_STAR_LEVEL};

#[derive(Subcommand, Debug)]
pub enum AgentCommand {
    /// Register a new agent.
    Add(AddArgs),
    /// Mark an agent inactive; it drops out of subordinate trees.
    Deactivate(IdArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Agent ID.
    pub id: String,

    /// Display name (defaults to the ID).
    #[arg(long)]
    pub name: Option<String>,

    /// Role: agent or admin.
    #[arg(long, default_value = "agent")]
    pub role: AgentRole,

    /// Initial star level (0-4).
    #[arg(long, default_value_t = 0)]
    pub star: u8,

    /// Supervisor agent ID.
    #[arg(long)]
    pub supervisor: Option<String>,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Agent ID.
    pub id: String,
}

pub fn run_agent(command: &AgentCommand, ctx: &Context) -> Result<()> {
    match command {
        AgentCommand::Add(args) => run_add(args, ctx),
        AgentCommand::Deactivate(args) => run_deactivate(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    if args.star > MAX_STAR_LEVEL {
        return Err(fail(
            ctx.output,
            IntakeError::Validation(format!("star level must be 0-{MAX_STAR_LEVEL}")),
        ));
    }
    let conn = ctx.open_store()?;

    let mut row = NewAgent::new(&args.id, args.name.as_deref().unwrap_or(&args.id))
        .role(args.role)
        .star_level(args.star);
    if let Some(sup) = &args.supervisor {
        if query::get_agent(&conn, sup)?.is_none() {
            return Err(fail(
                ctx.output,
                IntakeError::NotFound {
                    entity: "agent",
                    id: sup.clone(),
                },
            ));
        }
        row = row.supervisor(sup);
    }
    query::insert_agent(&conn, &row, SystemClock.now())
        .with_context(|| format!("insert agent '{}'", args.id))?;

    let agent = query::get_agent(&conn, &args.id)?
        .ok_or_else(|| anyhow::anyhow!("agent '{}' vanished after insert", args.id))?;
    tracing::info!(agent_id = %agent.agent_id, role = %agent.role, "agent added");

    render(ctx.output, &agent, |a, w| {
        pretty_kv(w, "agent", &a.agent_id)?;
        pretty_kv(w, "name", &a.display_name)?;
        pretty_kv(w, "role", a.role.to_string())?;
        pretty_kv(w, "tier", format!("{} ({}★)", a.tier(), a.star_level))?;
        pretty_kv(w, "supervisor", a.supervisor_id.as_deref().unwrap_or("-"))
    })
}

fn run_deactivate(args: &IdArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    if !query::set_agent_active(&conn, &args.id, false, SystemClock.now())? {
        return Err(fail(
            ctx.output,
            IntakeError::NotFound {
                entity: "agent",
                id: args.id.clone(),
            },
        ));
    }
    let payload = serde_json::json!({ "agent_id": args.id, "is_active": false });
    render(ctx.output, &payload, |_, w| {
        writeln!(w, "✓ agent {} deactivated", args.id)
    })
}
