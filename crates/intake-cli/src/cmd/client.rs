//! `intake client`: register clients and inspect their checklist.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use intake_core::IntakeError;
use intake_core::clock::{Clock, SystemClock};
use intake_core::db::query::{self, NewClient};
use intake_core::model::client::Client;
use intake_core::model::task::Task;
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Register a new client in `pending`.
    Add(AddArgs),
    /// Show a client with its tasks.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Client ID.
    pub id: String,

    /// Owning agent ID.
    #[arg(long)]
    pub agent: String,

    /// Display name (defaults to the ID).
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Client ID.
    pub id: String,

    /// Include completed and cancelled tasks.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
struct ClientView {
    client: Client,
    tasks: Vec<Task>,
}

pub fn run_client(command: &ClientCommand, ctx: &Context) -> Result<()> {
    match command {
        ClientCommand::Add(args) => run_add(args, ctx),
        ClientCommand::Show(args) => run_show(args, ctx),
    }
}

fn run_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    if query::get_agent(&conn, &args.agent)?.is_none() {
        return Err(fail(
            ctx.output,
            IntakeError::NotFound {
                entity: "agent",
                id: args.agent.clone(),
            },
        ));
    }

    let row = NewClient {
        client_id: args.id.clone(),
        display_name: args.name.clone().unwrap_or_else(|| args.id.clone()),
        agent_id: args.agent.clone(),
    };
    query::insert_client(&conn, &row, SystemClock.now())
        .with_context(|| format!("insert client '{}'", args.id))?;
    tracing::info!(client_id = %args.id, agent_id = %args.agent, "client added");

    show(&conn, &args.id, false, ctx)
}

fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    show(&conn, &args.id, args.all, ctx)
}

fn show(conn: &rusqlite::Connection, client_id: &str, all: bool, ctx: &Context) -> Result<()> {
    let Some(client) = query::get_client(conn, client_id)? else {
        return Err(fail(
            ctx.output,
            IntakeError::NotFound {
                entity: "client",
                id: client_id.to_string(),
            },
        ));
    };
    let tasks = if all {
        query::list_tasks(conn, client_id)?
    } else {
        query::open_tasks(conn, client_id)?
    };

    let view = ClientView { client, tasks };
    render(ctx.output, &view, |v, w| {
        pretty_kv(w, "client", &v.client.client_id)?;
        pretty_kv(w, "name", &v.client.display_name)?;
        pretty_kv(w, "status", v.client.status.as_str())?;
        pretty_kv(w, "agent", &v.client.agent_id)?;
        pretty_kv(w, "deadline", ts_or_dash(v.client.execution_deadline))?;
        writeln!(w)?;
        pretty_section(w, "Tasks")?;
        if v.tasks.is_empty() {
            writeln!(w, "(none)")?;
        }
        for task in &v.tasks {
            writeln!(
                w,
                "#{:<5} {:<18} {:<11} p{}  due {}  {}",
                task.task_id,
                task.task_type.as_str(),
                task.status.as_str(),
                task.priority,
                task.due_at.format("%Y-%m-%d %H:%M"),
                task.title
            )?;
        }
        Ok(())
    })
}

fn ts_or_dash(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
}
