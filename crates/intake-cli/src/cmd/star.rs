use crate::cmd::Context;
use crate::output::{fail, render};
use anyhow::Result;
use clap::{Args, Subcommand};
use intake_core::commission::CommissionEngine;

#[derive(Subcommand, Debug)]
pub enum StarCommand {
    /// Recompute an agent's star level from approved clients.
    Recalc(RecalcArgs),
}

#[derive(Args, Debug)]
pub struct RecalcArgs {
    /// Agent ID.
    pub agent: String,
}

pub fn run_star(command: &StarCommand, ctx: &Context) -> Result<()> {
    let StarCommand::Recalc(args) = command;
    let actor = ctx.require_actor()?;
    let conn = ctx.open_store()?;

    let change = CommissionEngine::new(&conn)
        .with_actor(&actor)
        .recalculate_star_level(&args.agent)
        .map_err(|e| fail(ctx.output, e))?;

    render(ctx.output, &change, |c, w| {
        if c.changed() {
            writeln!(
                w,
                "✓ {}: {}★ -> {}★ ({}, {} approved)",
                c.agent_id, c.previous_star_level, c.star_level, c.tier, c.approved_clients
            )
        } else {
            writeln!(
                w,
                "{}: unchanged at {}★ ({}, {} approved)",
                c.agent_id, c.star_level, c.tier, c.approved_clients
            )
        }
    })
}
