//! `intake pool`: open and distribute bonus pools.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};
use anyhow::Result;
use clap::{Args, Subcommand};
use intake_core::commission::CommissionEngine;
use intake_core::db::query;
use intake_core::model::bonus::{BonusAllocation, BonusPool};
use serde::Serialize;

#[derive(Subcommand, Debug)]
pub enum PoolCommand {
    /// Create (and distribute) the bonus pool of an approved client.
    Create(CreateArgs),
    /// Retry distribution of a pending pool.
    Distribute(DistributeArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Client ID.
    pub client: String,
}

#[derive(Args, Debug)]
pub struct DistributeArgs {
    /// Pool ID.
    pub pool_id: i64,
}

#[derive(Debug, Serialize)]
struct PoolView {
    pool: BonusPool,
    allocations: Vec<BonusAllocation>,
}

pub fn run_pool(command: &PoolCommand, ctx: &Context) -> Result<()> {
    let actor = ctx.require_actor()?;
    let conn = ctx.open_store()?;
    let engine = CommissionEngine::new(&conn).with_actor(&actor);

    let pool = match command {
        PoolCommand::Create(args) => engine.create_bonus_pool(&args.client),
        PoolCommand::Distribute(args) => engine.distribute_star_pool(args.pool_id),
    }
    .map_err(|e| fail(ctx.output, e))?;

    let allocations = query::list_allocations(&conn, pool.pool_id)?;
    let view = PoolView { pool, allocations };

    render(ctx.output, &view, |v, w| {
        pretty_kv(w, "pool", v.pool.pool_id.to_string())?;
        pretty_kv(w, "client", &v.pool.client_id)?;
        pretty_kv(w, "closer", &v.pool.closer_id)?;
        pretty_kv(w, "status", v.pool.status.as_str())?;
        pretty_kv(
            w,
            "slices",
            format!(
                "{} distributed, {} recycled",
                v.pool.distributed_slices, v.pool.recycled_slices
            ),
        )?;
        writeln!(w)?;
        pretty_section(w, "Allocations")?;
        for line in &v.allocations {
            writeln!(
                w,
                "{:<16} {:<10} {} slice(s) ${}.{:02}  ({}★)",
                line.agent_id,
                line.allocation_type.as_str(),
                line.slices,
                line.amount_cents / 100,
                line.amount_cents % 100,
                line.star_level
            )?;
        }
        Ok(())
    })
}
