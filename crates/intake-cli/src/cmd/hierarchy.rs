//! `intake hierarchy` and `intake rollup`: read-only org chart views.

use crate::cmd::Context;
use crate::output::{fail, pretty_kv, pretty_section, render};
use anyhow::Result;
use clap::Args;
use intake_core::hierarchy::{self, SubordinateNode};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct AgentArgs {
    /// Agent ID.
    pub agent: String,
}

pub fn run_hierarchy(args: &AgentArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let view = hierarchy::get_agent_hierarchy(&conn, &args.agent).map_err(|e| fail(ctx.output, e))?;

    render(ctx.output, &view, |v, w| {
        pretty_kv(w, "agent", &v.agent.agent_id)?;
        pretty_kv(w, "tier", format!("{} ({}★)", v.agent.tier(), v.agent.star_level))?;
        let chain: Vec<&str> = v
            .supervisor_chain
            .iter()
            .map(|a| a.agent_id.as_str())
            .collect();
        pretty_kv(
            w,
            "reports to",
            if chain.is_empty() {
                "-".to_string()
            } else {
                chain.join(" -> ")
            },
        )?;
        pretty_kv(w, "team size", v.team_size.to_string())?;
        writeln!(w)?;
        pretty_section(w, "Team")?;
        write_tree(w, &v.subordinate_tree, 0)
    })
}

fn write_tree(w: &mut dyn Write, node: &SubordinateNode, depth: usize) -> io::Result<()> {
    writeln!(
        w,
        "{:indent$}{} ({}★)",
        "",
        node.agent.agent_id,
        node.agent.star_level,
        indent = depth * 2
    )?;
    for child in &node.children {
        write_tree(w, child, depth + 1)?;
    }
    Ok(())
}

pub fn run_rollup(args: &AgentArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let rollup = hierarchy::get_team_rollup(&conn, &args.agent).map_err(|e| fail(ctx.output, e))?;

    render(ctx.output, &rollup, |r, w| {
        pretty_kv(w, "agent", &r.agent_id)?;
        pretty_kv(w, "members", r.member_count.to_string())?;
        pretty_kv(w, "clients", r.total_clients.to_string())?;
        pretty_kv(w, "approved", r.approved_clients.to_string())?;
        writeln!(w)?;
        pretty_section(w, "By status")?;
        for (status, count) in &r.clients_by_status {
            writeln!(w, "{:<20} {count}", status.as_str())?;
        }
        writeln!(w)?;
        pretty_section(w, "By tier")?;
        for (tier, count) in &r.members_by_tier {
            writeln!(w, "{:<20} {count}", tier.as_str())?;
        }
        Ok(())
    })
}
