//! `sk cycles`: list prerequisite cycles already present in the stored graph.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::SkillRecord;
use skilltree_core::graph::CycleReport;

use super::{Context, label};
use crate::output::render;

/// Arguments for `sk cycles`.
#[derive(Args, Debug, Default)]
pub struct CyclesArgs {}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<CycleReport>,
}

/// Execute `sk cycles`.
///
/// # Errors
///
/// Fails outside a project or without a user.
pub fn run_cycles(_args: &CyclesArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let store = ctx.read_store(&project)?;

    let payload = CyclesOutput {
        cycles: store.cycles(&user),
    };
    let records = store.skills(&user);

    render(ctx.output, &payload, |report, w| {
        render_cycles_human(report, &records, w)
    })
}

fn render_cycles_human(
    payload: &CyclesOutput,
    records: &[SkillRecord],
    w: &mut dyn Write,
) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No prerequisite cycles found.")?;
        return Ok(());
    }

    writeln!(w, "Prerequisite cycles ({})", payload.cycles.len())?;

    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {}: {cycle}", idx + 1)?;
        for id in &cycle.members {
            writeln!(w, "  - {}", label(records, *id))?;
        }
    }

    Ok(())
}
