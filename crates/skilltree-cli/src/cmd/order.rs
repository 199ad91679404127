//! `sk order`: a learning order in which prerequisites come first.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::{ErrorCode, GraphError, SkillId};

use super::Context;
use crate::output::{CliError, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct OrderArgs {
    /// Leave completed skills out of the listing. They still constrain the order.
    #[arg(long)]
    pub todo: bool,
}

#[derive(Debug, Serialize)]
struct OrderedSkill {
    id: SkillId,
    name: String,
    completed: bool,
}

#[derive(Debug, Serialize)]
struct OrderOutput {
    order: Vec<OrderedSkill>,
}

/// Execute `sk order`.
///
/// # Errors
///
/// Fails with `E2003` if the stored graph has a cycle; no partial order is
/// printed.
pub fn run_order(args: &OrderArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let store = ctx.read_store(&project)?;

    let ids = match store.topological_order(&user) {
        Ok(ids) => ids,
        Err(err @ GraphError::CycleDetected { .. }) => {
            let mut cli = CliError::coded(err.to_string(), ErrorCode::CycleDetected);
            cli.suggestion = Some(
                "Run `sk cycles` to see the loops, then `sk prereq rm` one link.".to_string(),
            );
            return Err(ctx.fail(&cli));
        }
        Err(err) => return Err(ctx.fail(&CliError::coded(err.to_string(), err.code()))),
    };

    let records = store.skills(&user);
    let order = ids
        .into_iter()
        .filter_map(|id| records.iter().find(|r| r.id == id))
        .filter(|r| !(args.todo && r.completed))
        .map(|r| OrderedSkill {
            id: r.id,
            name: r.name.clone(),
            completed: r.completed,
        })
        .collect();

    render_mode(
        ctx.output,
        &OrderOutput { order },
        |out, w| {
            for skill in &out.order {
                writeln!(w, "{}\t{}", skill.id, skill.name)?;
            }
            Ok(())
        },
        render_order_pretty,
    )
}

fn render_order_pretty(out: &OrderOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.order.is_empty() {
        return writeln!(w, "Nothing to learn.");
    }
    pretty_section(w, "Learning order")?;
    for (index, skill) in out.order.iter().enumerate() {
        let marker = if skill.completed { "✓" } else { " " };
        writeln!(w, "{:>3}. {marker} {} ({})", index + 1, skill.name, skill.id)?;
    }
    Ok(())
}
