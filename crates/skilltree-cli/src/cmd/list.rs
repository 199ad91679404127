//! `sk list`: the active user's skills with their unlock state.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::SkillRecord;

use super::{Context, SkillState};
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show skills in this state.
    #[arg(long, value_enum)]
    pub state: Option<SkillState>,
}

#[derive(Debug, Serialize)]
struct ListedSkill {
    #[serde(flatten)]
    record: SkillRecord,
    state: SkillState,
}

/// Execute `sk list`.
///
/// # Errors
///
/// Fails outside a project or without a user.
pub fn run_list(args: &ListArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let store = ctx.read_store(&project)?;

    let status = store.unlock_status(&user);
    let listed: Vec<ListedSkill> = store
        .skills(&user)
        .into_iter()
        .map(|record| ListedSkill {
            state: SkillState::of(&status, &record),
            record,
        })
        .filter(|skill| args.state.is_none_or(|wanted| wanted == skill.state))
        .collect();

    render_mode(ctx.output, &listed, render_list_text, render_list_pretty)
}

#[allow(clippy::ptr_arg)]
fn render_list_text(listed: &Vec<ListedSkill>, w: &mut dyn Write) -> std::io::Result<()> {
    for skill in listed {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            skill.record.id,
            skill.state.as_str(),
            skill.record.level,
            skill.record.name
        )?;
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn render_list_pretty(listed: &Vec<ListedSkill>, w: &mut dyn Write) -> std::io::Result<()> {
    if listed.is_empty() {
        return writeln!(w, "No skills yet. Add one with `sk add <name>`.");
    }

    pretty_section(w, &format!("Skills ({})", listed.len()))?;
    for skill in listed {
        writeln!(
            w,
            "{} {:<8} {:<32} [{}]",
            skill.state.marker(),
            skill.record.id.to_string(),
            skill.record.name,
            skill.record.level
        )?;
    }
    Ok(())
}
