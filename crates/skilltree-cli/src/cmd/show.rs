//! `sk show`: one skill with its prerequisites and dependents.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::{SkillId, SkillRecord};

use super::{Context, SkillState, label};
use crate::output::{CliError, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Skill ID (`sk-3` or `3`).
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    #[serde(flatten)]
    record: SkillRecord,
    state: SkillState,
    /// Prerequisites not yet completed, including ones that no longer exist.
    unmet: Vec<SkillId>,
    /// Skills that list this one as a prerequisite.
    dependents: Vec<SkillId>,
    #[serde(skip)]
    labels: Vec<(SkillId, String)>,
}

impl ShowOutput {
    fn label(&self, id: SkillId) -> String {
        self.labels
            .iter()
            .find(|(known, _)| *known == id)
            .map_or_else(|| format!("{id} (missing)"), |(_, label)| label.clone())
    }
}

/// Execute `sk show`.
///
/// # Errors
///
/// Fails outside a project, without a user, or for an unknown id.
pub fn run_show(args: &ShowArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let id = ctx.parse_id(&args.id)?;
    let store = ctx.read_store(&project)?;

    let record = store
        .get(&user, id)
        .map_err(|err| ctx.fail(&CliError::from(&err)))?;
    let records = store.skills(&user);
    let status = store.unlock_status(&user);

    let unmet = record
        .prerequisites
        .iter()
        .copied()
        .filter(|p| !records.iter().any(|r| r.id == *p && r.completed))
        .collect();
    let dependents = records
        .iter()
        .filter(|r| r.requires(id))
        .map(|r| r.id)
        .collect();
    let labels = records.iter().map(|r| (r.id, label(&records, r.id))).collect();

    let output = ShowOutput {
        state: SkillState::of(&status, &record),
        record,
        unmet,
        dependents,
        labels,
    };
    render_mode(ctx.output, &output, render_show_text, render_show_pretty)
}

fn render_show_text(out: &ShowOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let ids = |list: &[SkillId]| {
        list.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };
    writeln!(w, "id\t{}", out.record.id)?;
    writeln!(w, "name\t{}", out.record.name)?;
    writeln!(w, "state\t{}", out.state.as_str())?;
    writeln!(w, "level\t{}", out.record.level)?;
    writeln!(w, "prerequisites\t{}", ids(&out.record.prerequisites))?;
    writeln!(w, "unmet\t{}", ids(&out.unmet))?;
    writeln!(w, "dependents\t{}", ids(&out.dependents))
}

fn render_show_pretty(out: &ShowOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("{} {}", out.state.marker(), out.record.name))?;
    pretty_kv(w, "ID", out.record.id.to_string())?;
    pretty_kv(w, "State", out.state.as_str())?;
    pretty_kv(w, "Level", out.record.level.to_string())?;
    if !out.record.description.is_empty() {
        pretty_kv(w, "Description", &out.record.description)?;
    }
    pretty_kv(w, "Created", out.record.created_at.format("%Y-%m-%d %H:%M").to_string())?;
    pretty_kv(w, "Updated", out.record.updated_at.format("%Y-%m-%d %H:%M").to_string())?;

    writeln!(w)?;
    writeln!(w, "Prerequisites:")?;
    if out.record.prerequisites.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for prereq in &out.record.prerequisites {
        let marker = if out.unmet.contains(prereq) { "⊘" } else { "✓" };
        writeln!(w, "  {marker} {}", out.label(*prereq))?;
    }

    writeln!(w)?;
    writeln!(w, "Unlocks:")?;
    if out.dependents.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for dependent in &out.dependents {
        writeln!(w, "  - {}", out.label(*dependent))?;
    }
    Ok(())
}
