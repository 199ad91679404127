//! `sk status`: which incomplete skills are ready to start and which are
//! still locked.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::graph::DanglingPrerequisite;
use skilltree_core::{ErrorCode, SkillId, SkillRecord};
use tracing::warn;

use super::{Context, label};
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

#[derive(Debug, Serialize)]
struct StatusOutput {
    unlockable: Vec<SkillId>,
    locked: Vec<SkillId>,
    total: usize,
    completed: usize,
    /// Prerequisite references that resolve to no skill.
    dangling: Vec<DanglingEntry>,
    #[serde(skip)]
    records: Vec<SkillRecord>,
}

/// A dangling reference tagged with its machine code.
#[derive(Debug, Serialize)]
struct DanglingEntry {
    #[serde(flatten)]
    reference: DanglingPrerequisite,
    error_code: &'static str,
}

impl From<DanglingPrerequisite> for DanglingEntry {
    fn from(reference: DanglingPrerequisite) -> Self {
        Self {
            reference,
            error_code: ErrorCode::DanglingPrerequisite.code(),
        }
    }
}

impl StatusOutput {
    fn unmet_of(&self, id: SkillId) -> Vec<String> {
        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return Vec::new();
        };
        record
            .prerequisites
            .iter()
            .filter(|p| !self.records.iter().any(|r| r.id == **p && r.completed))
            .map(|p| label(&self.records, *p))
            .collect()
    }
}

/// Execute `sk status`.
///
/// # Errors
///
/// Fails outside a project or without a user.
pub fn run_status(_args: &StatusArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let store = ctx.read_store(&project)?;

    let status = store.unlock_status(&user);
    let dangling = store.dangling(&user);
    if !dangling.is_empty() {
        warn!(
            count = dangling.len(),
            code = ErrorCode::DanglingPrerequisite.code(),
            "skills reference prerequisites that no longer exist"
        );
    }

    let output = StatusOutput {
        completed: status.completed(),
        unlockable: status.unlockable,
        locked: status.locked,
        total: status.total,
        dangling: dangling.into_iter().map(DanglingEntry::from).collect(),
        records: store.skills(&user),
    };
    render_mode(ctx.output, &output, render_status_text, render_status_pretty)
}

fn render_status_text(out: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "total\t{}", out.total)?;
    writeln!(w, "completed\t{}", out.completed)?;
    for id in &out.unlockable {
        writeln!(w, "unlockable\t{id}")?;
    }
    for id in &out.locked {
        writeln!(w, "locked\t{id}")?;
    }
    for entry in &out.dangling {
        writeln!(
            w,
            "dangling\t{}\t{}\t{}",
            entry.reference.skill, entry.reference.missing, entry.error_code
        )?;
    }
    Ok(())
}

fn render_status_pretty(out: &StatusOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Progress: {}/{} skills completed", out.completed, out.total),
    )?;

    writeln!(w, "Ready to learn ({}):", out.unlockable.len())?;
    for id in &out.unlockable {
        writeln!(w, "  ○ {}", label(&out.records, *id))?;
    }

    writeln!(w)?;
    writeln!(w, "Locked ({}):", out.locked.len())?;
    for id in &out.locked {
        writeln!(
            w,
            "  ⊘ {}  needs: {}",
            label(&out.records, *id),
            out.unmet_of(*id).join(", ")
        )?;
    }

    if !out.dangling.is_empty() {
        writeln!(w)?;
        writeln!(w, "Warnings:")?;
        for entry in &out.dangling {
            writeln!(w, "  ! [{}] {}", entry.error_code, entry.reference)?;
        }
    }
    Ok(())
}
