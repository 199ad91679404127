//! `sk done` and `sk undo`: toggle a skill's completion.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::{SkillId, SkillRecord};
use skilltree_core::store::SkillUpdate;

use super::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Skill ID (`sk-3` or `3`).
    pub id: String,
}

#[derive(Debug, Serialize)]
struct DoneOutput {
    #[serde(flatten)]
    record: SkillRecord,
    /// Skills that became unlockable because of this change.
    unlocked: Vec<SkillId>,
}

/// Execute `sk done` (`completed = true`) or `sk undo` (`completed = false`).
///
/// # Errors
///
/// Fails outside a project, without a user, or for an unknown id.
pub fn run_set_completed(args: &DoneArgs, completed: bool, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let id = ctx.parse_id(&args.id)?;

    let done = ctx.mutate(&project, |store| {
        let before = store.unlock_status(&user);
        let record = store.update_skill(&user, id, SkillUpdate::completed(completed))?;
        let after = store.unlock_status(&user);
        let unlocked: Vec<_> = after
            .unlockable
            .iter()
            .filter(|skill| !before.is_unlockable(**skill))
            .copied()
            .collect();
        Ok(DoneOutput { record, unlocked })
    })?;

    render(ctx.output, &done, |out, w| {
        let r = &out.record;
        if completed {
            writeln!(w, "✓ {} ({}) completed", r.name, r.id)?;
            for skill in &out.unlocked {
                writeln!(w, "  unlocked {skill}")?;
            }
            Ok(())
        } else {
            writeln!(w, "✓ {} ({}) marked incomplete", r.name, r.id)
        }
    })
}
