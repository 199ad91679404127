//! `sk rm`: delete a skill and detach it from every dependent.

use std::io::Write;

use clap::Args;
use serde::Serialize;
use skilltree_core::SkillId;

use super::Context;
use crate::output::render;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Skill ID (`sk-3` or `3`).
    pub id: String,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    ok: bool,
    id: SkillId,
    name: String,
    /// Skills that listed the deleted one as a prerequisite.
    detached: Vec<SkillId>,
}

/// Execute `sk rm`.
///
/// # Errors
///
/// Fails outside a project, without a user, or for an unknown id.
pub fn run_rm(args: &RmArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let id = ctx.parse_id(&args.id)?;

    let result = ctx.mutate(&project, |store| {
        let detached = store
            .skills(&user)
            .iter()
            .filter(|r| r.requires(id))
            .map(|r| r.id)
            .collect();
        let removed = store.delete_skill(&user, id)?;
        Ok(RmOutput {
            ok: true,
            id: removed.id,
            name: removed.name,
            detached,
        })
    })?;

    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ Deleted {} ({})", r.name, r.id)?;
        if !r.detached.is_empty() {
            let ids: Vec<String> = r.detached.iter().map(ToString::to_string).collect();
            writeln!(w, "  no longer required by: {}", ids.join(", "))?;
        }
        Ok(())
    })
}
