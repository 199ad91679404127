//! `sk edit`: change a skill's name, description, or level.

use std::io::Write;

use clap::Args;
use skilltree_core::Level;
use skilltree_core::store::SkillUpdate;

use super::Context;
use crate::output::{CliError, render};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Skill ID (`sk-3` or `3`).
    pub id: String,

    /// New name (unique per user).
    #[arg(short, long)]
    pub name: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New level: beginner, intermediate, or advanced.
    #[arg(short, long)]
    pub level: Option<Level>,
}

impl EditArgs {
    const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.level.is_none()
    }
}

/// Execute `sk edit`.
///
/// # Errors
///
/// Fails when no field is given, for an unknown id, or on a name clash.
pub fn run_edit(args: &EditArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    if args.is_empty() {
        return Err(ctx.fail(&CliError::new(
            "nothing to change: pass --name, --description, or --level",
        )));
    }

    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let id = ctx.parse_id(&args.id)?;

    let update = SkillUpdate {
        name: args.name.clone(),
        description: args.description.clone(),
        level: args.level,
        completed: None,
    };
    let record = ctx.mutate(&project, |store| store.update_skill(&user, id, update))?;

    render(ctx.output, &record, |r, w| {
        writeln!(w, "✓ Updated {} ({}) [{}]", r.name, r.id, r.level)
    })
}
