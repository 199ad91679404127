//! `sk prereq`: manage prerequisite links between skills.
//!
//! Subcommands:
//! - `sk prereq add <skill> <prereq>`: `<prereq>` must be completed before `<skill>` unlocks
//! - `sk prereq rm <skill> <prereq>`: drop that requirement

use std::io::Write;

use clap::{Args, Subcommand};
use serde::Serialize;
use skilltree_core::SkillId;

use super::Context;
use crate::output::render;

// ---------------------------------------------------------------------------
// Clap types
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct PrereqArgs {
    #[command(subcommand)]
    pub command: PrereqCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrereqCommand {
    #[command(
        about = "Require one skill before another",
        after_help = "EXAMPLES:\n    # Algebra (sk-1) must be completed before Calculus (sk-2)\n    sk prereq add sk-2 sk-1"
    )]
    Add(PrereqLinkArgs),

    #[command(
        about = "Remove a prerequisite link",
        after_help = "EXAMPLES:\n    # Calculus no longer requires Algebra\n    sk prereq rm sk-2 sk-1"
    )]
    Rm(PrereqLinkArgs),
}

#[derive(Args, Debug)]
pub struct PrereqLinkArgs {
    /// The skill that requires the prerequisite.
    pub skill: String,

    /// The prerequisite skill.
    pub prereq: String,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PrereqOutput {
    ok: bool,
    skill: SkillId,
    prereq: SkillId,
    /// The skill's prerequisites after the change.
    prerequisites: Vec<SkillId>,
}

// ---------------------------------------------------------------------------
// Command runners
// ---------------------------------------------------------------------------

/// Execute `sk prereq`.
///
/// # Errors
///
/// See [`run_prereq_add`] and [`run_prereq_rm`].
pub fn run_prereq(args: &PrereqArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    match &args.command {
        PrereqCommand::Add(a) => run_prereq_add(a, ctx),
        PrereqCommand::Rm(a) => run_prereq_rm(a, ctx),
    }
}

/// Add a prerequisite edge after running the cycle guard under the lock.
///
/// # Errors
///
/// Self-loop (`E2002`), unknown skill (`E2001`), duplicate link (`E2004`),
/// or a link that would close a cycle (`E2003`).
pub fn run_prereq_add(args: &PrereqLinkArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let skill = ctx.parse_id(&args.skill)?;
    let prereq = ctx.parse_id(&args.prereq)?;

    let record = ctx.mutate(&project, |store| store.add_prerequisite(&user, skill, prereq))?;

    let result = PrereqOutput {
        ok: true,
        skill,
        prereq,
        prerequisites: record.prerequisites,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ {} now requires {}", r.skill, r.prereq)
    })
}

/// Remove a prerequisite edge. Removing a link that does not exist succeeds.
///
/// # Errors
///
/// Unknown skill (`E2001`).
pub fn run_prereq_rm(args: &PrereqLinkArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;
    let skill = ctx.parse_id(&args.skill)?;
    let prereq = ctx.parse_id(&args.prereq)?;

    let record = ctx.mutate(&project, |store| {
        store.remove_prerequisite(&user, skill, prereq)
    })?;

    let result = PrereqOutput {
        ok: true,
        skill,
        prereq,
        prerequisites: record.prerequisites,
    };
    render(ctx.output, &result, |r, w| {
        writeln!(w, "✓ {} no longer requires {}", r.skill, r.prereq)
    })
}
