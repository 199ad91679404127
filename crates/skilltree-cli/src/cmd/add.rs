//! `sk add`: create a skill for the active user.

use std::io::Write;

use clap::Args;
use skilltree_core::Level;
use skilltree_core::store::NewSkill;

use super::Context;
use crate::output::{pretty_kv, render_mode};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Skill name (unique per user).
    pub name: String,

    /// Longer description.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Proficiency level: beginner, intermediate, or advanced.
    /// Defaults to `[skills] default_level` from the project config.
    #[arg(short, long)]
    pub level: Option<Level>,
}

/// Execute `sk add`.
///
/// # Errors
///
/// Fails outside a project, without a user, or on a duplicate or empty name.
pub fn run_add(args: &AddArgs, ctx: &Context<'_>) -> anyhow::Result<()> {
    let project = ctx.project()?;
    let user = ctx.require_user()?;

    let new = NewSkill {
        name: args.name.clone(),
        description: args.description.clone(),
        level: args.level.unwrap_or(project.config.skills.default_level),
    };
    let record = ctx.mutate(&project, |store| store.create_skill(&user, new))?;

    render_mode(
        ctx.output,
        &record,
        |r, w| writeln!(w, "{}\t{}", r.id, r.name),
        |r, w| {
            writeln!(w, "✓ Added {} ({})", r.name, r.id)?;
            pretty_kv(w, "Level", r.level.to_string())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: AddArgs,
    }

    #[test]
    fn parses_name_and_level() {
        let parsed = Wrapper::parse_from(["test", "Calculus", "--level", "advanced"]);
        assert_eq!(parsed.args.name, "Calculus");
        assert_eq!(parsed.args.level, Some(Level::Advanced));
        assert!(parsed.args.description.is_empty());
    }

    #[test]
    fn level_is_optional() {
        let parsed = Wrapper::parse_from(["test", "Algebra", "-d", "Linear equations"]);
        assert_eq!(parsed.args.level, None);
        assert_eq!(parsed.args.description, "Linear equations");
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(Wrapper::try_parse_from(["test", "Algebra", "--level", "guru"]).is_err());
    }
}
