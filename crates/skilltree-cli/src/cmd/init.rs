use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use skilltree_core::config::{PROJECT_DIR, ProjectPaths};
use skilltree_core::snapshot::Snapshot;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::output::{CliError, OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite `config.toml` with defaults even if `.skilltree/` exists.
    /// Existing skills are kept.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[lock]\n\
    timeout_ms = 5000\n\
    \n\
    [skills]\n\
    default_level = \"Beginner\"\n";

const GITIGNORE: &str = "lock\n*.tmp\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    path: String,
}

/// Execute `sk init`. Creates the project skeleton:
///
/// ```text
/// .skilltree/
///   skills.json   (empty snapshot)
///   config.toml   (default project config)
///   .gitignore    (lock file, temp files)
/// ```
///
/// # Errors
///
/// Returns an error if `.skilltree/` already exists and `--force` is not set,
/// or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let paths = ProjectPaths::new(project_root);

    if paths.dir().exists() && !args.force {
        let err = CliError::new(format!(
            "{PROJECT_DIR}/ already exists. Use `sk init --force` to reset its config."
        ));
        crate::output::render_error(output, &err)?;
        anyhow::bail!("{}", err.message);
    }

    std::fs::create_dir_all(paths.dir()).with_context(|| {
        format!("Failed to create {}", paths.dir().display())
    })?;

    std::fs::write(paths.config(), CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", paths.config().display()))?;

    let gitignore = paths.dir().join(".gitignore");
    std::fs::write(&gitignore, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore.display()))?;

    if !paths.snapshot().exists() {
        Snapshot::default().save(&paths.snapshot())?;
    }

    info!(dir = %paths.dir().display(), "project initialized");

    let result = InitOutput {
        ok: true,
        path: paths.dir().display().to_string(),
    };
    render(output, &result, |_, w| {
        writeln!(w, "✓ Initialized {PROJECT_DIR}/ project structure.")?;
        writeln!(w)?;
        writeln!(w, "  Skills: {PROJECT_DIR}/skills.json")?;
        writeln!(w, "  Config: {PROJECT_DIR}/config.toml")?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  Pick a user (scopes every skill graph):")?;
        writeln!(w, "    export SKILLTREE_USER=your-name")?;
        writeln!(w)?;
        writeln!(w, "  Add your first skill:")?;
        writeln!(w, "    sk add \"Algebra\"")
    })
}
