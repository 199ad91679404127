#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use skilltree_core::config::{UserConfig, load_user_config};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sk: per-user skill trees with prerequisite ordering",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides FORMAT and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act on this user's skills (overrides SKILLTREE_USER).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Project",
        about = "Initialize a skilltree project",
        long_about = "Create .skilltree/ with an empty skill snapshot and default config in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    sk init\n\n    # Reset config.toml to defaults, keeping skills\n    sk init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Skills",
        about = "Add a skill",
        long_about = "Create a new skill for the active user. New skills start incomplete with no prerequisites.",
        after_help = "EXAMPLES:\n    # Add a skill\n    sk add \"Linear Algebra\"\n\n    # With description and level\n    sk add \"Calculus\" -d \"Limits and derivatives\" --level intermediate\n\n    # Emit machine-readable output\n    sk add \"Topology\" --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Read",
        about = "List skills",
        long_about = "List the active user's skills with their state: completed, unlockable, or locked.",
        after_help = "EXAMPLES:\n    # List every skill\n    sk list\n\n    # Only skills ready to start\n    sk list --state unlockable\n\n    # Emit machine-readable output\n    sk list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one skill",
        long_about = "Show a skill's details, its prerequisites (marking unmet ones), and the skills it unlocks.",
        after_help = "EXAMPLES:\n    # Show a skill\n    sk show sk-3\n\n    # Bare numbers work too\n    sk show 3 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Skills",
        about = "Mark a skill completed",
        long_about = "Mark a skill completed and report any skills it unlocks.",
        after_help = "EXAMPLES:\n    # Complete a skill\n    sk done sk-1"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        next_help_heading = "Skills",
        about = "Mark a skill incomplete",
        long_about = "Clear a skill's completed flag. Skills that depend on it become locked again.",
        after_help = "EXAMPLES:\n    # Reopen a skill\n    sk undo sk-1"
    )]
    Undo(cmd::done::DoneArgs),

    #[command(
        next_help_heading = "Skills",
        about = "Edit a skill",
        long_about = "Change a skill's name, description, or level.",
        after_help = "EXAMPLES:\n    # Rename\n    sk edit sk-2 --name \"Differential Calculus\"\n\n    # Change level\n    sk edit sk-2 --level advanced"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Skills",
        about = "Delete a skill",
        long_about = "Delete a skill. It is removed from every other skill's prerequisites first.",
        after_help = "EXAMPLES:\n    # Delete a skill\n    sk rm sk-4"
    )]
    Rm(cmd::rm::RmArgs),

    #[command(
        next_help_heading = "Graph",
        about = "Manage prerequisite links",
        long_about = "Add or remove prerequisite links. Links that would create a cycle are rejected."
    )]
    Prereq(cmd::prereq::PrereqArgs),

    #[command(
        next_help_heading = "Graph",
        about = "Show a learning order",
        long_about = "Print every skill in an order where each prerequisite comes before the skills that need it.",
        after_help = "EXAMPLES:\n    # Full learning order\n    sk order\n\n    # Hide completed skills\n    sk order --todo\n\n    # Emit machine-readable output\n    sk order --json"
    )]
    Order(cmd::order::OrderArgs),

    #[command(
        next_help_heading = "Graph",
        about = "Show unlock status",
        long_about = "Split incomplete skills into those ready to start and those still locked by unmet prerequisites.",
        after_help = "EXAMPLES:\n    # What can I learn next?\n    sk status\n\n    # Emit machine-readable output\n    sk status --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Graph",
        about = "List prerequisite cycles",
        long_about = "Report strongly connected groups of skills that block each other, e.g. in a hand-edited snapshot.",
        after_help = "EXAMPLES:\n    # Check the stored graph\n    sk cycles"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Project",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    sk completions bash\n\n    # Generate zsh completions\n    sk completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SKILLTREE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "skilltree=debug,info"
        } else {
            "skilltree=info,warn"
        })
    });

    let format = env::var("SKILLTREE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = load_user_config().unwrap_or_else(|err| {
        warn!("ignoring unreadable user config: {err:#}");
        UserConfig::default()
    });
    let output = output::resolve_output_mode(cli.format, cli.json, user_config.output.as_deref());

    let project_root = env::current_dir()?;
    let ctx = cmd::Context {
        output,
        project_root: &project_root,
        user_flag: cli.user.as_deref(),
        user_config: &user_config,
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Add(args) => cmd::add::run_add(args, &ctx),
        Commands::List(args) => cmd::list::run_list(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Done(args) => cmd::done::run_set_completed(args, true, &ctx),
        Commands::Undo(args) => cmd::done::run_set_completed(args, false, &ctx),
        Commands::Edit(args) => cmd::edit::run_edit(args, &ctx),
        Commands::Rm(args) => cmd::rm::run_rm(args, &ctx),
        Commands::Prereq(args) => cmd::prereq::run_prereq(args, &ctx),
        Commands::Order(args) => cmd::order::run_order(args, &ctx),
        Commands::Status(args) => cmd::status::run_status(args, &ctx),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, &ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
