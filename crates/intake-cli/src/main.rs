#![forbid(unsafe_code)]

mod actor;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::Context;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "intake: client lifecycle and commission back-office",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Store path (overrides `store.path` from `.intake/config.toml`).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Acting identity recorded in the audit log (overrides INTAKE_ACTOR).
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize an intake project",
        after_help = "EXAMPLES:\n    # Create .intake/ with config and store\n    intake init"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Setup", about = "Manage agents")]
    Agent {
        #[command(subcommand)]
        command: cmd::agent::AgentCommand,
    },

    #[command(next_help_heading = "Setup", about = "Manage clients")]
    Client {
        #[command(subcommand)]
        command: cmd::client::ClientCommand,
    },

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a client to a new status",
        after_help = "EXAMPLES:\n    # Start execution with a 5 business-day deadline\n    intake transition c-100 in_execution --deadline-days 5\n\n    # Reject with a reason\n    intake transition c-100 rejected --reason \"duplicate identity\""
    )]
    Transition(cmd::transition::TransitionArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Delay every client past its execution deadline"
    )]
    Sweep,

    #[command(next_help_heading = "Commission", about = "Create or distribute bonus pools")]
    Pool {
        #[command(subcommand)]
        command: cmd::pool::PoolCommand,
    },

    #[command(next_help_heading = "Commission", about = "Star level maintenance")]
    Star {
        #[command(subcommand)]
        command: cmd::star::StarCommand,
    },

    #[command(
        next_help_heading = "Org chart",
        about = "Show an agent's supervisor chain and team"
    )]
    Hierarchy(cmd::hierarchy::AgentArgs),

    #[command(
        next_help_heading = "Org chart",
        about = "Aggregate client counts across an agent's downline"
    )]
    Rollup(cmd::hierarchy::AgentArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("INTAKE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "intake=debug,intake_core=debug,info"
        } else {
            "intake=info,intake_core=info,warn"
        })
    });

    let format = env::var("INTAKE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;
    let ctx = Context::load(
        &project_root,
        cli.db.as_deref(),
        cli.output_mode(),
        cli.actor.clone(),
    )?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &ctx),
        Commands::Agent { command } => cmd::agent::run_agent(command, &ctx),
        Commands::Client { command } => cmd::client::run_client(command, &ctx),
        Commands::Transition(args) => cmd::transition::run_transition(args, &ctx),
        Commands::Sweep => cmd::sweep::run_sweep(&ctx),
        Commands::Pool { command } => cmd::pool::run_pool(command, &ctx),
        Commands::Star { command } => cmd::star::run_star(command, &ctx),
        Commands::Hierarchy(args) => cmd::hierarchy::run_hierarchy(args, &ctx),
        Commands::Rollup(args) => cmd::hierarchy::run_rollup(args, &ctx),
    }
}
