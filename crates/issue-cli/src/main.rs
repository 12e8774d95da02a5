mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    ai::AiSubcommand, card::CardSubcommand, config::ConfigSubcommand, create::CreateArgs,
    issues::IssuesSubcommand,
};
use issue_core::paths::DEFAULT_PORT;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "issue",
    about = "Markdown kanban board and GitHub project-board triage",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .issue/ or .git/)
    #[arg(long, global = true, env = "ISSUE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Board file (default: kanban_file from config, relative to the workspace)
    #[arg(long, global = true)]
    board_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the board file with the default columns
    Init {
        /// Column to create instead of the defaults (repeatable)
        #[arg(long = "column")]
        columns: Vec<String>,
        /// Also write .issue/config.yaml with the built-in defaults
        #[arg(long)]
        with_config: bool,
    },

    /// This week's focus, top todos and column counts
    Dashboard,

    /// Column view of the board
    Board {
        /// Include the Done column
        #[arg(long)]
        all: bool,
    },

    /// Add, move, edit, archive and delete cards
    Card {
        #[command(subcommand)]
        subcommand: CardSubcommand,
    },

    /// Serve the REST API and web UI for the board
    Serve {
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Create a GitHub issue and place it on a project board
    Create(CreateArgs),

    /// Browse and update GitHub issues
    Issues {
        #[command(subcommand)]
        subcommand: IssuesSubcommand,
    },

    /// List labels on a repository
    Labels {
        #[arg(long)]
        repo: Option<String>,
    },

    /// List a board's iterations
    Iterations {
        #[arg(long, default_value = "main")]
        board: String,
    },

    /// List configured project boards
    Boards,

    /// Show or check configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Assistant-backed drafting, questions and backlog analysis
    Ai {
        #[command(subcommand)]
        subcommand: AiSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.workspace.as_deref());
    let result = root::Workspace::open(root, cli.board_file.as_deref())
        .and_then(|ws| dispatch(&ws, cli.command, cli.json));

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn dispatch(ws: &root::Workspace, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Init {
            columns,
            with_config,
        } => cmd::init::run(ws, &columns, with_config, json),
        Commands::Dashboard => cmd::dashboard::run(ws, json),
        Commands::Board { all } => cmd::board::run(ws, all, json),
        Commands::Card { subcommand } => cmd::card::run(ws, subcommand, json),
        Commands::Serve { port, no_open } => cmd::serve::run(ws, port, no_open),
        Commands::Create(args) => cmd::create::run(ws, args, json),
        Commands::Issues { subcommand } => cmd::issues::run(ws, subcommand, json),
        Commands::Labels { repo } => cmd::labels::run(ws, repo.as_deref(), json),
        Commands::Iterations { board } => cmd::iterations::run(ws, &board, json),
        Commands::Boards => cmd::boards::run(ws, json),
        Commands::Config { subcommand } => cmd::config::run(ws, subcommand, json),
        Commands::Ai { subcommand } => cmd::ai::run(ws, subcommand, json),
    }
}
