//! actloop CLI, the main entry point.
//!
//! Commands:
//! - `ask`    Answer one question, optionally streaming or pausing per action
//! - `chat`   Interactive session sharing one conversation log
//! - `graph`  Print the loop as a Graphviz graph
//! - `config` Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "actloop",
    about = "actloop: a minimal Thought, Action, Observation agent loop",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.actloop/config.toml
    #[arg(long, global = true, env = "ACTLOOP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask(commands::ask::AskArgs),

    /// Chat interactively; the log is kept across questions
    Chat {
        /// Load and save the conversation under this thread id
        #[arg(short, long)]
        thread: Option<String>,
    },

    /// Print the agent loop as a Graphviz DOT graph
    Graph {
        /// Mark the pause before each action
        #[arg(long)]
        interrupt: bool,
    },

    /// Show the effective configuration
    Config {
        /// Also check that the completion backend is reachable
        #[arg(long)]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Ask(args) => commands::ask::run(config_path, args).await?,
        Commands::Chat { thread } => commands::chat::run(config_path, thread).await?,
        Commands::Graph { interrupt } => commands::graph::run(interrupt),
        Commands::Config { check } => commands::config_cmd::run(config_path, check).await?,
    }

    Ok(())
}
