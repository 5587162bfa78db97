//! # Main Entry Point
//!
//! Parses the CLI, loads settings, installs logging and dispatches to a command handler.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskgrid::application::logging;
use taskgrid::domain::config::Settings;
use taskgrid::interface::commands::{chat, context, tools};

#[derive(Parser, Debug)]
#[command(name = "taskgrid", version, about = "Chat with a model that can edit files in the .taskgrid folder")]
struct Cli {
    /// Working directory; the sandbox is its .taskgrid folder
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Settings file (defaults to .taskgrid/config/taskgrid.yaml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Mirror all log output to the terminal
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one message, or start an interactive session when no message is given
    Chat { message: Option<String> },
    /// Print the file snapshot the model would be grounded with
    Context {
        #[arg(long)]
        max_files: Option<usize>,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print the declared tool schema as JSON
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Resolve the working directory
    let working_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    // 2. Settings and logging
    let settings = Settings::load(cli.settings.as_deref(), &working_dir)?;
    let _guard = logging::init(&settings, &working_dir, cli.verbose)?;

    // 3. Dispatch
    match cli.command {
        Command::Chat { message } => chat::handle_chat(&working_dir, &settings, message).await,
        Command::Context { max_files, max_depth } => {
            context::handle_context(&working_dir, &settings, max_files, max_depth).await
        }
        Command::Tools => tools::handle_tools(),
    }
}
