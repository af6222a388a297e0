//! Codesmith CLI — the main entry point.
//!
//! Commands:
//! - `init`   — Write the default configuration scaffold
//! - `serve`  — Start the session server
//! - `run`    — Drive one local session to completion
//! - `status` — Show configuration and provider state

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "codesmith",
    about = "Codesmith — a coding-agent runtime with a session server",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration to ~/.codesmith/config.toml
    Init,

    /// Start the HTTP session server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single task against a workspace, without the server
    Run {
        /// The workspace directory
        #[arg(short, long)]
        workspace: PathBuf,

        /// The natural-language task
        #[arg(short, long)]
        task: String,

        /// Override the step budget
        #[arg(long)]
        max_steps: Option<u32>,
    },

    /// Show configuration and provider state
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run()?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Run {
            workspace,
            task,
            max_steps,
        } => commands::run::run(workspace, task, max_steps).await?,
        Commands::Status => commands::status::run()?,
    }

    Ok(())
}
