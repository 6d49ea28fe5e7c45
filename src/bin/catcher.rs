//! Catcher CLI - train and study a self-teaching catch agent
//!
//! This CLI provides a unified interface for:
//! - Training the agent on the built-in falling-object simulator
//! - Evaluating a learned table greedily
//! - Inspecting and exporting learned tables

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "catcher")]
#[command(
    version,
    about = "Tabular Q-learning agent that learns to catch falling objects",
    long_about = None
)]
struct Cli {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the built-in simulator, saving the table after every episode
    Train(Box<catcher::cli::commands::train::TrainArgs>),

    /// Run a trained table greedily without learning
    Evaluate(catcher::cli::commands::evaluate::EvaluateArgs),

    /// Summarize a Q-table
    Inspect(catcher::cli::commands::inspect::InspectArgs),

    /// Export a Q-table to CSV
    Export(catcher::cli::commands::export::ExportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    catcher::telemetry::init(cli.verbose)?;

    match cli.command {
        Commands::Train(args) => catcher::cli::commands::train::execute(*args),
        Commands::Evaluate(args) => catcher::cli::commands::evaluate::execute(args),
        Commands::Inspect(args) => catcher::cli::commands::inspect::execute(args),
        Commands::Export(args) => catcher::cli::commands::export::execute(args),
    }
}
