//! Scenario runner for ability content.
//!
//! Loads an engine config and content catalog (embedded or from a data
//! directory), plays a scripted scenario against a fresh world and prints the
//! resulting cue timeline and final agent state.
//!
//! Run with: `cargo run -p ability-sim -- <command>`

mod commands;
mod config;
mod dirs;
mod logging;
mod report;
mod runner;

use anyhow::Result;
use clap::Parser;
use commands::{Check, List, Run};

/// Scenario runner for ability content
#[derive(Parser)]
#[command(name = "ability-sim")]
#[command(about = "Play scripted ability scenarios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a scenario and print its timeline
    Run(Run),

    /// List available scenarios and content
    List(List),

    /// Load and link content without running anything
    Check(Check),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for ABILITY_SIM_* variables)
    let _ = dotenvy::dotenv();

    let config = config::SimConfig::from_env();
    let _guard = logging::setup_logging(&config)?;

    let cli = Cli::parse();

    match cli.command {
        Command::Run(cmd) => cmd.execute(&config),
        Command::List(cmd) => cmd.execute(&config),
        Command::Check(cmd) => cmd.execute(&config),
    }
}
