//! Ensemble — interactive process supervisor CLI.
//!
//! # Usage
//!
//! ```text
//! ensemble run <modules-dir> [--settle-ms <ms>] [--prompt <text>]
//! ensemble list <modules-dir> [--json]
//! ```
//!
//! Inside `run`, the console accepts `enable <name>`, `disable <name>` and
//! `list`, one per line, until ctrl-c, SIGTERM or end of input.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{list::ListArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ensemble",
    version,
    about = "Discover worker processes in a directory and enable/disable them by name",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every worker in a modules directory and start the operator console.
    Run(RunArgs),

    /// Show the workers a modules directory would provide, without starting any.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    ensemble_console::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::List(args) => args.run(),
    }
}
