//! pagescope CLI - watch a live page and summarize what it did.
//!
//! This is the main entry point for the pagescope CLI. It handles command-line
//! argument parsing, logging initialization, and command dispatch.

use clap::Parser;
use miette::Result;
use pagescope_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = cli::Cli::parse();

    // Initialize logging and colors based on global flags
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let globals = cli::GlobalFlags {
        verbose: args.verbose,
        quiet: args.quiet,
    };

    let result = match args.command {
        cli::Command::Watch(watch_args) => commands::watch_execute(watch_args, globals).await,
        cli::Command::Replay(replay_args) => commands::replay_execute(replay_args, globals).await,
        cli::Command::Schema(schema_args) => commands::schema_execute(&schema_args),
    };

    // Convert CLI errors to miette diagnostics for error reporting
    result.map_err(error::cli_error_to_miette)
}
