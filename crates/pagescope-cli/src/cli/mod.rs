//! Command-line interface definition for pagescope.
//!
//! # Command Structure
//!
//! - `pagescope watch <URL>` - open the page in Chrome and observe it
//! - `pagescope replay <FILE>` - analyze a recorded JSON-lines session
//! - `pagescope schema` - print the configuration JSON Schema

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{Command, ReplayArgs, ReportArgs, SchemaArgs, WatchArgs};
pub use enums::*;
pub use validation::{parse_positive_ms, parse_url, parse_window_size};

/// pagescope - watch a page's console and network and summarize its health
#[derive(Parser, Debug)]
#[command(
    name = "pagescope",
    version,
    about = "Watch a web page's console and network activity and summarize its health",
    long_about = "pagescope opens a page in headless Chrome, records every console message,\n\
                  uncaught exception and network exchange for a fixed window, then prints\n\
                  an ordered transcript plus a summary of failed and stuck requests."
)]
pub struct Cli {
    /// Enable verbose logging (debug level) and live network lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors and the report itself
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Global flags the commands care about after logging is set up.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalFlags {
    /// `--verbose` was given
    pub verbose: bool,
    /// `--quiet` was given
    pub quiet: bool,
}
