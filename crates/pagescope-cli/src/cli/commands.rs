use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::OutputFormat;
use crate::cli::validation::{parse_positive_ms, parse_url, parse_window_size};

/// Available pagescope subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a page in Chrome and observe it
    ///
    /// Navigates a fresh tab to URL, records console and network activity
    /// for the observation window, then prints the transcript and summary.
    /// Requests still in flight when the window closes are reported, never
    /// waited for.
    Watch(WatchArgs),

    /// Analyze a recorded session
    ///
    /// Reads a JSON-lines recording (one event per line with an `atMs`
    /// offset) and produces the same report `watch` would have.
    Replay(ReplayArgs),

    /// Print the JSON Schema for pagescope.json
    Schema(SchemaArgs),
}

/// Arguments for the watch command
#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Page to observe (http, https, file, data or about URL)
    ///
    /// May be omitted when the config file provides `url`.
    #[arg(value_name = "URL", value_parser = parse_url)]
    pub url: Option<String>,

    /// Observation window in milliseconds [default: 5000]
    #[arg(short = 'w', long = "window", value_name = "MS", value_parser = parse_positive_ms)]
    pub window_ms: Option<u64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Chrome or Chromium executable (auto-detected when omitted)
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<String>,

    /// Browser window size as WIDTHxHEIGHT [default: 1280x800]
    #[arg(long, value_name = "WxH", value_parser = parse_window_size)]
    pub window_size: Option<(u32, u32)>,

    /// Config file (JSON or TOML) [default: ./pagescope.json if present]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Arguments for the replay command
#[derive(Args, Debug, Default)]
pub struct ReplayArgs {
    /// JSON-lines recording to replay
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Length of the replayed window in milliseconds [default: 5000]
    ///
    /// Pending ages are measured at the end of the window, or at the last
    /// recorded event if that is later.
    #[arg(short = 'w', long = "window", value_name = "MS", value_parser = parse_positive_ms)]
    pub window_ms: Option<u64>,

    /// Config file (JSON or TOML) [default: ./pagescope.json if present]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub report: ReportArgs,
}

/// Options shared by everything that prints a report
#[derive(Args, Debug, Default, Clone)]
pub struct ReportArgs {
    /// Maximum rendered length of a console argument, header or body [default: 512]
    #[arg(long, value_name = "CHARS")]
    pub max_value_len: Option<usize>,

    /// Pending requests older than this are reported as stuck [default: 5000]
    #[arg(long = "stale-threshold", value_name = "MS", value_parser = parse_positive_ms)]
    pub stale_threshold_ms: Option<u64>,

    /// Responses at or above this status count as failures [default: 400]
    #[arg(long = "failure-status", value_name = "STATUS")]
    pub failure_status_min: Option<u16>,

    /// Successful responses below this status count as clean [default: 300]
    #[arg(long = "clean-status", value_name = "STATUS")]
    pub clean_status_max: Option<u16>,

    /// Include request and response headers in the network listing
    #[arg(long)]
    pub show_headers: bool,

    /// Include request bodies in the network listing
    #[arg(long)]
    pub show_bodies: bool,

    /// Report format
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,
}

/// Arguments for the schema command
#[derive(Args, Debug, Default)]
pub struct SchemaArgs {
    /// Print an example pagescope.json instead of the schema
    #[arg(long)]
    pub example: bool,
}
