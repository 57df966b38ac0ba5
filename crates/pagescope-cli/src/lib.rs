//! pagescope CLI - observe a web page's console and network activity.
//!
//! This crate wires the capture engine (`pagescope-core`) and the Chrome
//! orchestrator (`pagescope-browser`) into a command-line tool.
//!
//! # Architecture
//!
//! - [`cli`] - Argument definitions (clap derive)
//! - [`config`] - Layered configuration: defaults, file, environment, flags
//! - [`commands`] - `watch`, `replay` and `schema`
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Terminal rendering of transcripts, ledgers and summaries
//!
//! # Example
//!
//! ```rust
//! use pagescope_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     // command implementations...
//!     Ok(())
//! }
//! ```

// Public modules
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

// Re-export commonly used types
pub use error::{CliError, ConfigError, Result, ResultExt};
