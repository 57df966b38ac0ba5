//! Command implementations for the pagescope CLI.
//!
//! - [`watch`] - Observe a live page in Chrome
//! - [`replay`] - Feed a recorded event log through the same engine
//! - [`schema`] - Print the configuration JSON Schema
//!
//! Each command provides an `execute` function that takes the parsed command
//! arguments and returns a Result.

mod output;
pub mod replay;
pub mod schema;
pub mod watch;

// Re-export execute functions for convenience
pub use replay::execute as replay_execute;
pub use schema::execute as schema_execute;
pub use watch::execute as watch_execute;
