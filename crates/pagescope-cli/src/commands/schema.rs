//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::config::PagescopeConfig;
use crate::error::Result;

/// Print the configuration JSON Schema, or an example config with `--example`.
///
/// # Errors
///
/// Only if serialization fails.
pub fn execute(args: &SchemaArgs) -> Result<()> {
    let text = if args.example {
        PagescopeConfig::example_config()?
    } else {
        serde_json::to_string_pretty(&PagescopeConfig::json_schema())?
    };
    println!("{text}");
    Ok(())
}
