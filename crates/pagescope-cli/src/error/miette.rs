//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ConfigError};
use miette::Report;
use pagescope_browser::BrowserError;

/// Convert a `CliError` into a miette report for final display.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::Browser(e) => browser_error_to_miette(e),
        CliError::Recording(e) => miette::miette!(
            help = "Each line must be a JSON object with `atMs` and `event`; offsets must not decrease",
            "Could not read recording: {}",
            e
        ),
        other => miette::miette!("{}", other),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::InvalidValue { field, value, hint } => miette::miette!(
            code = "pagescope::config",
            help = hint,
            "Invalid value for '{}': {}",
            field,
            value
        ),
        ConfigError::MissingField { field, hint } => miette::miette!(
            code = "pagescope::config",
            help = hint,
            "Missing required field: {}",
            field
        ),
        other => miette::miette!("Configuration error: {}", other),
    }
}

fn browser_error_to_miette(err: BrowserError) -> Report {
    match err {
        BrowserError::LaunchFailed { .. } => miette::miette!(
            help = "Install Chrome or Chromium, or point --chrome-path / chromePath at the executable",
            "{}",
            err
        ),
        other => miette::miette!("{}", other),
    }
}
