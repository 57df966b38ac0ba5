//! Logging infrastructure for the pagescope CLI.
//!
//! Logs go to stderr so that stdout stays reserved for the report itself
//! (`--output json` is meant to be piped).
//!
//! # Features
//!
//! - **Verbosity control**: `--verbose` for debug, `--quiet` for errors only
//! - **Color support**: Automatic detection with `--no-color` override
//! - **Environment filters**: Override via `RUST_LOG` environment variable
//!
//! # Example
//!
//! ```rust,no_run
//! use pagescope_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("observation window opened");
//! debug!(url = "https://example.com", "navigating");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used with `--verbose`.
pub const VERBOSE_FILTER: &str =
    "pagescope=debug,pagescope_core=debug,pagescope_browser=debug,pagescope_cli=debug";

/// Filter used with `--quiet`.
pub const QUIET_FILTER: &str = "error";

/// Filter used when neither flag nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str =
    "pagescope=info,pagescope_core=info,pagescope_browser=info,pagescope_cli=info";

/// Builds the filter for the given flags.
///
/// The level is determined in this order:
/// 1. `--verbose`: DEBUG for pagescope crates
/// 2. `--quiet`: ERROR only
/// 3. `RUST_LOG`
/// 4. INFO for pagescope crates
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber with the specified options.
///
/// Call once, before any logging occurs.
///
/// # Examples
///
/// ```rust,no_run
/// use pagescope_cli::logger::init_logger;
///
/// // Debug logging, no colors
/// init_logger(true, false, true);
/// ```
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(build_filter(verbose, quiet), no_color);
}

/// Initialize logger with a custom environment filter.
///
/// # Example
///
/// ```rust,no_run
/// use pagescope_cli::logger::init_logger_with_filter;
/// use tracing_subscriber::EnvFilter;
///
/// let filter = EnvFilter::new("pagescope_browser=trace,chromiumoxide=off");
/// init_logger_with_filter(filter, false);
/// ```
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Check if colored log output should be enabled.
///
/// # Environment Variables
///
/// - `NO_COLOR`: If set, disables colors
/// - `FORCE_COLOR`: If set, forces colors even in non-TTY
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}
