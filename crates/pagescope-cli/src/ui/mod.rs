//! Terminal UI: status messages, the window spinner, and report rendering.
//!
//! Status messages and the spinner go to stderr. The report itself goes to
//! stdout, either as colored text or as one JSON document.
//!
//! # Examples
//!
//! ```no_run
//! use pagescope_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Launching Chrome...");
//! let spinner = ui::Spinner::new("Observing https://example.com");
//! spinner.finish("Window closed");
//! ```

// Submodules
mod format;
mod messages;
mod report;
mod spinner;

use owo_colors::{OwoColorize, Style};
use std::sync::atomic::{AtomicBool, Ordering};

// Re-exports for convenient access
pub use format::{format_age, format_duration, format_status};
pub use messages::{debug, error, info, success, warning};
pub use report::{network_line, render_json, render_text, JsonReport, RenderOptions};
pub use spinner::Spinner;

static COLORS: AtomicBool = AtomicBool::new(false);

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR environment variables, falls back to
/// terminal capability detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended()
}

/// Initialize color support. `--no-color` always wins.
pub fn init_colors(no_color: bool) {
    set_colors(!no_color && should_use_color());
}

/// Force colors on or off.
pub fn set_colors(enabled: bool) {
    COLORS.store(enabled, Ordering::Relaxed);
}

/// Whether output is currently colored.
pub fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}

/// Applies `style` when colors are enabled.
pub(crate) fn paint(text: impl std::fmt::Display, style: Style) -> String {
    if colors_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}
