//! Spinner shown while an observation window is open.

use super::paint;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::Style;
use std::time::Duration;

/// Spinner for the observation window.
///
/// Draws to stderr and hides itself when stderr is not a terminal.
///
/// # Examples
///
/// ```no_run
/// use pagescope_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Observing https://example.com (5.00s)");
/// // window runs...
/// spinner.finish("Window closed");
/// ```
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create and start a new spinner.
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒", "●"]);
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that never draws, for `--quiet`.
    pub fn hidden() -> Self {
        Self { pb: ProgressBar::hidden() }
    }

    /// Print a line above the spinner without tearing it.
    pub fn println(&self, line: &str) {
        if self.pb.is_hidden() {
            eprintln!("{line}");
        } else {
            self.pb.println(line);
        }
    }

    /// Finish spinner with success message.
    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", paint("✓", Style::new().green()), message));
    }

    /// Finish spinner with error message.
    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", paint("✗", Style::new().red()), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_spinner_lifecycle() {
        let spinner = Spinner::hidden();
        spinner.println("GET https://a.test/ 200");
        spinner.finish("done");
    }

    #[test]
    fn test_spinner_fail() {
        let spinner = Spinner::new("working");
        spinner.fail("boom");
    }
}
