//! Formatting utilities for durations and statuses.

use pagescope_core::{Outcome, ResponseStatus};
use std::time::Duration;

/// Format duration in human-readable format.
///
/// Converts to the most appropriate unit (ms, s, m:s).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pagescope_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Formats a signed millisecond count, clamping negatives (clock skew) to zero.
///
/// ```
/// use pagescope_cli::ui::format_age;
///
/// assert_eq!(format_age(6_000), "6.00s");
/// assert_eq!(format_age(-3), "0ms");
/// ```
pub fn format_age(ms: i64) -> String {
    format_duration(Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
}

/// Short status label for an outcome: the code, the failure reason, or
/// `pending`.
pub fn format_status(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Pending => "pending".to_string(),
        Outcome::Completed { status: ResponseStatus::Code(code), .. } => code.to_string(),
        Outcome::Completed { status: ResponseStatus::Label(label), .. } => label.clone(),
        Outcome::Failed { reason } => format!("failed ({reason})"),
    }
}
