//! Replay command implementation.
//!
//! Reads a JSON-lines recording, feeds it to a session on a manual clock that
//! starts at the Unix epoch, and renders the result exactly like `watch`.

use super::output;
use crate::cli::{GlobalFlags, ReplayArgs};
use crate::config::{ConfigOverrides, PagescopeConfig};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use chrono::{TimeZone, Utc};
use pagescope_core::replay::{parse_recording, replay};
use pagescope_core::{ManualClock, Session};
use tracing::debug;

/// Execute the replay command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a missing recording, or a
/// recording line that does not decode.
pub async fn execute(args: ReplayArgs, globals: GlobalFlags) -> Result<()> {
    let config = PagescopeConfig::load(args.config.as_deref(), &ConfigOverrides::from(&args))?;

    let input = tokio::fs::read_to_string(&args.file).await.with_path(&args.file)?;
    let lines = parse_recording(&input)?;
    debug!(events = lines.len(), file = %args.file.display(), "Loaded recording");

    if globals.verbose {
        ui::info(&format!(
            "Replaying {} events from {} over {}",
            lines.len(),
            args.file.display(),
            ui::format_duration(config.window())
        ));
    }

    let start = Utc
        .timestamp_millis_opt(0)
        .single()
        .ok_or_else(|| CliError::Custom("epoch is not representable".to_string()))?;
    let window_ms = i64::try_from(config.window_ms)
        .map_err(|_| CliError::InvalidArgument(format!("window of {}ms is too long", config.window_ms)))?;

    let clock = ManualClock::new(start);
    let mut session = Session::with_max_len(clock.clone(), config.max_value_len);
    replay(lines, start, window_ms, &clock, &mut session);

    output::emit(&session, &config, globals)
}
