//! Shared report output for `watch` and `replay`.

use crate::cli::{GlobalFlags, OutputFormat};
use crate::config::PagescopeConfig;
use crate::error::Result;
use crate::ui::{self, RenderOptions};
use pagescope_core::Session;

/// Prints the report for `session` to stdout in the configured format, then a
/// one-line verdict to stderr.
pub(crate) fn emit(session: &Session, config: &PagescopeConfig, globals: GlobalFlags) -> Result<()> {
    let policy = config.summary_policy();

    match config.output {
        OutputFormat::Json => println!("{}", ui::render_json(session, &policy)?),
        OutputFormat::Text => {
            let options = RenderOptions {
                max_value_len: config.max_value_len,
                show_headers: config.show_headers,
                show_bodies: config.show_bodies,
            };
            println!("{}", ui::render_text(session, &policy, &options));
        }
    }

    if !globals.quiet {
        let report = session.summarize(&policy);
        if report.is_healthy() {
            ui::success(&format!("{} requests, none failed or stuck", report.total()));
        } else {
            ui::warning(&format!(
                "{} failed, {} stuck of {} requests",
                report.counts.failed,
                report.stuck.len(),
                report.total()
            ));
        }
    }

    Ok(())
}
