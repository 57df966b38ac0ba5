//! Watch command implementation.
//!
//! Opens the target URL in Chrome, records console and network activity for
//! one observation window, and prints the transcript, ledger and summary.

use super::output;
use crate::cli::{GlobalFlags, WatchArgs};
use crate::config::{ConfigOverrides, PagescopeConfig};
use crate::error::Result;
use crate::ui::{self, Spinner};
use pagescope_browser::ProbeBrowser;
use tracing::warn;

/// Execute the watch command.
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Launch Chrome
/// 3. Observe the page for the configured window
/// 4. Close the browser and render the report
///
/// # Errors
///
/// Returns errors for invalid configuration, a browser that fails to launch,
/// or a page that cannot be opened.
pub async fn execute(args: WatchArgs, globals: GlobalFlags) -> Result<()> {
    let config = PagescopeConfig::load(args.config.as_deref(), &ConfigOverrides::from(&args))?;
    let url = config.require_url()?.to_string();

    if !globals.quiet {
        ui::info("Launching Chrome...");
    }
    let browser = ProbeBrowser::launch(config.browser_config()).await?;

    let spinner = if globals.quiet {
        Spinner::hidden()
    } else {
        Spinner::new(&format!("Observing {url} for {}", ui::format_duration(config.window())))
    };

    let policy = config.summary_policy();
    let observed = browser
        .observe(&url, &config.observer(), |session, touched| {
            if !globals.verbose {
                return;
            }
            if let Some(exchange) = touched.and_then(|id| session.network().get(id)) {
                spinner.println(&ui::network_line(exchange, &policy));
            }
        })
        .await;

    // Close before reporting so Chrome does not outlive a failed window.
    if let Err(e) = browser.close().await {
        warn!("Failed to close browser cleanly: {e}");
    }

    let session = match observed {
        Ok(session) => session,
        Err(e) => {
            spinner.fail("Observation failed");
            return Err(e.into());
        }
    };
    spinner.finish("Window closed");

    output::emit(&session, &config, globals)
}
