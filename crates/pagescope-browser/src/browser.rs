//! Browser lifecycle management and process control.
//!
//! [`ProbeBrowser`] launches Chrome, drives the CDP handler on a background
//! task, and opens blank pages for the observer to attach to.
//!
//! # Resource Safety
//!
//! Dropping a `ProbeBrowser` kills the Chrome process through chromiumoxide's
//! own Drop. Calling `close()` is still preferred for a graceful shutdown.

use crate::error::{BrowserError, Result};
use crate::observer::Observer;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use pagescope_core::{ExchangeId, Session};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Configuration for launching the browser.
#[derive(Debug, Clone)]
pub struct ProbeBrowserConfig {
    /// Run in headless mode (default: true).
    pub headless: bool,

    /// Browser window size (default: 1280x800).
    pub window_size: (u32, u32),

    /// Additional Chrome arguments.
    pub args: Vec<String>,

    /// Chrome executable path (None = auto-detect).
    pub chrome_path: Option<String>,
}

impl ProbeBrowserConfig {
    /// Creates a new config with headless defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the browser window.
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Sets a custom window size.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Adds additional Chrome arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Uses a specific Chrome executable.
    #[must_use]
    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Converts to chromiumoxide `BrowserConfig`.
    #[allow(clippy::result_large_err)]
    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::builder();

        if !self.headless {
            config = config.with_head();
        }

        config = config.window_size(self.window_size.0, self.window_size.1);

        // A fresh profile per launch avoids ProcessSingleton clashes between
        // concurrent instances
        let user_data_dir =
            std::env::temp_dir().join(format!("pagescope-{}", uuid::Uuid::new_v4()));
        config = config.user_data_dir(user_data_dir);

        for arg in &self.args {
            config = config.arg(arg.clone());
        }

        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path.clone());
        }

        config.build().map_err(|e| BrowserError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for ProbeBrowserConfig {
    fn default() -> Self {
        Self {
            headless: !cfg!(feature = "visible"),
            window_size: (1280, 800),
            args: vec![
                // Needed where user namespaces are unavailable (containers, CI)
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
        }
    }
}

/// A managed Chrome instance.
///
/// # Example
///
/// ```ignore
/// let browser = ProbeBrowser::launch(ProbeBrowserConfig::default()).await?;
/// let session = browser.observe("https://example.com", &Observer::default(), |_, _| {}).await?;
/// browser.close().await?;
/// ```
pub struct ProbeBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
}

impl ProbeBrowser {
    /// Launches a new browser instance with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` if Chrome is not installed, not executable,
    /// or fails to start.
    pub async fn launch(config: ProbeBrowserConfig) -> Result<Self> {
        debug!(?config, "launching browser");

        let browser_config = config.to_browser_config()?;

        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| BrowserError::LaunchFailed {
                    reason: "failed to launch Chrome process".to_string(),
                    source: Some(Box::new(e)),
                })?;

        // chromiumoxide only makes progress while its handler is polled
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler error: {}", e);
                }
            }
        });

        debug!("browser launched");

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
        })
    }

    /// Opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the browser has been closed, or the
    /// protocol error if the tab could not be created.
    pub async fn new_page(&self) -> Result<Page> {
        let browser = self.inner.lock().await;
        let browser = browser.as_ref().ok_or(BrowserError::AlreadyClosed)?;

        Ok(browser.new_page("about:blank").await?)
    }

    /// Opens a tab, observes `url` in it for one window, and closes the tab.
    ///
    /// # Errors
    ///
    /// Fails if the tab cannot be opened or its event streams cannot be
    /// subscribed to.
    pub async fn observe<U>(&self, url: &str, observer: &Observer, on_update: U) -> Result<Session>
    where
        U: FnMut(&Session, Option<ExchangeId>),
    {
        let page = self.new_page().await?;
        let session = observer.observe(&page, url, on_update).await?;
        if let Err(e) = page.close().await {
            debug!(error = %e, "tab did not close cleanly");
        }
        Ok(session)
    }

    /// Closes the browser and kills the Chrome process.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser fails to close gracefully.
    pub async fn close(self) -> Result<()> {
        let mut browser_guard = self.inner.lock().await;

        if let Some(mut browser) = browser_guard.take() {
            debug!("closing browser");
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "browser process did not exit cleanly");
            }
        }

        Ok(())
    }

    /// Returns true if the browser has been closed.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders_accumulate() {
        let config = ProbeBrowserConfig::new()
            .visible()
            .with_window_size(800, 600)
            .with_args(vec!["--mute-audio".to_string()])
            .with_chrome_path("/usr/bin/chromium");

        assert!(!config.headless);
        assert_eq!(config.window_size, (800, 600));
        assert_eq!(config.args.len(), 3);
        assert_eq!(config.chrome_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[tokio::test]
    #[ignore] // Requires Chrome to be installed
    async fn browser_launch_and_close() {
        let browser = ProbeBrowser::launch(ProbeBrowserConfig::default())
            .await
            .expect("failed to launch browser");

        assert!(!browser.is_closed().await);

        browser.close().await.expect("failed to close browser");
    }
}
