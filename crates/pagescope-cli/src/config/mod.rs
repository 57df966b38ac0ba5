//! Configuration for pagescope with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and config files.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod tests;
mod validation;

use crate::cli::OutputFormat;
use pagescope_browser::{Observer, ProbeBrowserConfig};
use pagescope_core::SummaryPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use defaults::*;
pub use loading::ConfigOverrides;

/// pagescope configuration - loaded from pagescope.json, env and CLI args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PagescopeConfig {
    /// Page to observe (http, https, file, data or about URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Observation window in milliseconds
    #[serde(default = "default_window_ms")]
    #[schemars(range(min = 1))]
    pub window_ms: u64,

    /// Run Chrome without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Chrome or Chromium executable (auto-detected when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,

    /// Browser window size, as "WIDTHxHEIGHT" or {"width", "height"}
    #[serde(default = "default_window_size")]
    pub window_size: WindowSize,

    /// Maximum rendered length of console arguments, headers and bodies
    #[serde(default = "default_max_value_len")]
    #[schemars(range(min = 1))]
    pub max_value_len: usize,

    /// Pending requests older than this many milliseconds are stuck
    #[serde(default = "default_stale_threshold_ms")]
    #[schemars(range(min = 1))]
    pub stale_threshold_ms: u64,

    /// Responses at or above this status are failures
    #[serde(default = "default_failure_status_min")]
    pub failure_status_min: u16,

    /// Successful responses below this status are clean
    #[serde(default = "default_clean_status_max")]
    pub clean_status_max: u16,

    /// Include headers in the network listing
    #[serde(default)]
    pub show_headers: bool,

    /// Include request bodies in the network listing
    #[serde(default)]
    pub show_bodies: bool,

    /// Report format
    #[serde(default)]
    pub output: OutputFormat,
}

/// Browser window dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "WindowSizeRepr")]
pub struct WindowSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Accepted spellings of a window size.
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum WindowSizeRepr {
    Text(String),
    Object { width: u32, height: u32 },
}

impl TryFrom<WindowSizeRepr> for WindowSize {
    type Error = String;

    fn try_from(repr: WindowSizeRepr) -> Result<Self, Self::Error> {
        let (width, height) = match repr {
            WindowSizeRepr::Text(text) => crate::cli::parse_window_size(&text)?,
            WindowSizeRepr::Object { width, height } => (width, height),
        };
        if width == 0 || height == 0 {
            return Err(format!("window size {width}x{height} must be positive"));
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for WindowSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Default for PagescopeConfig {
    fn default() -> Self {
        Self {
            url: None,
            window_ms: default_window_ms(),
            headless: default_headless(),
            chrome_path: None,
            window_size: default_window_size(),
            max_value_len: default_max_value_len(),
            stale_threshold_ms: default_stale_threshold_ms(),
            failure_status_min: default_failure_status_min(),
            clean_status_max: default_clean_status_max(),
            show_headers: false,
            show_bodies: false,
            output: OutputFormat::Text,
        }
    }
}

impl PagescopeConfig {
    /// Generate JSON Schema for pagescope.json.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(PagescopeConfig);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Generate example pagescope.json content.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which a plain struct cannot do.
    pub fn example_config() -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self {
            url: Some("https://example.com/".to_string()),
            window_ms: 8_000,
            show_headers: true,
            ..Self::default()
        })
    }

    /// Thresholds for the diagnostics summary.
    pub fn summary_policy(&self) -> SummaryPolicy {
        SummaryPolicy {
            stale_threshold_ms: i64::try_from(self.stale_threshold_ms).unwrap_or(i64::MAX),
            failure_status_min: self.failure_status_min,
            clean_status_max: self.clean_status_max,
        }
    }

    /// The observation window.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Browser launch settings.
    pub fn browser_config(&self) -> ProbeBrowserConfig {
        let mut config = ProbeBrowserConfig::new()
            .with_window_size(self.window_size.width, self.window_size.height);
        if !self.headless {
            config = config.visible();
        }
        if let Some(path) = &self.chrome_path {
            config = config.with_chrome_path(path.clone());
        }
        config
    }

    /// Observer for one window with this config's limits.
    pub fn observer(&self) -> Observer {
        Observer::new(self.window()).with_max_value_len(self.max_value_len)
    }
}
