use crate::cli::parse_url;
use crate::config::PagescopeConfig;
use crate::error::{ConfigError, Result};

impl PagescopeConfig {
    /// Validate configuration for logical consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            parse_url(url).map_err(|hint| ConfigError::InvalidValue {
                field: "url".to_string(),
                value: url.clone(),
                hint,
            })?;
        }

        if self.window_ms == 0 {
            return Err(invalid("windowMs", 0, "The observation window must be at least 1 ms"));
        }

        if self.max_value_len == 0 {
            return Err(invalid("maxValueLen", 0, "Rendered values need room for at least one character"));
        }

        if self.stale_threshold_ms == 0 {
            return Err(invalid(
                "staleThresholdMs",
                0,
                "A zero threshold would report every pending request as stuck",
            ));
        }

        if self.clean_status_max > self.failure_status_min {
            return Err(invalid(
                "cleanStatusMax",
                self.clean_status_max,
                format!(
                    "Must not exceed failureStatusMin ({}); a clean response is always a successful one",
                    self.failure_status_min
                ),
            ));
        }

        Ok(())
    }

    /// Validate that a page URL is present, for commands that navigate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` when no URL was configured.
    pub fn require_url(&self) -> Result<&str> {
        self.url.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "url".to_string(),
                hint: "Pass a URL (pagescope watch https://example.com) or set \"url\" in pagescope.json".to_string(),
            }
            .into()
        })
    }
}

fn invalid(field: &str, value: impl ToString, hint: impl Into<String>) -> crate::error::CliError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        hint: hint.into(),
    }
    .into()
}
