use crate::cli::{OutputFormat, ReplayArgs, ReportArgs, WatchArgs};
use crate::config::{PagescopeConfig, WindowSize, DEFAULT_CONFIG_FILE, ENV_PREFIX};
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized, Toml},
    Figment,
};
use serde::Serialize;
use std::path::Path;

/// Values given on the command line. Only the ones that were actually set
/// are serialized, so unset flags never mask file or environment values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<WindowSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_threshold_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_status_min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_status_max: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_headers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_bodies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
}

impl ConfigOverrides {
    fn with_report(mut self, report: &ReportArgs) -> Self {
        self.max_value_len = report.max_value_len;
        self.stale_threshold_ms = report.stale_threshold_ms;
        self.failure_status_min = report.failure_status_min;
        self.clean_status_max = report.clean_status_max;
        self.show_headers = report.show_headers.then_some(true);
        self.show_bodies = report.show_bodies.then_some(true);
        self.output = report.output;
        self
    }
}

impl From<&WatchArgs> for ConfigOverrides {
    fn from(args: &WatchArgs) -> Self {
        Self {
            url: args.url.clone(),
            window_ms: args.window_ms,
            headless: args.headed.then_some(false),
            chrome_path: args.chrome_path.clone(),
            window_size: args
                .window_size
                .map(|(width, height)| WindowSize { width, height }),
            ..Self::default()
        }
        .with_report(&args.report)
    }
}

impl From<&ReplayArgs> for ConfigOverrides {
    fn from(args: &ReplayArgs) -> Self {
        Self {
            window_ms: args.window_ms,
            ..Self::default()
        }
        .with_report(&args.report)
    }
}

/// Maps an environment key (prefix already stripped) to its config field:
/// `WINDOW_MS` becomes `windowMs`.
pub(crate) fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = !field.is_empty();
        } else if upper_next {
            field.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            field.push(c.to_ascii_lowercase());
        }
    }
    field
}

impl PagescopeConfig {
    /// Load configuration from multiple sources and validate it.
    /// Priority: CLI args > environment variables > config file > defaults
    ///
    /// `config_path` must exist when given; otherwise `pagescope.json` in
    /// the working directory is used if present.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for missing or unreadable files, unknown
    /// fields, wrong types and values that fail validation.
    pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config = Self::figment(config_path, overrides)?
            .extract::<Self>()
            .map_err(|e| ConfigError::Extract(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// The merged provider stack, before extraction.
    pub(crate) fn figment(config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                Some("toml") => figment.merge(Toml::file(path)),
                _ => return Err(ConfigError::UnsupportedFormat(path).into()),
            };
        }

        // PAGESCOPE_WINDOW_MS -> windowMs, PAGESCOPE_HEADLESS -> headless, ...
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .map(|key| env_key_to_field(key.as_str()).into()),
        );

        // CLI args override everything that was actually given
        Ok(figment.merge(Serialized::defaults(overrides)))
    }
}
