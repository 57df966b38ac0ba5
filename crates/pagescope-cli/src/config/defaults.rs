use crate::config::WindowSize;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pagescope.json";

/// Prefix of environment variables that override config values
/// (`PAGESCOPE_WINDOW_MS`, `PAGESCOPE_HEADLESS`, ...).
pub const ENV_PREFIX: &str = "PAGESCOPE_";

pub fn default_window_ms() -> u64 {
    5_000
}

pub fn default_headless() -> bool {
    true
}

pub fn default_window_size() -> WindowSize {
    WindowSize { width: 1280, height: 800 }
}

pub fn default_max_value_len() -> usize {
    pagescope_core::DEFAULT_MAX_LEN
}

pub fn default_stale_threshold_ms() -> u64 {
    5_000
}

pub fn default_failure_status_min() -> u16 {
    400
}

pub fn default_clean_status_max() -> u16 {
    300
}
