#[cfg(test)]
mod tests {
    use crate::cli::OutputFormat;
    use crate::config::loading::env_key_to_field;
    use crate::config::*;
    use crate::error::{CliError, ConfigError};
    use figment::Jail;
    use std::path::Path;

    fn load(jail_overrides: &ConfigOverrides) -> Result<PagescopeConfig, String> {
        PagescopeConfig::load(None, jail_overrides).map_err(|e| e.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = PagescopeConfig::default();
        assert_eq!(config.window_ms, 5_000);
        assert!(config.headless);
        assert_eq!(config.max_value_len, 512);
        assert_eq!(config.summary_policy(), pagescope_core::SummaryPolicy::default());
        assert_eq!(config.output, OutputFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = PagescopeConfig {
            url: Some("https://example.com".to_string()),
            show_bodies: true,
            ..PagescopeConfig::default()
        };

        // camelCase field names
        let json_val = serde_json::to_value(&config).unwrap();
        assert!(json_val.get("windowMs").is_some());
        assert!(json_val.get("staleThresholdMs").is_some());
        assert!(json_val.get("window_ms").is_none());
        assert_eq!(json_val["output"], "text");

        // skip_serializing_if
        let minimal = serde_json::to_value(PagescopeConfig::default()).unwrap();
        assert!(minimal.get("url").is_none());
        assert!(minimal.get("chromePath").is_none());

        let back: PagescopeConfig = serde_json::from_value(json_val).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_window_size_spellings() {
        let text: PagescopeConfig = serde_json::from_str(r#"{"windowSize": "1024x768"}"#).unwrap();
        let object: PagescopeConfig =
            serde_json::from_str(r#"{"windowSize": {"width": 1024, "height": 768}}"#).unwrap();
        assert_eq!(text.window_size, object.window_size);
        assert_eq!(text.window_size.to_string(), "1024x768");

        assert!(serde_json::from_str::<PagescopeConfig>(r#"{"windowSize": "0x768"}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<PagescopeConfig>(r#"{"windowMS": 10}"#).is_err());
    }

    #[test]
    fn test_validation() {
        let invalid = [
            PagescopeConfig { window_ms: 0, ..PagescopeConfig::default() },
            PagescopeConfig { max_value_len: 0, ..PagescopeConfig::default() },
            PagescopeConfig { stale_threshold_ms: 0, ..PagescopeConfig::default() },
            PagescopeConfig { url: Some("ftp://example.com".into()), ..PagescopeConfig::default() },
            PagescopeConfig { clean_status_max: 500, failure_status_min: 400, ..PagescopeConfig::default() },
        ];
        for config in invalid {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }

        let err = PagescopeConfig { window_ms: 0, ..PagescopeConfig::default() }
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "windowMs"
        ));
    }

    #[test]
    fn test_require_url() {
        assert!(PagescopeConfig::default().require_url().is_err());
        let config = PagescopeConfig { url: Some("about:blank".into()), ..PagescopeConfig::default() };
        assert_eq!(config.require_url().unwrap(), "about:blank");
    }

    #[test]
    fn test_env_key_to_field() {
        assert_eq!(env_key_to_field("WINDOW_MS"), "windowMs");
        assert_eq!(env_key_to_field("URL"), "url");
        assert_eq!(env_key_to_field("STALE_THRESHOLD_MS"), "staleThresholdMs");
        assert_eq!(env_key_to_field("window_size"), "windowSize");
    }

    #[test]
    fn test_layering_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pagescope.json",
                r#"{ "windowMs": 3000, "staleThresholdMs": 1500, "showHeaders": true, "maxValueLen": 64 }"#,
            )?;
            jail.set_env("PAGESCOPE_WINDOW_MS", "4000");
            jail.set_env("PAGESCOPE_STALE_THRESHOLD_MS", "2500");

            let overrides = ConfigOverrides { window_ms: Some(9000), ..ConfigOverrides::default() };
            let config = load(&overrides)?;

            // CLI beats env beats file beats defaults
            assert_eq!(config.window_ms, 9000);
            assert_eq!(config.stale_threshold_ms, 2500);
            assert_eq!(config.max_value_len, 64);
            assert!(config.show_headers);
            assert_eq!(config.failure_status_min, 400);
            Ok(())
        });
    }

    #[test]
    fn test_unset_flags_do_not_mask_file() {
        Jail::expect_with(|jail| {
            jail.create_file("pagescope.json", r#"{ "showBodies": true, "headless": false }"#)?;

            let config = load(&ConfigOverrides::default())?;
            assert!(config.show_bodies);
            assert!(!config.headless);
            Ok(())
        });
    }

    #[test]
    fn test_toml_config_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "scope.toml",
                r#"
                url = "https://example.com/"
                windowMs = 1200
                output = "json"
                "#,
            )?;

            let config = PagescopeConfig::load(Some(Path::new("scope.toml")), &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.url.as_deref(), Some("https://example.com/"));
            assert_eq!(config.window_ms, 1200);
            assert_eq!(config.output, OutputFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_config_file() {
        Jail::expect_with(|_jail| {
            let err = PagescopeConfig::load(Some(Path::new("nope.json")), &ConfigOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::NotFound(_))));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_config_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("scope.yaml", "windowMs: 10")?;
            let err = PagescopeConfig::load(Some(Path::new("scope.yaml")), &ConfigOverrides::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config(ConfigError::UnsupportedFormat(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("PAGESCOPE_WINDOW_MS", "0");
            assert!(load(&ConfigOverrides::default()).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_json_schema_lists_fields() {
        let schema = PagescopeConfig::json_schema();
        let properties = schema["properties"].as_object().expect("object schema");
        for field in ["url", "windowMs", "headless", "staleThresholdMs", "output"] {
            assert!(properties.contains_key(field), "schema is missing {field}");
        }
    }

    #[test]
    fn test_example_config_round_trips() {
        let example = PagescopeConfig::example_config().unwrap();
        let parsed: PagescopeConfig = serde_json::from_str(&example).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.window_ms, 8_000);
    }

    #[test]
    fn test_conversions() {
        let config = PagescopeConfig {
            headless: false,
            chrome_path: Some("/opt/chrome".into()),
            window_ms: 750,
            ..PagescopeConfig::default()
        };
        let browser = config.browser_config();
        assert!(!browser.headless);
        assert_eq!(browser.chrome_path.as_deref(), Some("/opt/chrome"));
        assert_eq!(browser.window_size, (1280, 800));
        assert_eq!(config.observer().window(), std::time::Duration::from_millis(750));
    }
}
