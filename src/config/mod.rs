mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./animatch.toml",
        "~/.config/animatch/config.toml",
        "/etc/animatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.resolver.request_timeout_ms == 0 {
        anyhow::bail!("resolver.request_timeout_ms must be greater than 0");
    }

    if config.resolver.max_season_hops == 0 {
        anyhow::bail!("resolver.max_season_hops must be greater than 0");
    }

    if config.bangumi.requests_per_second == 0 {
        anyhow::bail!("bangumi.requests_per_second must be greater than 0");
    }

    let base_url = config.bangumi.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        anyhow::bail!(
            "bangumi.base_url must be an http(s) URL, got '{}'",
            config.bangumi.base_url
        );
    }

    if config.bangumi.cache_ttl_secs > 0 && config.bangumi.cache_max_entries == 0 {
        tracing::warn!("bangumi.cache_max_entries is 0, responses will not be cached");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use animatch_common::TitlePreference;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.resolver.request_timeout_ms, 30_000);
        assert_eq!(config.resolver.max_season_hops, 16);
        assert!(!config.resolver.always_replace_episode_number);
        assert_eq!(config.bangumi.base_url, "https://api.bgm.tv");
        assert_eq!(config.bangumi.requests_per_second, 4);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [resolver]
            trust_existing_remote_id = true
            title_preference = "localized"
            "#,
        )
        .unwrap();
        assert!(config.resolver.trust_existing_remote_id);
        assert_eq!(config.resolver.title_preference, TitlePreference::Localized);
        assert_eq!(config.resolver.request_timeout_ms, 30_000);
        assert_eq!(config.bangumi.cache_ttl_secs, 600);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.resolver.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.bangumi.base_url = "api.bgm.tv".into();
        assert!(validate_config(&config).is_err());
    }
}
