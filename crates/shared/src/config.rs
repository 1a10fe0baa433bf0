//! Application configuration management.

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Durable rate cache database.
    pub database: DatabaseConfig,
    /// Exchange rate source and cache behaviour.
    pub rates: RatesConfig,
    /// Local key-value tier.
    #[serde(default)]
    pub local_store: LocalStoreConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Exchange rate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Base URL of the live rate source.
    pub source_url: String,
    /// Optional bearer token for the live rate source.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Network timeout for one live request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum age of a cached rate served without a refresh, in seconds.
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: u64,
    /// Maximum number of pairs held by the in-process memo tier.
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: u64,
    /// Pairs to warm on start-up, as `BASE:QUOTE`.
    #[serde(default)]
    pub prefetch_pairs: Vec<String>,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_freshness_window() -> u64 {
    43_200 // 12 hours
}

fn default_memo_capacity() -> u64 {
    1_000
}

impl RatesConfig {
    /// Freshness window as a time delta.
    #[must_use]
    pub fn freshness_window(&self) -> TimeDelta {
        i64::try_from(self.freshness_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Live request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Local key-value tier configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalStoreConfig {
    /// Directory for persisted quotes. `None` keeps the tier in memory only.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `KITTY__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("KITTY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rates.prefetch_pairs")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_with_defaults() {
        temp_env::with_vars(
            [
                ("KITTY__DATABASE__URL", Some("sqlite::memory:")),
                ("KITTY__RATES__SOURCE_URL", Some("https://rates.example.test")),
                ("KITTY__RATES__PREFETCH_PAIRS", Some("USD:EUR,gbp:jpy")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.rates.source_url, "https://rates.example.test");
                assert_eq!(config.rates.api_key, None);
                assert_eq!(config.rates.request_timeout(), Duration::from_secs(10));
                assert_eq!(config.rates.freshness_window(), TimeDelta::hours(12));
                assert_eq!(config.rates.prefetch_pairs, vec!["USD:EUR", "gbp:jpy"]);
                assert!(config.local_store.root.is_none());
            },
        );
    }

    #[test]
    fn test_environment_overrides_defaults() {
        temp_env::with_vars(
            [
                ("KITTY__DATABASE__URL", Some("postgres://localhost/kitty")),
                ("KITTY__RATES__SOURCE_URL", Some("https://rates.example.test")),
                ("KITTY__RATES__FRESHNESS_WINDOW_SECS", Some("60")),
                ("KITTY__LOCAL_STORE__ROOT", Some("/var/cache/kitty")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.rates.freshness_window(), TimeDelta::seconds(60));
                assert_eq!(
                    config.local_store.root,
                    Some(PathBuf::from("/var/cache/kitty"))
                );
            },
        );
    }

    #[test]
    fn test_missing_source_url_is_an_error() {
        temp_env::with_vars(
            [
                ("KITTY__DATABASE__URL", Some("sqlite::memory:")),
                ("KITTY__RATES__SOURCE_URL", None::<&str>),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_oversized_window_saturates() {
        let rates = RatesConfig {
            source_url: String::new(),
            api_key: None,
            request_timeout_secs: 1,
            freshness_window_secs: u64::MAX,
            memo_capacity: 1,
            prefetch_pairs: Vec::new(),
        };
        assert_eq!(rates.freshness_window(), TimeDelta::MAX);
    }
}
