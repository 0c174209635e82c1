//! Runtime configuration
//!
//! Values are read from environment variables with defaults; command-line flags
//! override them (see [`crate::cli::StartupConfig`]).

use std::env;
use std::time::Duration;

use crate::data::crypto::COINGECKO_BASE_URL;
use crate::data::github::GITHUB_BASE_URL;

/// Default TTL for cached API responses, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default auto-refresh interval, in seconds
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TTL applied to every cached response
    pub cache_ttl: Duration,
    /// Initial auto-refresh interval for watch mode
    pub refresh_interval: Duration,
    /// CoinGecko API base URL
    pub coingecko_url: String,
    /// GitHub API base URL
    pub github_url: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Environment Variables
    /// - `FOLIO_CACHE_TTL_SECS` - Cache TTL in seconds (default: 300)
    /// - `FOLIO_REFRESH_INTERVAL_SECS` - Auto-refresh interval in seconds (default: 60)
    /// - `FOLIO_COINGECKO_URL` - CoinGecko base URL
    /// - `FOLIO_GITHUB_URL` - GitHub base URL
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        Self {
            cache_ttl: Duration::from_secs(secs("FOLIO_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
            refresh_interval: Duration::from_secs(secs(
                "FOLIO_REFRESH_INTERVAL_SECS",
                DEFAULT_REFRESH_INTERVAL_SECS,
            )),
            coingecko_url: lookup("FOLIO_COINGECKO_URL")
                .unwrap_or_else(|| COINGECKO_BASE_URL.to_string()),
            github_url: lookup("FOLIO_GITHUB_URL").unwrap_or_else(|| GITHUB_BASE_URL.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.coingecko_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.github_url, "https://api.github.com");
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FOLIO_CACHE_TTL_SECS", "120"),
            ("FOLIO_REFRESH_INTERVAL_SECS", " 15 "),
            ("FOLIO_GITHUB_URL", "http://localhost:8080"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.cache_ttl, Duration::from_secs(120));
        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.github_url, "http://localhost:8080");
        assert_eq!(config.coingecko_url, COINGECKO_BASE_URL);
    }

    #[test]
    fn test_config_ignores_unparseable_numbers() {
        let config = Config::from_lookup(|name| {
            (name == "FOLIO_CACHE_TTL_SECS").then(|| "five minutes".to_string())
        });
        assert_eq!(config.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    }
}
