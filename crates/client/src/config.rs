//! Client configuration
//!
//! Loads API client settings from environment variables with sensible
//! defaults.
//!
//! ## Environment Variables
//! - `STOCKARC_API_BASE_URL`: Backend base URL (trailing slashes are trimmed)
//! - `STOCKARC_API_TIMEOUT_MS`: Default per-attempt timeout in milliseconds

use std::time::Duration;

use stockarc_domain::constants::DEFAULT_TIMEOUT_MS;
use stockarc_domain::{AppError, Result};

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the backend (e.g., "https://api.stockarc.app/v1")
    pub base_url: String,
    /// Default per-attempt timeout for requests
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stockarc.app/v1".to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: trim_trailing_slash(base_url.into()), ..Self::default() }
    }

    /// Sets the default per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `STOCKARC_API_TIMEOUT_MS` is set but is not a
    /// valid integer.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("STOCKARC_API_BASE_URL") {
            Ok(url) => Self::new(url),
            Err(_) => Self::default(),
        };

        if let Ok(raw) = std::env::var("STOCKARC_API_TIMEOUT_MS") {
            let ms = raw
                .parse::<u64>()
                .map_err(|e| AppError::unknown(format!("Invalid STOCKARC_API_TIMEOUT_MS: {e}")))?;
            config.timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_backend_contract() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert!(!config.base_url.ends_with('/'));
    }

    #[test]
    fn trims_trailing_slashes() {
        let config = ClientConfig::new("http://localhost:8080/api/");
        assert_eq!(config.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn loads_overrides_from_env() {
        std::env::set_var("STOCKARC_API_BASE_URL", "http://localhost:9999/api/");
        std::env::set_var("STOCKARC_API_TIMEOUT_MS", "1500");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://localhost:9999/api");
        assert_eq!(config.timeout, Duration::from_millis(1500));

        std::env::set_var("STOCKARC_API_TIMEOUT_MS", "not-a-number");
        assert!(ClientConfig::from_env().is_err());

        std::env::remove_var("STOCKARC_API_BASE_URL");
        std::env::remove_var("STOCKARC_API_TIMEOUT_MS");
    }
}
