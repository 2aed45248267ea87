// src/standardization/config.rs

use log::info;
use std::time::Duration;

use crate::errors::StandardizationError;
use crate::utils::constants::{
    DEFAULT_STANDARDIZE_API_URL, DUPLICATE_CHUNK_SIZE, DUPLICATE_CHUNK_THRESHOLD, REQUEST_DELAY_MS,
    REQUEST_TIMEOUT_SECS, STANDARDIZE_BATCH_SIZE,
};
use crate::utils::env::{env_opt, env_or};

/// Settings for talking to the external standardization service.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizationConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub duplicate_chunk_size: usize,
    pub duplicate_chunk_threshold: usize,
    pub request_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_STANDARDIZE_API_URL.to_string(),
            api_key: None,
            batch_size: STANDARDIZE_BATCH_SIZE,
            duplicate_chunk_size: DUPLICATE_CHUNK_SIZE,
            duplicate_chunk_threshold: DUPLICATE_CHUNK_THRESHOLD,
            request_delay: Duration::from_millis(REQUEST_DELAY_MS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl StandardizationConfig {
    pub fn from_env() -> Self {
        Self {
            endpoint: env_opt("STANDARDIZE_API_URL")
                .unwrap_or_else(|| DEFAULT_STANDARDIZE_API_URL.to_string()),
            api_key: env_opt("STANDARDIZE_API_KEY"),
            batch_size: env_or("STANDARDIZE_BATCH_SIZE", STANDARDIZE_BATCH_SIZE).max(1),
            duplicate_chunk_size: env_or("STANDARDIZE_DUPLICATE_CHUNK_SIZE", DUPLICATE_CHUNK_SIZE).max(1),
            duplicate_chunk_threshold: env_or(
                "STANDARDIZE_DUPLICATE_CHUNK_THRESHOLD",
                DUPLICATE_CHUNK_THRESHOLD,
            ),
            request_delay: Duration::from_millis(env_or("STANDARDIZE_REQUEST_DELAY_MS", REQUEST_DELAY_MS)),
            request_timeout: Duration::from_secs(env_or("STANDARDIZE_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)),
        }
    }

    /// Endpoint parsed as a URL, or a configuration error.
    pub fn endpoint_url(&self) -> Result<url::Url, StandardizationError> {
        url::Url::parse(&self.endpoint).map_err(|e| {
            StandardizationError::Configuration(format!("invalid endpoint '{}': {}", self.endpoint, e))
        })
    }

    /// The credential, or a configuration error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, StandardizationError> {
        self.api_key.as_deref().ok_or_else(|| {
            StandardizationError::Configuration("STANDARDIZE_API_KEY is not set".to_string())
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.endpoint_url().is_ok()
    }

    pub fn log_config(&self) {
        info!(
            "Standardization service: endpoint={}, credential={}, batch_size={}, duplicate_chunk_size={} (above {} records), delay={:?}",
            self.endpoint,
            if self.api_key.is_some() { "set" } else { "missing" },
            self.batch_size,
            self.duplicate_chunk_size,
            self.duplicate_chunk_threshold,
            self.request_delay
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = StandardizationConfig::default();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.duplicate_chunk_size, 50);
        assert_eq!(config.duplicate_chunk_threshold, 100);
        assert_eq!(config.request_delay, Duration::from_millis(500));
        assert!(!config.is_configured());
        assert!(matches!(
            config.require_api_key(),
            Err(StandardizationError::Configuration(_))
        ));
    }

    #[test]
    fn test_env_config() {
        env::set_var("STANDARDIZE_API_URL", "https://proxy.example.com/api/standardize");
        env::set_var("STANDARDIZE_API_KEY", "secret");
        env::set_var("STANDARDIZE_BATCH_SIZE", "0");
        env::set_var("STANDARDIZE_REQUEST_DELAY_MS", "10");

        let config = StandardizationConfig::from_env();
        assert_eq!(config.endpoint, "https://proxy.example.com/api/standardize");
        assert_eq!(config.require_api_key(), Ok("secret"));
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.request_delay, Duration::from_millis(10));
        assert!(config.is_configured());

        env::remove_var("STANDARDIZE_API_URL");
        env::remove_var("STANDARDIZE_API_KEY");
        env::remove_var("STANDARDIZE_BATCH_SIZE");
        env::remove_var("STANDARDIZE_REQUEST_DELAY_MS");
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = StandardizationConfig {
            endpoint: "not a url".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert!(config.endpoint_url().is_err());
        assert!(!config.is_configured());
    }
}
