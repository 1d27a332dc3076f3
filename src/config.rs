//! Process settings loaded from the environment
//!
//! `main` loads a `.env` file first (via `dotenvy`), then calls
//! [`Settings::from_env`]. Tests use [`Settings::from_lookup`] with a map so
//! they never touch process state.

use crate::error::ConfigError;
use crate::models::{Backend, Credentials, Environment};
use std::time::Duration;

pub const ENV_USERNAME: &str = "SANMAR_USERNAME";
pub const ENV_PASSWORD: &str = "SANMAR_PASSWORD";
pub const ENV_CUSTOMER_NUMBER: &str = "SANMAR_CUSTOMER_NUMBER";
pub const ENV_USE_TEST: &str = "SANMAR_USE_TEST";
pub const ENV_BACKEND: &str = "SANMAR_BACKEND";
pub const ENV_BASE_URL: &str = "SANMAR_BASE_URL";
pub const ENV_SEARCH_URL: &str = "SANMAR_SEARCH_URL";
pub const ENV_TIMEOUT: &str = "HTTP_TIMEOUT_SECONDS";
pub const ENV_OUTPUT_FORMAT: &str = "OUTPUT_FORMAT";

pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

/// Storefront product search used by `--search`
pub const DEFAULT_SEARCH_URL: &str = "https://www.sanmar.com/search/findProducts.json";

/// Read-only settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    /// Backend used when the command line does not pick one
    pub backend: Backend,
    pub timeout: Duration,
    /// Raw `OUTPUT_FORMAT` value; validated by the exporter
    pub default_format: Option<String>,
    /// Replaces the SanMar host (scheme + authority) for both backends
    pub base_url: Option<String>,
    pub search_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            backend: Backend::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_format: None,
            base_url: None,
            search_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match value(ENV_USE_TEST) {
            Some(flag) if matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes") => {
                Environment::Test
            }
            _ => Environment::Production,
        };

        let backend = match value(ENV_BACKEND) {
            Some(raw) => raw.parse().map_err(|value| ConfigError::InvalidValue {
                key: ENV_BACKEND,
                value,
            })?,
            None => Backend::default(),
        };

        let timeout_secs = match value(ENV_TIMEOUT) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Ignoring {}={:?}, using {}s",
                    ENV_TIMEOUT,
                    raw,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            credentials: Credentials {
                username: value(ENV_USERNAME).unwrap_or_default(),
                password: value(ENV_PASSWORD).unwrap_or_default(),
                customer_number: value(ENV_CUSTOMER_NUMBER),
                environment,
            },
            backend,
            timeout: Duration::from_secs(timeout_secs),
            default_format: value(ENV_OUTPUT_FORMAT),
            base_url: value(ENV_BASE_URL).map(|url| url.trim_end_matches('/').to_string()),
            search_url: value(ENV_SEARCH_URL).unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
        })
    }

    /// Check that every credential the backend needs is present
    pub fn validate_for(&self, backend: Backend) -> Result<(), ConfigError> {
        let creds = &self.credentials;
        let mut missing = Vec::new();

        if backend == Backend::Standard && creds.customer_number.is_none() {
            missing.push(ENV_CUSTOMER_NUMBER);
        }
        if creds.username.is_empty() {
            missing.push(ENV_USERNAME);
        }
        if creds.password.is_empty() {
            missing.push(ENV_PASSWORD);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredentials(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.backend, Backend::PromoStandards);
        assert_eq!(settings.timeout, Duration::from_secs(25));
        assert_eq!(settings.credentials.environment, Environment::Production);
        assert!(settings.credentials.customer_number.is_none());
        assert!(settings.default_format.is_none());
        assert!(settings.base_url.is_none());
        assert_eq!(settings.search_url, DEFAULT_SEARCH_URL);
    }

    #[test]
    fn reads_credentials_and_flags() {
        let settings = settings_from(&[
            (ENV_USERNAME, " shop "),
            (ENV_PASSWORD, "secret"),
            (ENV_CUSTOMER_NUMBER, "12345"),
            (ENV_USE_TEST, "Yes"),
            (ENV_BACKEND, "Standard"),
            (ENV_TIMEOUT, "5"),
            (ENV_OUTPUT_FORMAT, "csv"),
            (ENV_BASE_URL, "http://127.0.0.1:9000/"),
            (ENV_SEARCH_URL, "http://127.0.0.1:9000/search.json"),
        ])
        .unwrap();

        assert_eq!(settings.credentials.username, "shop");
        assert_eq!(settings.credentials.password, "secret");
        assert_eq!(settings.credentials.customer_number.as_deref(), Some("12345"));
        assert_eq!(settings.credentials.environment, Environment::Test);
        assert_eq!(settings.backend, Backend::Standard);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.default_format.as_deref(), Some("csv"));
        assert_eq!(settings.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(settings.search_url, "http://127.0.0.1:9000/search.json");
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        let settings = settings_from(&[(ENV_TIMEOUT, "soon")]).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        match settings_from(&[(ENV_BACKEND, "webjson")]) {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, ENV_BACKEND);
                assert_eq!(value, "webjson");
            }
            other => panic!("Expected ConfigError::InvalidValue, got: {other:?}"),
        }
    }

    #[test]
    fn standard_backend_requires_customer_number() {
        let settings = settings_from(&[(ENV_USERNAME, "shop"), (ENV_PASSWORD, "secret")]).unwrap();
        assert!(settings.validate_for(Backend::PromoStandards).is_ok());

        match settings.validate_for(Backend::Standard) {
            Err(ConfigError::MissingCredentials(missing)) => {
                assert_eq!(missing, vec![ENV_CUSTOMER_NUMBER]);
            }
            other => panic!("Expected missing customer number, got: {other:?}"),
        }
    }

    #[test]
    fn missing_credentials_are_all_reported() {
        let settings = settings_from(&[]).unwrap();
        match settings.validate_for(Backend::Standard) {
            Err(ConfigError::MissingCredentials(missing)) => {
                assert_eq!(
                    missing,
                    vec![ENV_CUSTOMER_NUMBER, ENV_USERNAME, ENV_PASSWORD]
                );
            }
            other => panic!("Expected MissingCredentials, got: {other:?}"),
        }
    }
}
