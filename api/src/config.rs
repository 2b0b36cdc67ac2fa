//! API client configuration
//!
//! Values come from the environment with typed defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `POCKETBOOK_ENV` | `qa` |
//! | `POCKETBOOK_API_URL` | host of the selected deployment |
//! | `POCKETBOOK_API_TIMEOUT_MS` | `30000` |

use crate::error::ConfigError;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Backend deployment the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deployment {
    /// Staging backend
    #[default]
    Qa,
    /// Production backend
    Production,
}

impl Deployment {
    /// Default API host of this deployment
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Qa => "https://api-qa.pocketbook.app",
            Self::Production => "https://api.pocketbook.app",
        }
    }
}

impl std::str::FromStr for Deployment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qa" | "staging" => Ok(Self::Qa),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                name: "POCKETBOOK_ENV",
                value: s.to_string(),
            }),
        }
    }
}

/// Base URL and timeout for an [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and host, optionally with a path prefix
    pub base_url: String,
    /// Per-request timeout covering send and body read
    pub timeout: Duration,
}

impl ApiConfig {
    /// Create a configuration from explicit values
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Default configuration for a deployment
    #[must_use]
    pub fn for_deployment(deployment: Deployment) -> Self {
        Self::new(deployment.base_url(), DEFAULT_TIMEOUT)
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `POCKETBOOK_ENV` names an unknown
    /// deployment or `POCKETBOOK_API_TIMEOUT_MS` is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`ApiConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let deployment = match lookup("POCKETBOOK_ENV") {
            Some(value) => value.parse()?,
            None => Deployment::default(),
        };

        let mut config = Self::for_deployment(deployment);

        if let Some(url) = lookup("POCKETBOOK_API_URL").filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url.trim());
        }

        if let Some(raw) = lookup("POCKETBOOK_API_TIMEOUT_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: "POCKETBOOK_API_TIMEOUT_MS",
                    value: raw.clone(),
                })?;
            config = config.with_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_deployment(Deployment::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_qa() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap_or_default();
        assert_eq!(config.base_url, "https://api-qa.pocketbook.app");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn production_deployment() {
        let config = ApiConfig::from_lookup(lookup(&[("POCKETBOOK_ENV", "prod")]));
        assert!(matches!(config, Ok(c) if c.base_url == "https://api.pocketbook.app"));
    }

    #[test]
    fn explicit_url_and_timeout_override_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("POCKETBOOK_ENV", "production"),
            ("POCKETBOOK_API_URL", "http://localhost:8080/"),
            ("POCKETBOOK_API_TIMEOUT_MS", "1500"),
        ]));
        assert!(matches!(
            config,
            Ok(c) if c.base_url == "http://localhost:8080/" && c.timeout == Duration::from_millis(1500)
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ApiConfig::from_lookup(lookup(&[("POCKETBOOK_ENV", "mars")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("POCKETBOOK_API_TIMEOUT_MS", "soon")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("POCKETBOOK_API_TIMEOUT_MS", "0")])).is_err());
    }
}
