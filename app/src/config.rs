//! Application configuration
//!
//! Extends [`ApiConfig`] with the client-side settings:
//!
//! | Variable | Default |
//! |---|---|
//! | `POCKETBOOK_STATE_PATH` | `pocketbook-state.json` |
//! | `POCKETBOOK_SEARCH_DEBOUNCE_MS` | `400` |

use crate::environment::DEFAULT_SEARCH_DEBOUNCE;
use pocketbook_api::{ApiConfig, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the persisted state file
pub const DEFAULT_STATE_PATH: &str = "pocketbook-state.json";

/// Full client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP client settings
    pub api: ApiConfig,
    /// Where the whitelisted state is saved
    pub state_path: PathBuf,
    /// Quiet period before a connector search is sent
    pub search_debounce: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for any unparsable variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = ApiConfig::from_lookup(&lookup)?;

        let state_path = lookup("POCKETBOOK_STATE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_PATH), PathBuf::from);

        let search_debounce = match lookup("POCKETBOOK_SEARCH_DEBOUNCE_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue {
                    name: "POCKETBOOK_SEARCH_DEBOUNCE_MS",
                    value: raw.clone(),
                })?,
            None => DEFAULT_SEARCH_DEBOUNCE,
        };

        Ok(Self {
            api,
            state_path,
            search_debounce,
        })
    }

    /// Override the API settings
    #[must_use]
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Override the state file location
    #[must_use]
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}
