//! # Pocketbook API Client
//!
//! Authenticated JSON HTTP client for the Pocketbook REST API.
//!
//! ## Example
//!
//! ```no_run
//! use pocketbook_api::{ApiClient, ApiConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL and timeout from POCKETBOOK_* environment variables
//!     let client = ApiClient::new(ApiConfig::from_env()?);
//!     client.set_token(Some("session-token".to_string()));
//!
//!     let accounts: serde_json::Value = client.get("/accounts").await?;
//!     println!("Accounts: {accounts}");
//!     Ok(())
//! }
//! ```
//!
//! ## Behavior
//!
//! - Exactly one slash between base URL and path
//! - JSON `Content-Type`/`Accept` on every request, bearer token when set
//! - One timeout covering send and body read
//! - Failures normalized to a `{message, status?}` shaped [`ApiError`]

pub mod client;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use client::{compose_url, resource_path, ApiClient};
pub use config::{ApiConfig, Deployment, DEFAULT_TIMEOUT};
pub use error::{ApiError, ConfigError};
pub use reqwest::Method;
