//! Error types for the Pocketbook API client

use thiserror::Error;

/// Errors that can occur when talking to the Pocketbook API
///
/// Every variant exposes the same `{message, status?}` shape through
/// [`ApiError::message`] and [`ApiError::status`]; only server responses carry
/// a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read
    #[error("{message}")]
    Transport {
        /// Underlying transport failure
        message: String,
    },

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("{message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Best available human-readable message
        message: String,
    },

    /// The request could not be built from the given path or body
    #[error("Request encoding failed: {message}")]
    Encode {
        /// What could not be encoded
        message: String,
    },

    /// A 2xx response body did not match the expected type
    #[error("Response parsing failed: {message}")]
    Decode {
        /// Parser error
        message: String,
    },
}

impl ApiError {
    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Transport { message } | Self::Server { message, .. } => message.clone(),
            Self::Timeout | Self::Encode { .. } | Self::Decode { .. } => self.to_string(),
        }
    }

    /// HTTP status, present only for server responses
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Timeout | Self::Encode { .. } | Self::Decode { .. } => {
                None
            },
        }
    }
}

/// Errors raised while reading API configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value
    #[error("Invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Rejected value
        value: String,
    },
}
