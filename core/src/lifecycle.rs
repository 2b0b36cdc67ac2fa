//! Request lifecycle flags.
//!
//! A [`Lifecycle`] tracks one operation category of a slice (for example
//! "fetch/delete" or "create"). Slices keep one per independent track so that
//! a create in flight never clears the loading flag of a fetch.

use serde::{Deserialize, Serialize};

/// Loading flag and last error for one operation category.
///
/// - `begin` on dispatch: loading, error cleared
/// - `succeed` / `fail` on settlement: never left loading
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Whether a request of this category is in flight
    pub loading: bool,
    /// Message of the last failed attempt
    pub error: Option<String>,
    /// Whether this track has been dispatched at least once
    #[serde(default)]
    pub attempted: bool,
}

/// Observable status of a [`Lifecycle`]; exactly one applies at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// Nothing dispatched yet
    Idle,
    /// Request in flight
    Loading,
    /// Last attempt failed
    Failed,
    /// Last attempt succeeded (or its error was cleared)
    Settled,
}

impl Lifecycle {
    /// Create an idle lifecycle
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loading: false,
            error: None,
            attempted: false,
        }
    }

    /// Pending transition: set loading, clear the previous error
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.attempted = true;
    }

    /// Fulfilled transition
    pub fn succeed(&mut self) {
        self.loading = false;
    }

    /// Rejected transition
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Drop the stored error without touching the loading flag
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The last error message, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Derive the current status
    #[must_use]
    pub const fn status(&self) -> LifecycleStatus {
        if self.loading {
            LifecycleStatus::Loading
        } else if self.error.is_some() {
            LifecycleStatus::Failed
        } else if self.attempted {
            LifecycleStatus::Settled
        } else {
            LifecycleStatus::Idle
        }
    }
}

/// Outcome of a single request, matched exhaustively by consumers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus<T, E> {
    /// Not dispatched yet
    #[default]
    Idle,
    /// In flight
    Pending,
    /// Settled successfully
    Succeeded(T),
    /// Settled with a failure
    Failed(E),
}

impl<T, E> RequestStatus<T, E> {
    /// Whether the request is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// The success value, if settled successfully
    #[must_use]
    pub const fn succeeded(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            Self::Idle | Self::Pending | Self::Failed(_) => None,
        }
    }

    /// The failure value, if settled with a failure
    #[must_use]
    pub const fn failed(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Idle | Self::Pending | Self::Succeeded(_) => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for RequestStatus<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(error) => Self::Failed(error),
        }
    }
}
