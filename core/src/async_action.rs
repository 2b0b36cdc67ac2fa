//! Three-phase async actions.
//!
//! Every server interaction is modelled as one action variant carrying an
//! [`AsyncPhase`]. Dispatching `Pending(arg)` starts the request; the effect the
//! reducer returns feeds back exactly one `Fulfilled(result)` or
//! `Rejected(rejection)`. Reducers match the phases exhaustively instead of
//! comparing action-type strings.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a single async action dispatch.
///
/// # Type Parameters
///
/// - `Arg`: request payload supplied by the caller
/// - `Out`: typed success result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsyncPhase<Arg, Out> {
    /// Request dispatched; carries the request payload
    Pending(Arg),
    /// Request settled successfully
    Fulfilled(Out),
    /// Request settled with a failure
    Rejected(Rejection),
}

impl<Arg, Out> AsyncPhase<Arg, Out> {
    /// Build the settled phase from a request outcome
    pub fn settle<E>(result: Result<Out, E>, reject: impl FnOnce(E) -> Rejection) -> Self {
        match result {
            Ok(out) => Self::Fulfilled(out),
            Err(error) => Self::Rejected(reject(error)),
        }
    }
}

/// Failure value of an async action.
///
/// Carries the best available human-readable message and, when the failure
/// came from an HTTP response, its status code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// User-facing message
    pub message: String,
    /// HTTP status, absent for transport failures and timeouts
    pub status: Option<u16>,
}

impl Rejection {
    /// Create a rejection with a message and no status
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Attach an HTTP status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Build a rejection preferring `message`, falling back to `default` when blank
    #[must_use]
    pub fn from_error(message: &str, status: Option<u16>, default: &str) -> Self {
        let message = if message.trim().is_empty() {
            default.to_string()
        } else {
            message.to_string()
        };
        Self { message, status }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Actions that may carry a typed rejection.
///
/// The error-reporting middleware uses this to recognize failed async actions
/// without knowing the concrete action type.
pub trait ReportsRejection {
    /// The rejection carried by this action, if it is a `Rejected` phase
    fn rejection(&self) -> Option<&Rejection>;
}

impl<Arg, Out> ReportsRejection for AsyncPhase<Arg, Out> {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Pending(_) | Self::Fulfilled(_) => None,
        }
    }
}
