//! Session slice: sign-in, sign-out and the bearer token.
//!
//! The token lives in [`SessionState`]. The reducer mirrors it into the shared
//! [`Credentials`](crate::environment::Credentials) and the API client in the
//! same step, so a request dispatched right after a sign-in is authorized.

use crate::environment::AppEnvironment;
use crate::types::UserProfile;
use pocketbook_core::{
    smallvec, AsyncPhase, Effect, Reducer, Rejection, ReportsRejection, RequestStatus, SmallVec,
};
use serde::{Deserialize, Serialize};

/// Fallback message for failed sign-ins
pub const LOGIN_ERROR: &str = "Unable to sign in";

/// Credentials submitted to `POST /auth/login`
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl LoginRequest {
    /// Creates a new `LoginRequest`
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful sign-in payload
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Signed-in user
    pub user: UserProfile,
}

/// Session state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Bearer token, absent when signed out
    pub token: Option<String>,
    /// Signed-in user
    pub user: Option<UserProfile>,
    /// Outcome of the last sign-in attempt
    pub login: RequestStatus<(), String>,
}

impl SessionState {
    /// Whether a token is present
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Message of the last failed sign-in
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.login.failed().map(String::as_str)
    }
}

/// Session actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionAction {
    /// Sign in
    Login(AsyncPhase<LoginRequest, LoginResponse>),
    /// Sign out and forget the token
    Logout,
    /// Adopt a token and user restored from storage
    Restore {
        /// Bearer token
        token: String,
        /// Signed-in user
        user: Option<UserProfile>,
    },
    /// Clear the last sign-in error
    ClearError,
}

impl SessionAction {
    /// Start a sign-in
    #[must_use]
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Login(AsyncPhase::Pending(LoginRequest::new(email, password)))
    }
}

impl ReportsRejection for SessionAction {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Login(phase) => phase.rejection(),
            Self::Logout | Self::Restore { .. } | Self::ClearError => None,
        }
    }
}

/// Reducer for the session slice
#[derive(Clone, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Mirror `token` into the credentials and the client
    fn store_token(env: &AppEnvironment, token: Option<&str>) {
        match token {
            Some(token) => {
                env.credentials.set(Some(token.to_string()));
                env.api.ensure_token(Some(token));
            },
            None => {
                env.credentials.clear();
                env.api.set_token(None);
            },
        }
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::Login(AsyncPhase::Pending(request)) => {
                state.login = RequestStatus::Pending;
                smallvec![env.request(
                    LOGIN_ERROR,
                    move |api| async move { api.post("/auth/login", &request).await },
                    SessionAction::Login,
                )]
            },
            SessionAction::Login(AsyncPhase::Fulfilled(response)) => {
                tracing::info!(user_id = %response.user.id, "Signed in");
                Self::store_token(env, Some(&response.token));
                state.login = RequestStatus::Succeeded(());
                state.token = Some(response.token);
                state.user = Some(response.user);
                smallvec![Effect::None]
            },
            SessionAction::Login(AsyncPhase::Rejected(rejection)) => {
                state.login = RequestStatus::Failed(rejection.message);
                smallvec![Effect::None]
            },
            SessionAction::Logout => {
                tracing::info!("Signed out");
                Self::store_token(env, None);
                *state = SessionState::default();
                smallvec![Effect::None]
            },
            SessionAction::Restore { token, user } => {
                Self::store_token(env, Some(&token));
                state.token = Some(token);
                state.user = user;
                smallvec![Effect::None]
            },
            SessionAction::ClearError => {
                if state.login.failed().is_some() {
                    state.login = RequestStatus::Idle;
                }
                smallvec![Effect::None]
            },
        }
    }
}
