//! Injected dependencies shared by every slice reducer.

use crate::config::AppConfig;
use crate::persistence::{FileStorage, StateStorage};
use pocketbook_api::{ApiClient, ApiError};
use pocketbook_core::environment::{Clock, SystemClock};
use pocketbook_core::{AsyncPhase, Effect, Rejection};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Default debounce window for connector search
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// Shared handle to the current session token
///
/// Written by the session reducer on sign-in, sign-out and restore; read right
/// before each request to keep the API client authorized.
#[derive(Clone, Debug, Default)]
pub struct Credentials(Arc<RwLock<Option<String>>>);

impl Credentials {
    /// Create an empty credential handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the token
    pub fn set(&self, token: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Forget the token
    pub fn clear(&self) {
        self.set(None);
    }
}

/// Environment for the application reducers
#[derive(Clone)]
pub struct AppEnvironment {
    /// HTTP client for the Pocketbook API
    pub api: ApiClient,
    /// Session token source
    pub credentials: Credentials,
    /// Persistence backend for the whitelisted state
    pub storage: Arc<dyn StateStorage>,
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
    /// Quiet period before a connector search is sent
    pub search_debounce: Duration,
    /// Last sequence handed to a persisted snapshot
    save_sequence: Arc<AtomicU64>,
}

impl AppEnvironment {
    /// Creates a new `AppEnvironment`
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn StateStorage>) -> Self {
        Self {
            api,
            credentials: Credentials::new(),
            storage,
            clock: Arc::new(SystemClock),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            save_sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build the production environment from configuration
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ApiClient::new(config.api.clone()),
            Arc::new(FileStorage::new(config.state_path.clone())),
        )
        .with_search_debounce(config.search_debounce)
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the search debounce window
    #[must_use]
    pub const fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Next snapshot sequence, strictly increasing across clones
    #[must_use]
    pub fn next_save_sequence(&self) -> u64 {
        self.save_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Copy the current credential into the API client if it changed
    pub fn ensure_token(&self) {
        self.api.ensure_token(self.credentials.token().as_deref());
    }

    /// Describe one API call as an async-action effect
    ///
    /// The effect ensures the token, runs `call` once and feeds back the
    /// settled phase built by `embed`. Failures become a [`Rejection`] whose
    /// message falls back to `default_error`.
    pub fn request<Arg, Out, A, F, Fut>(
        &self,
        default_error: &'static str,
        call: F,
        embed: fn(AsyncPhase<Arg, Out>) -> A,
    ) -> Effect<A>
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Out, ApiError>> + Send + 'static,
        Arg: 'static,
        Out: 'static,
        A: Send + 'static,
    {
        let env = self.clone();
        Effect::future(async move {
            env.ensure_token();
            let result = call(env.api.clone()).await;
            Some(embed(AsyncPhase::settle(result, |error| {
                rejection(&error, default_error)
            })))
        })
    }
}

impl std::fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("api", &self.api)
            .field("search_debounce", &self.search_debounce)
            .finish_non_exhaustive()
    }
}

/// Convert a client error into an action rejection
#[must_use]
pub fn rejection(error: &ApiError, default_error: &str) -> Rejection {
    Rejection::from_error(&error.message(), error.status(), default_error)
}
