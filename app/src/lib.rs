//! # Pocketbook
//!
//! Client-side state for the Pocketbook personal-finance app.
//!
//! Every server interaction is a three-phase async action
//! ([`AsyncPhase`](pocketbook_core::AsyncPhase)): the slice reducer marks the
//! request as loading on `Pending`, an effect performs the HTTP call, and the
//! settled `Fulfilled` or `Rejected` phase is fed back to update the slice.
//!
//! ## Slices
//!
//! - [`session`]: sign-in, sign-out, bearer token
//! - [`preferences`]: theme
//! - [`investments`]: fixed and variable income positions
//! - [`open_finance`]: institution search and linked bank items
//! - [`transactions`]: booked transactions
//!
//! [`app::AppReducer`] composes them; run it in a
//! [`Store`](pocketbook_runtime::Store) with an
//! [`ErrorReporter`](pocketbook_runtime::ErrorReporter) so that every rejection
//! produces exactly one user notification.
//!
//! ## Example
//!
//! ```no_run
//! use pocketbook::{AppAction, AppConfig, AppEnvironment, AppReducer, AppState};
//! use pocketbook::session::SessionAction;
//! use pocketbook_runtime::{ErrorReporter, Store, TracingSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = AppEnvironment::from_config(&AppConfig::from_env()?);
//! let store = Store::new(AppState::default(), AppReducer::new(), env)
//!     .with_middleware(ErrorReporter::new(TracingSink));
//!
//! let mut handle = store
//!     .send(AppAction::Session(SessionAction::login("ana@example.com", "secret")))
//!     .await?;
//! handle.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod environment;
pub mod investments;
pub mod open_finance;
pub mod persistence;
pub mod preferences;
pub mod session;
pub mod transactions;
pub mod types;

pub use app::{AppAction, AppReducer, AppState};
pub use config::AppConfig;
pub use environment::{AppEnvironment, Credentials};
pub use persistence::{FileStorage, MemoryStorage, PersistedState, StateStorage, StorageError};
pub use types::{Money, UserProfile};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::environment::AppEnvironment;
    use crate::persistence::{MemoryStorage, StateStorage};
    use pocketbook_api::{ApiClient, ApiConfig};
    use std::sync::Arc;
    use std::time::Duration;

    /// Environment pointing at a closed local port with in-memory storage
    pub fn test_env() -> AppEnvironment {
        test_env_with_storage(Arc::new(MemoryStorage::new()))
    }

    pub fn test_env_with_storage(storage: Arc<dyn StateStorage>) -> AppEnvironment {
        let api = ApiClient::new(ApiConfig::new("http://127.0.0.1:9", Duration::from_secs(1)));
        AppEnvironment::new(api, storage).with_clock(Arc::new(pocketbook_testing::test_clock()))
    }
}
