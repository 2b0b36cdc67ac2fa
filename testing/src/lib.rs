//! # Pocketbook Testing
//!
//! Testing utilities and helpers for the Pocketbook client.
//!
//! This crate provides:
//! - Mock implementations of environment traits and notification sinks
//! - A Given-When-Then harness for reducers
//! - Helpers that drive effects to completion without a store
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use pocketbook_testing::{helpers::collect_actions, ReducerTest};
//!
//! #[tokio::test]
//! async fn fetch_settles() {
//!     let mut state = InvestmentsState::default();
//!     let effects = InvestmentsReducer.reduce(&mut state, fetch_all(), &env);
//!     let actions = collect_actions(effects).await;
//!     assert!(matches!(actions[0], InvestmentsAction::FetchAll(AsyncPhase::Fulfilled(_))));
//! }
//! ```

use chrono::{DateTime, Utc};
use pocketbook_core::environment::Clock;

/// Ergonomic reducer testing
pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use pocketbook_runtime::NotificationSink;
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use pocketbook_testing::mocks::FixedClock;
    /// use pocketbook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Notification sink that records every message it receives
    ///
    /// Clones share the same record, so keep one clone for assertions and
    /// hand the other to the `ErrorReporter`.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingSink {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Messages received so far, in delivery order
        #[must_use]
        pub fn messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of messages received so far
        #[must_use]
        pub fn count(&self) -> usize {
            self.messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, message: &str) {
            self.messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_string());
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use pocketbook_core::effect::Effect;

    /// Run effects to completion and collect the actions they feed back
    ///
    /// Futures are awaited, `Parallel` and `Sequential` children run in
    /// order, and `Delay` actions are returned immediately without sleeping.
    /// Returned actions are not reduced.
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(run_effect(effect).await);
        }
        actions
    }

    fn run_effect<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
        async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Delay { action, .. } => vec![*action],
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    let mut actions = Vec::new();
                    for effect in effects {
                        actions.extend(run_effect(effect).await);
                    }
                    actions
                },
            }
        }
        .boxed()
    }

    /// Install a test-friendly tracing subscriber
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, RecordingSink};
