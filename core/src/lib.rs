//! # Pocketbook Core
//!
//! Core traits and types for the Pocketbook client architecture.
//!
//! This crate provides the pure abstractions that sit between UI screens and the
//! remote REST API: reducers that own every state mutation, effect descriptions
//! that perform the network calls, and the request-lifecycle vocabulary shared
//! by all domain slices.
//!
//! ## Core Concepts
//!
//! - **State**: One slice of client state (a domain collection plus lifecycle flags)
//! - **Action**: All possible inputs to a reducer, including the three phases of
//!   every async action (`Pending`, `Fulfilled`, `Rejected`)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (API client, clock, storage)
//!
//! ## Example
//!
//! ```ignore
//! use pocketbook_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct ItemsState {
//!     items: Collection<Item>,
//!     loading: Lifecycle,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ItemsAction {
//!     FetchAll(AsyncPhase<(), Vec<Item>>),
//! }
//!
//! impl Reducer for ItemsReducer {
//!     type State = ItemsState;
//!     type Action = ItemsAction;
//!     type Environment = ItemsEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ItemsState,
//!         action: ItemsAction,
//!         env: &ItemsEnvironment,
//!     ) -> SmallVec<[Effect<ItemsAction>; 4]> {
//!         match action {
//!             ItemsAction::FetchAll(AsyncPhase::Pending(())) => {
//!                 state.loading.begin();
//!                 smallvec![fetch_items(env)]
//!             }
//!             // ...
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Async-action phases and typed rejections
pub mod async_action;

/// Entity collections with unique ids
pub mod collection;

/// Reducer composition utilities
pub mod composition;

/// Request lifecycle flags and request outcomes
pub mod lifecycle;

pub use async_action::{AsyncPhase, Rejection, ReportsRejection};
pub use effect::Effect;
pub use reducer::Reducer;
pub use collection::{Collection, Entity};
pub use lifecycle::{Lifecycle, LifecycleStatus, RequestStatus};

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They are the only place where slice state changes, and they are
/// deterministic and testable without a network.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed by the store
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (debounce windows)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async block as an `Effect::Future`
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Dispatch `action` after `duration`
        #[must_use]
        pub fn delay(duration: Duration, action: Action) -> Effect<Action> {
            Effect::Delay {
                duration,
                action: Box::new(action),
            }
        }

        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Embed the actions this effect produces into a parent action type
        ///
        /// Used when a slice reducer runs inside the root reducer: the slice's
        /// feedback actions must come back wrapped in the root action.
        #[must_use]
        pub fn map<Parent>(self, embed: fn(Action) -> Parent) -> Effect<Parent>
        where
            Action: Send + 'static,
            Parent: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map(embed)).collect())
                },
                Effect::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map(embed)).collect())
                },
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(embed(*action)),
                },
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(embed) })),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation of [`Clock`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
