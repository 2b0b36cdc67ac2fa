//! Given-When-Then harness for slice reducers.
//!
//! Runs one action through a reducer without a store, then checks the
//! resulting state and the effects it asked for. Effects are never executed.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use pocketbook_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// A slice test checks the `Pending` phase marks the slice as loading and
/// starts exactly one request effect:
///
/// ```ignore
/// use pocketbook_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(TransactionsReducer)
///     .with_env(test_env())
///     .given_state(TransactionsState::default())
///     .when_action(TransactionsAction::fetch_all())
///     .then_state(|state| assert!(state.loading.is_loading()))
///     .then_effects(|effects| {
///         assertions::assert_effects_count(effects, 1);
///         assertions::assert_has_future_effect(effects);
///     })
///     .run();
/// ```
///
/// Settled phases usually produce no effects:
///
/// ```ignore
/// ReducerTest::new(PreferencesReducer)
///     .with_env(test_env())
///     .given_state(PreferencesState::default())
///     .when_action(PreferencesAction::SetTheme(Theme::Dark))
///     .then_state(|state| assert_eq!(state.theme, Theme::Dark))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Clone,
    A: Clone,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        // Execute reducer
        let effects = self.reducer.reduce(&mut state, action, &env);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        // Run effect assertions
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use pocketbook_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain a `Delay` effect dispatching a matching action
    ///
    /// # Panics
    ///
    /// Panics if no matching `Delay` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A, F>(effects: &[Effect<A>], predicate: F)
    where
        F: Fn(&A) -> bool,
    {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Delay { action, .. } if predicate(action))),
            "Expected a matching Delay effect, but none found"
        );
    }

    /// Assert that no effect is a `Future` (no request was started)
    ///
    /// # Panics
    ///
    /// Panics if a Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            !effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected no Future effect, but found one"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketbook_core::effect::Effect;
    use pocketbook_core::reducer::Reducer;
    use pocketbook_core::{smallvec, AsyncPhase, Lifecycle, Rejection, SmallVec};
    use std::time::Duration;

    #[derive(Clone, Debug, Default)]
    struct AccountsState {
        names: Vec<String>,
        loading: Lifecycle,
    }

    #[derive(Clone, Debug)]
    enum AccountsAction {
        Load(AsyncPhase<(), Vec<String>>),
        Refresh,
    }

    struct AccountsReducer;

    struct NoEnv;

    impl Reducer for AccountsReducer {
        type State = AccountsState;
        type Action = AccountsAction;
        type Environment = NoEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                AccountsAction::Load(AsyncPhase::Pending(())) => {
                    state.loading.begin();
                    smallvec![Effect::future(async {
                        Some(AccountsAction::Load(AsyncPhase::Fulfilled(vec![
                            "checking".to_string(),
                        ])))
                    })]
                },
                AccountsAction::Load(AsyncPhase::Fulfilled(names)) => {
                    state.loading.succeed();
                    state.names = names;
                    smallvec![Effect::None]
                },
                AccountsAction::Load(AsyncPhase::Rejected(rejection)) => {
                    state.loading.fail(rejection.message);
                    smallvec![Effect::None]
                },
                AccountsAction::Refresh => smallvec![Effect::delay(
                    Duration::from_millis(10),
                    AccountsAction::Load(AsyncPhase::Pending(()))
                )],
            }
        }
    }

    #[test]
    fn pending_phase_starts_one_request() {
        ReducerTest::new(AccountsReducer)
            .with_env(NoEnv)
            .given_state(AccountsState::default())
            .when_action(AccountsAction::Load(AsyncPhase::Pending(())))
            .then_state(|state| assert!(state.loading.is_loading()))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn rejected_phase_keeps_names_and_records_error() {
        ReducerTest::new(AccountsReducer)
            .with_env(NoEnv)
            .given_state(AccountsState {
                names: vec!["savings".to_string()],
                loading: Lifecycle::new(),
            })
            .when_action(AccountsAction::Load(AsyncPhase::Rejected(Rejection::new(
                "Unable to load accounts",
            ))))
            .then_state(|state| {
                assert_eq!(state.names, vec!["savings".to_string()]);
                assert_eq!(state.loading.error(), Some("Unable to load accounts"));
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<AccountsAction>(&[Effect::None]);
        assertions::assert_no_effects::<AccountsAction>(&[]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[Effect::<AccountsAction>::None], 1);
        assertions::assert_effects_count::<AccountsAction>(&[], 0);
    }

    #[test]
    fn refresh_schedules_delayed_load_without_request() {
        ReducerTest::new(AccountsReducer)
            .with_env(NoEnv)
            .given_state(AccountsState::default())
            .when_action(AccountsAction::Refresh)
            .then_state(|state| assert!(!state.loading.is_loading()))
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects, |a| {
                    matches!(a, AccountsAction::Load(AsyncPhase::Pending(())))
                });
                assertions::assert_no_future_effect(effects);
            })
            .run();
    }
}
