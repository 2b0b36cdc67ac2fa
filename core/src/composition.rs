//! Reducer composition utilities
//!
//! A root reducer owns the whole application state and one action enum with a
//! variant per slice. [`scope_reducer`] lets each slice reducer keep its own
//! state and action types: it focuses the child on its sub-state and embeds the
//! actions produced by the child's effects back into the parent action.
//!
//! # Examples
//!
//! ```
//! use pocketbook_core::{smallvec, Effect, Reducer, SmallVec};
//! use pocketbook_core::composition::scope_reducer;
//!
//! #[derive(Clone, Default)]
//! struct PreferencesState {
//!     dark_mode: bool,
//! }
//!
//! enum PreferencesAction {
//!     ToggleDarkMode,
//! }
//!
//! struct PreferencesReducer;
//!
//! impl Reducer for PreferencesReducer {
//!     type State = PreferencesState;
//!     type Action = PreferencesAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Self::State,
//!         action: Self::Action,
//!         _env: &Self::Environment,
//!     ) -> SmallVec<[Effect<Self::Action>; 4]> {
//!         match action {
//!             PreferencesAction::ToggleDarkMode => state.dark_mode = !state.dark_mode,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct AppState {
//!     preferences: PreferencesState,
//! }
//!
//! enum AppAction {
//!     Preferences(PreferencesAction),
//! }
//!
//! let scoped = scope_reducer(
//!     PreferencesReducer,
//!     |app: &mut AppState| &mut app.preferences,
//!     AppAction::Preferences,
//! );
//!
//! let mut state = AppState::default();
//! let _effects = scoped.reduce(&mut state, PreferencesAction::ToggleDarkMode, &());
//! assert!(state.preferences.dark_mode);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Focus `reducer` on a sub-state of `S` and embed its actions into `A`.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `A`: The parent action type
/// - `R`: The child reducer
#[must_use]
pub fn scope_reducer<S, A, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    embed: fn(R::Action) -> A,
) -> ScopedReducer<S, A, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        embed,
    }
}

/// A child reducer bound to a parent state and action type.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    embed: fn(R::Action) -> A,
}

impl<S, A, R> ScopedReducer<S, A, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    /// Run the child reducer on its sub-state and lift its effects
    pub fn reduce(
        &self,
        parent: &mut S,
        action: R::Action,
        env: &R::Environment,
    ) -> SmallVec<[Effect<A>; 4]> {
        let sub_state = (self.state)(parent);
        self.reducer
            .reduce(sub_state, action, env)
            .into_iter()
            .filter(|effect| !effect.is_none())
            .map(|effect| effect.map(self.embed))
            .collect()
    }

    /// The wrapped child reducer
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.reducer
    }
}

impl<S, A, R> Clone for ScopedReducer<S, A, R>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            state: self.state,
            embed: self.embed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Default)]
    struct SubState {
        value: i32,
    }

    #[derive(Debug, PartialEq)]
    enum SubAction {
        Add(i32),
        Echo,
    }

    struct SubReducer;

    impl Reducer for SubReducer {
        type State = SubState;
        type Action = SubAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SubAction::Add(n) => {
                    state.value += n;
                    smallvec![Effect::None]
                },
                SubAction::Echo => smallvec![Effect::future(async { Some(SubAction::Add(1)) })],
            }
        }
    }

    #[derive(Default)]
    struct ParentState {
        sub: SubState,
        other: String,
    }

    #[derive(Debug, PartialEq)]
    enum ParentAction {
        Sub(SubAction),
    }

    #[test]
    fn scoped_reducer_only_touches_sub_state() {
        let scoped = scope_reducer(SubReducer, |p: &mut ParentState| &mut p.sub, ParentAction::Sub);

        let mut state = ParentState {
            sub: SubState { value: 5 },
            other: "test".to_string(),
        };

        let effects = scoped.reduce(&mut state, SubAction::Add(3), &());
        assert_eq!(state.sub.value, 8);
        assert_eq!(state.other, "test");
        assert!(effects.is_empty());
    }

    #[tokio::test]
    async fn scoped_reducer_embeds_feedback_actions() {
        let scoped = scope_reducer(SubReducer, |p: &mut ParentState| &mut p.sub, ParentAction::Sub);
        let mut state = ParentState::default();

        let mut effects = scoped.reduce(&mut state, SubAction::Echo, &());
        assert_eq!(effects.len(), 1);
        let Some(Effect::Future(fut)) = effects.pop() else {
            unreachable!("echo must produce a future effect");
        };
        assert_eq!(fut.await, Some(ParentAction::Sub(SubAction::Add(1))));
    }
}
