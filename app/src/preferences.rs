//! User preferences slice.

use crate::environment::AppEnvironment;
use pocketbook_core::{smallvec, Effect, Reducer, SmallVec};
use serde::{Deserialize, Serialize};

/// Color theme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light appearance
    Light,
    /// Dark appearance
    Dark,
    /// Follow the operating system
    #[default]
    System,
}

/// Preferences state (persisted)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesState {
    /// Selected theme
    #[serde(default)]
    pub theme: Theme,
}

/// Preferences actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreferencesAction {
    /// Select a theme
    SetTheme(Theme),
}

/// Reducer for the preferences slice
#[derive(Clone, Debug, Default)]
pub struct PreferencesReducer;

impl Reducer for PreferencesReducer {
    type State = PreferencesState;
    type Action = PreferencesAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            PreferencesAction::SetTheme(theme) => state.theme = theme,
        }
        smallvec![Effect::None]
    }
}
