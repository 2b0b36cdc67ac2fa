//! Root state, action and reducer.
//!
//! [`AppReducer`] routes each [`AppAction`] to its slice reducer through a
//! [`ScopedReducer`] and adds the cross-slice behavior:
//!
//! - session and preferences changes are persisted
//! - signing out drops every domain collection

use crate::environment::AppEnvironment;
use crate::investments::{InvestmentsAction, InvestmentsReducer, InvestmentsState};
use crate::open_finance::{OpenFinanceAction, OpenFinanceReducer, OpenFinanceState};
use crate::persistence::{persist_effect, PersistedState};
use crate::preferences::{PreferencesAction, PreferencesReducer, PreferencesState};
use crate::session::{SessionAction, SessionReducer, SessionState};
use crate::transactions::{TransactionsAction, TransactionsReducer, TransactionsState};
use pocketbook_core::composition::{scope_reducer, ScopedReducer};
use pocketbook_core::{Effect, Reducer, Rejection, ReportsRejection, SmallVec};

/// Whole client state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    /// Session slice
    pub session: SessionState,
    /// Preferences slice
    pub preferences: PreferencesState,
    /// Investments slice
    pub investments: InvestmentsState,
    /// Open Finance slice
    pub open_finance: OpenFinanceState,
    /// Transactions slice
    pub transactions: TransactionsState,
}

impl AppState {
    /// Build the startup state from a persisted snapshot
    ///
    /// Only session and preferences are restored; domain collections start
    /// empty and are refetched.
    #[must_use]
    pub fn rehydrate(persisted: PersistedState) -> Self {
        Self {
            session: SessionState {
                token: persisted.session.token,
                user: persisted.session.user,
                ..SessionState::default()
            },
            preferences: persisted.preferences,
            ..Self::default()
        }
    }

    fn clear_domain(&mut self) {
        self.investments = InvestmentsState::default();
        self.open_finance = OpenFinanceState::default();
        self.transactions = TransactionsState::default();
    }
}

/// Root action: one variant per slice
#[derive(Clone, Debug, PartialEq)]
pub enum AppAction {
    /// Session action
    Session(SessionAction),
    /// Preferences action
    Preferences(PreferencesAction),
    /// Investments action
    Investments(InvestmentsAction),
    /// Open Finance action
    OpenFinance(OpenFinanceAction),
    /// Transactions action
    Transactions(TransactionsAction),
}

impl From<SessionAction> for AppAction {
    fn from(action: SessionAction) -> Self {
        Self::Session(action)
    }
}

impl From<PreferencesAction> for AppAction {
    fn from(action: PreferencesAction) -> Self {
        Self::Preferences(action)
    }
}

impl From<InvestmentsAction> for AppAction {
    fn from(action: InvestmentsAction) -> Self {
        Self::Investments(action)
    }
}

impl From<OpenFinanceAction> for AppAction {
    fn from(action: OpenFinanceAction) -> Self {
        Self::OpenFinance(action)
    }
}

impl From<TransactionsAction> for AppAction {
    fn from(action: TransactionsAction) -> Self {
        Self::Transactions(action)
    }
}

impl ReportsRejection for AppAction {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Session(action) => action.rejection(),
            Self::Preferences(_) => None,
            Self::Investments(action) => action.rejection(),
            Self::OpenFinance(action) => action.rejection(),
            Self::Transactions(action) => action.rejection(),
        }
    }
}

/// Root reducer composing the slice reducers
#[derive(Clone)]
pub struct AppReducer {
    session: ScopedReducer<AppState, AppAction, SessionReducer>,
    preferences: ScopedReducer<AppState, AppAction, PreferencesReducer>,
    investments: ScopedReducer<AppState, AppAction, InvestmentsReducer>,
    open_finance: ScopedReducer<AppState, AppAction, OpenFinanceReducer>,
    transactions: ScopedReducer<AppState, AppAction, TransactionsReducer>,
}

impl AppReducer {
    /// Creates a new `AppReducer`
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: scope_reducer(SessionReducer, |s: &mut AppState| &mut s.session, AppAction::Session),
            preferences: scope_reducer(
                PreferencesReducer,
                |s: &mut AppState| &mut s.preferences,
                AppAction::Preferences,
            ),
            investments: scope_reducer(
                InvestmentsReducer,
                |s: &mut AppState| &mut s.investments,
                AppAction::Investments,
            ),
            open_finance: scope_reducer(
                OpenFinanceReducer,
                |s: &mut AppState| &mut s.open_finance,
                AppAction::OpenFinance,
            ),
            transactions: scope_reducer(
                TransactionsReducer,
                |s: &mut AppState| &mut s.transactions,
                AppAction::Transactions,
            ),
        }
    }

    /// Append a save of the whitelisted slices if they changed
    ///
    /// Runs under the store's write lock, so sequences follow state order.
    fn persist_if_changed(
        before: &PersistedState,
        state: &AppState,
        env: &AppEnvironment,
        effects: &mut SmallVec<[Effect<AppAction>; 4]>,
    ) {
        let after = PersistedState::capture(state);
        if after.content_differs(before) {
            effects.push(persist_effect(
                env.storage.clone(),
                after
                    .saved_at(env.clock.now())
                    .with_sequence(env.next_save_sequence()),
            ));
        }
    }
}

impl Default for AppReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppReducer").finish_non_exhaustive()
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::Session(action) => {
                let before = PersistedState::capture(state);
                let signing_out = matches!(action, SessionAction::Logout);

                let mut effects = self.session.reduce(state, action, env);
                if signing_out {
                    state.clear_domain();
                }
                Self::persist_if_changed(&before, state, env, &mut effects);
                effects
            },
            AppAction::Preferences(action) => {
                let before = PersistedState::capture(state);
                let mut effects = self.preferences.reduce(state, action, env);
                Self::persist_if_changed(&before, state, env, &mut effects);
                effects
            },
            AppAction::Investments(action) => self.investments.reduce(state, action, env),
            AppAction::OpenFinance(action) => self.open_finance.reduce(state, action, env),
            AppAction::Transactions(action) => self.transactions.reduce(state, action, env),
        }
    }
}
