//! Open Finance slice: institution search and linked bank connections.
//!
//! Connector search is debounced. Each keystroke bumps `search_ticket` and
//! schedules a delayed [`OpenFinanceAction::SearchDebounced`] carrying the
//! ticket; only the one matching the latest ticket reaches the server.

use crate::environment::AppEnvironment;
use chrono::{DateTime, Utc};
use pocketbook_api::resource_path;
use pocketbook_core::{
    smallvec, AsyncPhase, Collection, Effect, Entity, Lifecycle, Reducer, Rejection,
    ReportsRejection, SmallVec,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

const CONNECTORS_PATH: &str = "/open-finance/connectors";
const CONNECTIONS_PATH: &str = "/open-finance/connections";

/// Fallback message for failed connector searches
pub const SEARCH_ERROR: &str = "Unable to search institutions";
/// Fallback message for failed connection fetches
pub const FETCH_ERROR: &str = "Unable to load connections";
/// Fallback message for failed connection creations
pub const CREATE_ERROR: &str = "Unable to connect account";
/// Fallback message for failed connection deletions
pub const DELETE_ERROR: &str = "Unable to remove connection";

/// A financial institution that can be linked
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// Provider id
    pub id: String,
    /// Display name
    pub name: String,
    /// Institution website
    #[serde(default)]
    pub institution_url: Option<String>,
    /// Logo
    #[serde(default)]
    pub image_url: Option<String>,
    /// ISO country code
    #[serde(default)]
    pub country: Option<String>,
    /// Provider category (personal bank, business bank, investment...)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Synchronization state of a linked item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Sync in progress
    Updating,
    /// Synced
    Updated,
    /// Credentials were refused by the institution
    LoginError,
    /// Sync is stale
    Outdated,
    /// Any status this client does not know
    #[serde(other)]
    Unknown,
}

/// A bank item linked through Open Finance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Server-assigned id
    pub id: String,
    /// Owning user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Institution this item belongs to
    pub connector_id: String,
    /// Synchronization state
    pub status: ConnectionStatus,
    /// Last successful sync
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Connection {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload for `POST /open-finance/connections`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnection {
    /// Institution being linked
    pub connector_id: String,
    /// Provider item created by the connect widget
    pub item_id: String,
}

/// Open Finance state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenFinanceState {
    /// Latest text typed into the search box
    pub search_query: String,
    /// Ticket of the latest query change
    pub search_ticket: u64,
    /// Results of the last settled search
    pub search_results: Vec<Connector>,
    /// Search track
    pub search: Lifecycle,
    /// Linked items
    pub connections: Collection<Connection>,
    /// Fetch and delete track
    pub loading: Lifecycle,
    /// Create track
    pub create: Lifecycle,
}

/// Open Finance actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenFinanceAction {
    /// The search box changed
    SearchQueryChanged {
        /// New text
        query: String,
    },
    /// The debounce window for `ticket` elapsed
    SearchDebounced {
        /// Text at the time of the change
        query: String,
        /// Ticket issued by the change
        ticket: u64,
    },
    /// Search connectors by name
    SearchConnectors(AsyncPhase<String, Vec<Connector>>),
    /// Drop the search results
    ClearSearchResults,
    /// Fetch linked items
    FetchConnections(AsyncPhase<(), Vec<Connection>>),
    /// Link an item
    CreateConnection(AsyncPhase<NewConnection, Connection>),
    /// Unlink an item by id
    DeleteConnection(AsyncPhase<String, String>),
    /// Clear the fetch/delete error
    ClearError,
    /// Clear the create error
    ClearCreateError,
    /// Clear the search error
    ClearSearchError,
}

impl OpenFinanceAction {
    /// Start a fetch of linked items
    #[must_use]
    pub const fn fetch_connections() -> Self {
        Self::FetchConnections(AsyncPhase::Pending(()))
    }

    /// Report a search box change
    #[must_use]
    pub fn query_changed(query: impl Into<String>) -> Self {
        Self::SearchQueryChanged {
            query: query.into(),
        }
    }
}

impl ReportsRejection for OpenFinanceAction {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::SearchConnectors(phase) => phase.rejection(),
            Self::FetchConnections(phase) => phase.rejection(),
            Self::CreateConnection(phase) => phase.rejection(),
            Self::DeleteConnection(phase) => phase.rejection(),
            Self::SearchQueryChanged { .. }
            | Self::SearchDebounced { .. }
            | Self::ClearSearchResults
            | Self::ClearError
            | Self::ClearCreateError
            | Self::ClearSearchError => None,
        }
    }
}

/// Reducer for the Open Finance slice
#[derive(Clone, Debug, Default)]
pub struct OpenFinanceReducer;

impl Reducer for OpenFinanceReducer {
    type State = OpenFinanceState;
    type Action = OpenFinanceAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Search ==========
            OpenFinanceAction::SearchQueryChanged { query } => {
                state.search_query.clone_from(&query);
                state.search_ticket += 1;
                smallvec![Effect::delay(
                    env.search_debounce,
                    OpenFinanceAction::SearchDebounced {
                        query,
                        ticket: state.search_ticket,
                    },
                )]
            },
            OpenFinanceAction::SearchDebounced { query, ticket } => {
                if ticket != state.search_ticket {
                    tracing::trace!(ticket, current = state.search_ticket, "Dropping stale search");
                    return smallvec![Effect::None];
                }
                let query = query.trim().to_string();
                if query.is_empty() {
                    state.search_results.clear();
                    return smallvec![Effect::None];
                }
                self.reduce(
                    state,
                    OpenFinanceAction::SearchConnectors(AsyncPhase::Pending(query)),
                    env,
                )
            },
            OpenFinanceAction::SearchConnectors(AsyncPhase::Pending(query)) => {
                state.search.begin();
                smallvec![env.request(
                    SEARCH_ERROR,
                    move |api| async move {
                        api.get_with_query(CONNECTORS_PATH, &[("name", query)]).await
                    },
                    OpenFinanceAction::SearchConnectors,
                )]
            },
            OpenFinanceAction::SearchConnectors(AsyncPhase::Fulfilled(results)) => {
                state.search.succeed();
                state.search_results = results;
                smallvec![Effect::None]
            },
            OpenFinanceAction::SearchConnectors(AsyncPhase::Rejected(rejection)) => {
                state.search.fail(rejection.message);
                smallvec![Effect::None]
            },
            OpenFinanceAction::ClearSearchResults => {
                state.search_results.clear();
                smallvec![Effect::None]
            },

            // ========== Connections ==========
            OpenFinanceAction::FetchConnections(AsyncPhase::Pending(())) => {
                state.loading.begin();
                smallvec![env.request(
                    FETCH_ERROR,
                    |api| async move { api.get(CONNECTIONS_PATH).await },
                    OpenFinanceAction::FetchConnections,
                )]
            },
            OpenFinanceAction::FetchConnections(AsyncPhase::Fulfilled(connections)) => {
                state.loading.succeed();
                state.connections.replace_all(connections);
                smallvec![Effect::None]
            },
            OpenFinanceAction::CreateConnection(AsyncPhase::Pending(payload)) => {
                state.create.begin();
                smallvec![env.request(
                    CREATE_ERROR,
                    move |api| async move { api.post(CONNECTIONS_PATH, &payload).await },
                    OpenFinanceAction::CreateConnection,
                )]
            },
            OpenFinanceAction::CreateConnection(AsyncPhase::Fulfilled(connection)) => {
                state.create.succeed();
                state.connections.append(connection);
                smallvec![Effect::None]
            },
            OpenFinanceAction::CreateConnection(AsyncPhase::Rejected(rejection)) => {
                state.create.fail(rejection.message);
                smallvec![Effect::None]
            },
            OpenFinanceAction::DeleteConnection(AsyncPhase::Pending(id)) => {
                state.loading.begin();
                smallvec![env.request(
                    DELETE_ERROR,
                    move |api| async move {
                        let path = resource_path(CONNECTIONS_PATH, &id)?;
                        api.delete::<IgnoredAny>(&path).await.map(|_| id)
                    },
                    OpenFinanceAction::DeleteConnection,
                )]
            },
            OpenFinanceAction::DeleteConnection(AsyncPhase::Fulfilled(id)) => {
                state.loading.succeed();
                state.connections.remove(&id);
                smallvec![Effect::None]
            },
            OpenFinanceAction::FetchConnections(AsyncPhase::Rejected(rejection))
            | OpenFinanceAction::DeleteConnection(AsyncPhase::Rejected(rejection)) => {
                state.loading.fail(rejection.message);
                smallvec![Effect::None]
            },

            // ========== Errors ==========
            OpenFinanceAction::ClearError => {
                state.loading.clear_error();
                smallvec![Effect::None]
            },
            OpenFinanceAction::ClearCreateError => {
                state.create.clear_error();
                smallvec![Effect::None]
            },
            OpenFinanceAction::ClearSearchError => {
                state.search.clear_error();
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_env;
    use pocketbook_testing::{assertions, ReducerTest};

    fn connector(id: &str, name: &str) -> Connector {
        Connector {
            id: id.to_string(),
            name: name.to_string(),
            institution_url: None,
            image_url: None,
            country: Some("BR".to_string()),
            kind: Some("PERSONAL_BANK".to_string()),
        }
    }

    fn connection(id: &str) -> Connection {
        Connection {
            id: id.to_string(),
            owner_id: None,
            connector_id: "201".to_string(),
            status: ConnectionStatus::Updated,
            last_synced_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn query_change_bumps_ticket_and_schedules_debounce() {
        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(OpenFinanceState {
                search_ticket: 4,
                ..OpenFinanceState::default()
            })
            .when_action(OpenFinanceAction::query_changed("nub"))
            .then_state(|state| {
                assert_eq!(state.search_query, "nub");
                assert_eq!(state.search_ticket, 5);
                assert!(!state.search.is_loading());
            })
            .then_effects(|effects| {
                assertions::assert_no_future_effect(effects);
                assertions::assert_has_delay_effect(effects, |action| {
                    *action
                        == OpenFinanceAction::SearchDebounced {
                            query: "nub".to_string(),
                            ticket: 5,
                        }
                });
            })
            .run();
    }

    #[test]
    fn stale_debounce_is_dropped() {
        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(OpenFinanceState {
                search_query: "nuba".to_string(),
                search_ticket: 7,
                ..OpenFinanceState::default()
            })
            .when_action(OpenFinanceAction::SearchDebounced {
                query: "nub".to_string(),
                ticket: 6,
            })
            .then_state(|state| assert!(!state.search.is_loading()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn current_debounce_starts_search() {
        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(OpenFinanceState {
                search_ticket: 2,
                ..OpenFinanceState::default()
            })
            .when_action(OpenFinanceAction::SearchDebounced {
                query: " itau ".to_string(),
                ticket: 2,
            })
            .then_state(|state| assert!(state.search.is_loading()))
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn blank_debounce_clears_results() {
        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(OpenFinanceState {
                search_ticket: 1,
                search_results: vec![connector("1", "Itau")],
                ..OpenFinanceState::default()
            })
            .when_action(OpenFinanceAction::SearchDebounced {
                query: "   ".to_string(),
                ticket: 1,
            })
            .then_state(|state| {
                assert!(state.search_results.is_empty());
                assert!(!state.search.is_loading());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn search_fulfilled_replaces_results() {
        let mut state = OpenFinanceState {
            search_results: vec![connector("1", "Itau")],
            ..OpenFinanceState::default()
        };
        state.search.begin();

        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(OpenFinanceAction::SearchConnectors(AsyncPhase::Fulfilled(vec![
                connector("2", "Nubank"),
            ])))
            .then_state(|state| {
                assert_eq!(state.search_results, vec![connector("2", "Nubank")]);
                assert!(!state.search.is_loading());
            })
            .run();
    }

    #[test]
    fn search_track_is_independent() {
        let mut state = OpenFinanceState::default();
        state.loading.begin();

        ReducerTest::new(OpenFinanceReducer)
            .with_env(test_env())
            .given_state(state)
            .when_action(OpenFinanceAction::SearchConnectors(AsyncPhase::Rejected(
                Rejection::new(SEARCH_ERROR),
            )))
            .then_state(|state| {
                assert_eq!(state.search.error(), Some(SEARCH_ERROR));
                assert!(state.loading.is_loading());
                assert_eq!(state.loading.error(), None);
            })
            .run();
    }

    #[test]
    fn create_and_delete_connections() {
        let mut state = OpenFinanceState {
            connections: Collection::from(vec![connection("a")]),
            ..OpenFinanceState::default()
        };
        let env = test_env();

        let _ = OpenFinanceReducer.reduce(
            &mut state,
            OpenFinanceAction::CreateConnection(AsyncPhase::Fulfilled(connection("b"))),
            &env,
        );
        let _ = OpenFinanceReducer.reduce(
            &mut state,
            OpenFinanceAction::DeleteConnection(AsyncPhase::Fulfilled("a".to_string())),
            &env,
        );

        let ids: Vec<&str> = state.connections.iter().map(Entity::id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn unknown_connection_status_is_tolerated() {
        let json = r#"{"id":"c1","connectorId":"201","status":"WAITING_USER_INPUT"}"#;
        let parsed: Option<Connection> = serde_json::from_str(json).ok();
        assert_eq!(parsed.map(|c| c.status), Some(ConnectionStatus::Unknown));
    }
}
