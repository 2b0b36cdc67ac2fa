//! Transactions slice.

use crate::environment::AppEnvironment;
use crate::types::Money;
use chrono::{DateTime, NaiveDate, Utc};
use pocketbook_api::resource_path;
use pocketbook_core::{
    smallvec, AsyncPhase, Collection, Effect, Entity, Lifecycle, Reducer, Rejection,
    ReportsRejection, SmallVec,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

const TRANSACTIONS_PATH: &str = "/transactions";

/// Fallback message for failed fetches
pub const FETCH_ERROR: &str = "Unable to load transactions";
/// Fallback message for failed creations
pub const CREATE_ERROR: &str = "Unable to create transaction";
/// Fallback message for failed deletions
pub const DELETE_ERROR: &str = "Unable to delete transaction";

/// Direction of a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money in
    Income,
    /// Money out
    Expense,
    /// Movement between own accounts
    Transfer,
}

/// A booked transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server-assigned id
    pub id: String,
    /// Owning user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Account the transaction was booked on
    #[serde(default)]
    pub account_id: Option<String>,
    /// Free-text description
    pub description: String,
    /// Unsigned amount; the kind gives the direction
    pub amount: Money,
    /// Direction
    pub kind: TransactionKind,
    /// Category label
    #[serde(default)]
    pub category: Option<String>,
    /// When the transaction happened
    pub occurred_at: DateTime<Utc>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Amount with the sign implied by the kind; transfers count as zero
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Income => self.amount.abs(),
            TransactionKind::Expense => -self.amount.abs(),
            TransactionKind::Transfer => Money::ZERO,
        }
    }
}

impl Entity for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload for `POST /transactions`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Account to book on
    pub account_id: Option<String>,
    /// Free-text description
    pub description: String,
    /// Unsigned amount
    pub amount: Money,
    /// Direction
    pub kind: TransactionKind,
    /// Category label
    pub category: Option<String>,
    /// When the transaction happened
    pub occurred_at: DateTime<Utc>,
}

/// Optional query narrowing a fetch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this account
    pub account_id: Option<String>,
    /// First day included
    pub from: Option<NaiveDate>,
    /// Last day included
    pub to: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Narrow to one account
    #[must_use]
    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Narrow to a date range
    #[must_use]
    pub const fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Query-string pairs for the set fields, in a stable order
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(account_id) = &self.account_id {
            pairs.push(("account_id", account_id.clone()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_string()));
        }
        if let Some(to) = self.to {
            pairs.push(("to", to.to_string()));
        }
        pairs
    }
}

/// Transactions state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionsState {
    /// Loaded transactions
    pub transactions: Collection<Transaction>,
    /// Fetch and delete track
    pub loading: Lifecycle,
    /// Create track
    pub create: Lifecycle,
}

impl TransactionsState {
    /// Sum of signed amounts
    #[must_use]
    pub fn balance(&self) -> Money {
        self.transactions.iter().map(Transaction::signed_amount).sum()
    }
}

/// Transactions actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionsAction {
    /// Fetch transactions matching a filter
    FetchAll(AsyncPhase<TransactionFilter, Vec<Transaction>>),
    /// Create a transaction
    Create(AsyncPhase<NewTransaction, Transaction>),
    /// Delete a transaction by id
    Delete(AsyncPhase<String, String>),
    /// Clear the fetch/delete error
    ClearError,
    /// Clear the create error
    ClearCreateError,
}

impl TransactionsAction {
    /// Start an unfiltered fetch
    #[must_use]
    pub fn fetch_all() -> Self {
        Self::FetchAll(AsyncPhase::Pending(TransactionFilter::default()))
    }
}

impl ReportsRejection for TransactionsAction {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::FetchAll(phase) => phase.rejection(),
            Self::Create(phase) => phase.rejection(),
            Self::Delete(phase) => phase.rejection(),
            Self::ClearError | Self::ClearCreateError => None,
        }
    }
}

/// Reducer for the transactions slice
#[derive(Clone, Debug, Default)]
pub struct TransactionsReducer;

impl Reducer for TransactionsReducer {
    type State = TransactionsState;
    type Action = TransactionsAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TransactionsAction::FetchAll(AsyncPhase::Pending(filter)) => {
                state.loading.begin();
                let query = filter.query_pairs();
                smallvec![env.request(
                    FETCH_ERROR,
                    move |api| async move { api.get_with_query(TRANSACTIONS_PATH, &query).await },
                    TransactionsAction::FetchAll,
                )]
            },
            TransactionsAction::FetchAll(AsyncPhase::Fulfilled(transactions)) => {
                state.loading.succeed();
                state.transactions.replace_all(transactions);
                smallvec![Effect::None]
            },
            TransactionsAction::Create(AsyncPhase::Pending(payload)) => {
                state.create.begin();
                smallvec![env.request(
                    CREATE_ERROR,
                    move |api| async move { api.post(TRANSACTIONS_PATH, &payload).await },
                    TransactionsAction::Create,
                )]
            },
            TransactionsAction::Create(AsyncPhase::Fulfilled(transaction)) => {
                state.create.succeed();
                state.transactions.append(transaction);
                smallvec![Effect::None]
            },
            TransactionsAction::Create(AsyncPhase::Rejected(rejection)) => {
                state.create.fail(rejection.message);
                smallvec![Effect::None]
            },
            TransactionsAction::Delete(AsyncPhase::Pending(id)) => {
                state.loading.begin();
                smallvec![env.request(
                    DELETE_ERROR,
                    move |api| async move {
                        let path = resource_path(TRANSACTIONS_PATH, &id)?;
                        api.delete::<IgnoredAny>(&path).await.map(|_| id)
                    },
                    TransactionsAction::Delete,
                )]
            },
            TransactionsAction::Delete(AsyncPhase::Fulfilled(id)) => {
                state.loading.succeed();
                state.transactions.remove(&id);
                smallvec![Effect::None]
            },
            TransactionsAction::FetchAll(AsyncPhase::Rejected(rejection))
            | TransactionsAction::Delete(AsyncPhase::Rejected(rejection)) => {
                state.loading.fail(rejection.message);
                smallvec![Effect::None]
            },
            TransactionsAction::ClearError => {
                state.loading.clear_error();
                smallvec![Effect::None]
            },
            TransactionsAction::ClearCreateError => {
                state.create.clear_error();
                smallvec![Effect::None]
            },
        }
    }
}
