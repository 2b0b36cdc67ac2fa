//! Investments slice: fixed-income and variable-income positions.
//!
//! Two independent request tracks: `loading` covers fetch-all and deletes,
//! `create` covers creation. Fetch-all is a fan-out over both position lists
//! and settles as a whole.

use crate::environment::AppEnvironment;
use crate::types::Money;
use chrono::{DateTime, NaiveDate, Utc};
use pocketbook_api::{resource_path, ApiClient};
use pocketbook_core::{
    smallvec, AsyncPhase, Collection, Effect, Entity, Lifecycle, Reducer, Rejection,
    ReportsRejection, SmallVec,
};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

const FIXED_INCOME_PATH: &str = "/investments/fixed-income";
const VARIABLE_INCOME_PATH: &str = "/investments/variable-income";

/// Fallback message for failed fetches
pub const FETCH_ERROR: &str = "Unable to load investments";
/// Fallback message for failed creations
pub const CREATE_ERROR: &str = "Unable to create investment";
/// Fallback message for failed deletions
pub const DELETE_ERROR: &str = "Unable to delete investment";

/// Fixed-income product family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedIncomeKind {
    /// Bank certificate of deposit
    Cdb,
    /// Real-estate credit note
    Lci,
    /// Agribusiness credit note
    Lca,
    /// Government bond
    Treasury,
    /// Corporate bond
    Debenture,
    /// Anything else
    #[serde(other)]
    Other,
}

/// Fixed-income position
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedIncomeInvestment {
    /// Server-assigned id
    pub id: String,
    /// Owning user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Product name
    pub name: String,
    /// Issuing institution
    #[serde(default)]
    pub issuer: Option<String>,
    /// Product family
    pub kind: FixedIncomeKind,
    /// Invested amount
    pub amount: Money,
    /// Annual rate in basis points
    pub annual_rate_bps: u32,
    /// Maturity date
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for FixedIncomeInvestment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload for `POST /investments/fixed-income`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFixedIncome {
    /// Product name
    pub name: String,
    /// Issuing institution
    pub issuer: Option<String>,
    /// Product family
    pub kind: FixedIncomeKind,
    /// Invested amount
    pub amount: Money,
    /// Annual rate in basis points
    pub annual_rate_bps: u32,
    /// Maturity date
    pub maturity_date: Option<NaiveDate>,
}

/// Variable-income asset class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableIncomeKind {
    /// Listed share
    Stock,
    /// Real-estate investment trust
    Reit,
    /// Exchange-traded fund
    Etf,
    /// Crypto asset
    Crypto,
    /// Anything else
    #[serde(other)]
    Other,
}

/// Variable-income position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableIncomeInvestment {
    /// Server-assigned id
    pub id: String,
    /// Owning user
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Ticker symbol
    pub ticker: String,
    /// Asset class
    pub kind: VariableIncomeKind,
    /// Units held (fractional for crypto)
    pub quantity: f64,
    /// Average acquisition price per unit
    pub average_price: Money,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VariableIncomeInvestment {
    /// Quantity times average price, rounded to the cent
    ///
    /// Clamped to the `Money` range; a non-finite product counts as zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)] // clamped before the cast
    pub fn invested(&self) -> Money {
        let cents = (self.average_price.cents() as f64 * self.quantity).round();
        if !cents.is_finite() {
            return Money::ZERO;
        }
        Money::from_cents(cents.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }
}

impl Entity for VariableIncomeInvestment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Payload for `POST /investments/variable-income`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariableIncome {
    /// Ticker symbol
    pub ticker: String,
    /// Asset class
    pub kind: VariableIncomeKind,
    /// Units held
    pub quantity: f64,
    /// Average acquisition price per unit
    pub average_price: Money,
}

/// Both position lists, as returned by the fan-out fetch
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Portfolio {
    /// Fixed-income positions
    pub fixed_income: Vec<FixedIncomeInvestment>,
    /// Variable-income positions
    pub variable_income: Vec<VariableIncomeInvestment>,
}

impl Portfolio {
    /// Fetch both lists concurrently; the first failure fails the whole fetch
    ///
    /// # Errors
    ///
    /// Returns the first [`ApiError`](pocketbook_api::ApiError) of either request.
    pub async fn fetch(api: &ApiClient) -> Result<Self, pocketbook_api::ApiError> {
        let (fixed_income, variable_income) = futures::future::try_join(
            api.get(FIXED_INCOME_PATH),
            api.get(VARIABLE_INCOME_PATH),
        )
        .await?;

        Ok(Self {
            fixed_income,
            variable_income,
        })
    }
}

/// Investments state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvestmentsState {
    /// Fixed-income positions
    pub fixed_income: Collection<FixedIncomeInvestment>,
    /// Variable-income positions
    pub variable_income: Collection<VariableIncomeInvestment>,
    /// Fetch and delete track
    pub loading: Lifecycle,
    /// Create track
    pub create: Lifecycle,
}

impl InvestmentsState {
    /// Total invested across both position lists
    #[must_use]
    pub fn invested_total(&self) -> Money {
        let fixed: Money = self.fixed_income.iter().map(|i| i.amount).sum();
        let variable: Money = self
            .variable_income
            .iter()
            .map(VariableIncomeInvestment::invested)
            .sum();
        fixed + variable
    }
}

/// Investments actions
#[derive(Clone, Debug, PartialEq)]
pub enum InvestmentsAction {
    /// Fetch both position lists
    FetchAll(AsyncPhase<(), Portfolio>),
    /// Create a fixed-income position
    CreateFixedIncome(AsyncPhase<NewFixedIncome, FixedIncomeInvestment>),
    /// Create a variable-income position
    CreateVariableIncome(AsyncPhase<NewVariableIncome, VariableIncomeInvestment>),
    /// Delete a fixed-income position by id
    DeleteFixedIncome(AsyncPhase<String, String>),
    /// Delete a variable-income position by id
    DeleteVariableIncome(AsyncPhase<String, String>),
    /// Clear the fetch/delete error
    ClearError,
    /// Clear the create error
    ClearCreateError,
}

impl InvestmentsAction {
    /// Start a fetch of both position lists
    #[must_use]
    pub const fn fetch_all() -> Self {
        Self::FetchAll(AsyncPhase::Pending(()))
    }
}

impl ReportsRejection for InvestmentsAction {
    fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::FetchAll(phase) => phase.rejection(),
            Self::CreateFixedIncome(phase) => phase.rejection(),
            Self::CreateVariableIncome(phase) => phase.rejection(),
            Self::DeleteFixedIncome(phase) | Self::DeleteVariableIncome(phase) => phase.rejection(),
            Self::ClearError | Self::ClearCreateError => None,
        }
    }
}

/// Reducer for the investments slice
#[derive(Clone, Debug, Default)]
pub struct InvestmentsReducer;

impl InvestmentsReducer {
    fn delete(
        env: &AppEnvironment,
        base: &'static str,
        id: String,
        embed: fn(AsyncPhase<String, String>) -> InvestmentsAction,
    ) -> Effect<InvestmentsAction> {
        env.request(
            DELETE_ERROR,
            move |api| async move {
                let path = resource_path(base, &id)?;
                api.delete::<IgnoredAny>(&path).await.map(|_| id)
            },
            embed,
        )
    }
}

impl Reducer for InvestmentsReducer {
    type State = InvestmentsState;
    type Action = InvestmentsAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Fetch ==========
            InvestmentsAction::FetchAll(AsyncPhase::Pending(())) => {
                state.loading.begin();
                smallvec![env.request(
                    FETCH_ERROR,
                    |api| async move { Portfolio::fetch(&api).await },
                    InvestmentsAction::FetchAll,
                )]
            },
            InvestmentsAction::FetchAll(AsyncPhase::Fulfilled(portfolio)) => {
                state.loading.succeed();
                state.fixed_income.replace_all(portfolio.fixed_income);
                state.variable_income.replace_all(portfolio.variable_income);
                smallvec![Effect::None]
            },
            InvestmentsAction::FetchAll(AsyncPhase::Rejected(rejection)) => {
                state.loading.fail(rejection.message);
                smallvec![Effect::None]
            },

            // ========== Create ==========
            InvestmentsAction::CreateFixedIncome(AsyncPhase::Pending(payload)) => {
                state.create.begin();
                smallvec![env.request(
                    CREATE_ERROR,
                    move |api| async move { api.post(FIXED_INCOME_PATH, &payload).await },
                    InvestmentsAction::CreateFixedIncome,
                )]
            },
            InvestmentsAction::CreateFixedIncome(AsyncPhase::Fulfilled(investment)) => {
                state.create.succeed();
                state.fixed_income.append(investment);
                smallvec![Effect::None]
            },
            InvestmentsAction::CreateVariableIncome(AsyncPhase::Pending(payload)) => {
                state.create.begin();
                smallvec![env.request(
                    CREATE_ERROR,
                    move |api| async move { api.post(VARIABLE_INCOME_PATH, &payload).await },
                    InvestmentsAction::CreateVariableIncome,
                )]
            },
            InvestmentsAction::CreateVariableIncome(AsyncPhase::Fulfilled(investment)) => {
                state.create.succeed();
                state.variable_income.append(investment);
                smallvec![Effect::None]
            },
            InvestmentsAction::CreateFixedIncome(AsyncPhase::Rejected(rejection))
            | InvestmentsAction::CreateVariableIncome(AsyncPhase::Rejected(rejection)) => {
                state.create.fail(rejection.message);
                smallvec![Effect::None]
            },

            // ========== Delete ==========
            InvestmentsAction::DeleteFixedIncome(AsyncPhase::Pending(id)) => {
                state.loading.begin();
                smallvec![Self::delete(
                    env,
                    FIXED_INCOME_PATH,
                    id,
                    InvestmentsAction::DeleteFixedIncome
                )]
            },
            InvestmentsAction::DeleteFixedIncome(AsyncPhase::Fulfilled(id)) => {
                state.loading.succeed();
                state.fixed_income.remove(&id);
                smallvec![Effect::None]
            },
            InvestmentsAction::DeleteVariableIncome(AsyncPhase::Pending(id)) => {
                state.loading.begin();
                smallvec![Self::delete(
                    env,
                    VARIABLE_INCOME_PATH,
                    id,
                    InvestmentsAction::DeleteVariableIncome
                )]
            },
            InvestmentsAction::DeleteVariableIncome(AsyncPhase::Fulfilled(id)) => {
                state.loading.succeed();
                state.variable_income.remove(&id);
                smallvec![Effect::None]
            },
            InvestmentsAction::DeleteFixedIncome(AsyncPhase::Rejected(rejection))
            | InvestmentsAction::DeleteVariableIncome(AsyncPhase::Rejected(rejection)) => {
                state.loading.fail(rejection.message);
                smallvec![Effect::None]
            },

            // ========== Errors ==========
            InvestmentsAction::ClearError => {
                state.loading.clear_error();
                smallvec![Effect::None]
            },
            InvestmentsAction::ClearCreateError => {
                state.create.clear_error();
                smallvec![Effect::None]
            },
        }
    }
}
