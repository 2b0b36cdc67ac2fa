//! Pocketbook command-line client.
//!
//! Restores the saved session, optionally signs in, refreshes every domain
//! slice and prints a summary.
//!
//! # Usage
//!
//! ```bash
//! POCKETBOOK_ENV=qa \
//! POCKETBOOK_EMAIL=ana@example.com POCKETBOOK_PASSWORD=secret \
//!   cargo run --bin pocketbook
//! ```
//!
//! Set `RUST_LOG=pocketbook=debug` for request-level logs.

use anyhow::Context;
use pocketbook::investments::InvestmentsAction;
use pocketbook::open_finance::OpenFinanceAction;
use pocketbook::persistence::load_or_default;
use pocketbook::session::SessionAction;
use pocketbook::transactions::TransactionsAction;
use pocketbook::{AppAction, AppConfig, AppEnvironment, AppReducer, AppState};
use pocketbook_core::AsyncPhase;
use pocketbook_runtime::{ErrorReporter, Store, TracingSink};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const REFRESH_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!(base_url = %config.api.base_url, state = %config.state_path.display(), "Starting Pocketbook");

    let env = AppEnvironment::from_config(&config);
    let persisted = load_or_default(env.storage.as_ref()).await;
    env.credentials.set(persisted.session.token.clone());

    let store = Store::new(AppState::rehydrate(persisted), AppReducer::new(), env)
        .with_middleware(ErrorReporter::new(TracingSink));

    if let (Ok(email), Ok(password)) = (
        std::env::var("POCKETBOOK_EMAIL"),
        std::env::var("POCKETBOOK_PASSWORD"),
    ) {
        store
            .send_and_wait_for(
                AppAction::Session(SessionAction::login(email, password)),
                |action| {
                    matches!(
                        action,
                        AppAction::Session(SessionAction::Login(
                            AsyncPhase::Fulfilled(_) | AsyncPhase::Rejected(_)
                        ))
                    )
                },
                REFRESH_TIMEOUT,
            )
            .await
            .context("Sign-in did not settle")?;
        if let Some(error) = store.state(|s| s.session.error().map(str::to_string)).await {
            anyhow::bail!("Sign-in failed: {error}");
        }
    }

    if !store.state(|s| s.session.is_authenticated()).await {
        info!("No session; set POCKETBOOK_EMAIL and POCKETBOOK_PASSWORD to sign in");
        store.shutdown(None).await?;
        return Ok(());
    }

    let refreshes = [
        AppAction::Investments(InvestmentsAction::fetch_all()),
        AppAction::Transactions(TransactionsAction::fetch_all()),
        AppAction::OpenFinance(OpenFinanceAction::fetch_connections()),
    ];
    let mut handles = Vec::with_capacity(refreshes.len());
    for action in refreshes {
        handles.push(store.send_cascading(action).await?);
    }
    for handle in &mut handles {
        handle
            .wait_with_timeout(REFRESH_TIMEOUT)
            .await
            .context("Refresh did not finish")?;
    }

    let summary = store
        .state(|s| {
            format!(
                "{} fixed income, {} variable income (invested {}), {} transactions (balance {}), {} connections",
                s.investments.fixed_income.len(),
                s.investments.variable_income.len(),
                s.investments.invested_total(),
                s.transactions.transactions.len(),
                s.transactions.balance(),
                s.open_finance.connections.len(),
            )
        })
        .await;
    println!("{summary}");

    store.shutdown(Some(Duration::from_secs(5))).await?;
    Ok(())
}
