use axum::{Router, routing::get};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::db::AccountsStorage;
use crate::handlers::{accounts, health::health, intuit_oauth::intuit_oauth_callback};
use crate::service::{SyncSchedulerHandle, TokenManager};

#[derive(Clone)]
pub struct BridgeState {
    pub scheduler: SyncSchedulerHandle,
    pub accounts: AccountsStorage,
    pub tokens: TokenManager,
}

impl BridgeState {
    pub fn new(
        scheduler: SyncSchedulerHandle,
        accounts: AccountsStorage,
        tokens: TokenManager,
    ) -> Self {
        Self {
            scheduler,
            accounts,
            tokens,
        }
    }
}

pub fn bridge_router(state: BridgeState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(
            DefaultOnFailure::new()
                .level(Level::WARN)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/accounts", get(accounts::sync_accounts))
        .route("/accounts/search", get(accounts::search_accounts))
        .route("/accounts/summary", get(accounts::accounts_summary))
        .route("/accounts/tree", get(accounts::accounts_tree))
        .route("/callback", get(intuit_oauth_callback))
        .route("/health", get(health))
        .layer(trace_layer)
        .with_state(state)
}
