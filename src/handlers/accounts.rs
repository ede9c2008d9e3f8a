use axum::{
    Json,
    extract::{Query, State},
};
use std::collections::BTreeMap;

use crate::db::{Account, AccountFilter};
use crate::service::{AccountNode, balance_summary, build_account_tree};
use crate::{BridgeError, router::BridgeState};

/// GET /accounts -> run one sync cycle and return every stored account.
///
/// The cycle is queued on the scheduler, so it never overlaps a scheduled one.
pub async fn sync_accounts(
    State(state): State<BridgeState>,
) -> Result<Json<Vec<Account>>, BridgeError> {
    Ok(Json(state.scheduler.run_now().await?))
}

/// GET /accounts/search?active=&classification=
pub async fn search_accounts(
    State(state): State<BridgeState>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<Vec<Account>>, BridgeError> {
    Ok(Json(state.accounts.search(&filter).await?))
}

/// GET /accounts/summary
pub async fn accounts_summary(
    State(state): State<BridgeState>,
) -> Result<Json<BTreeMap<String, f64>>, BridgeError> {
    let accounts = state.accounts.list_all().await?;
    Ok(Json(balance_summary(&accounts)))
}

/// GET /accounts/tree
pub async fn accounts_tree(
    State(state): State<BridgeState>,
) -> Result<Json<Vec<AccountNode>>, BridgeError> {
    let accounts = state.accounts.list_all().await?;
    Ok(Json(build_account_tree(&accounts)))
}
