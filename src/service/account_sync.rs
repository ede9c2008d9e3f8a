use crate::api::{AccountingApi, AccountsResponse};
use crate::db::{Account, AccountsStorage};
use crate::error::BridgeError;
use crate::service::token_manager::TokenManager;
use crate::types::qbo::parse_accounts;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Stages of one sync cycle, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Fetching,
    AuthRetry,
    Validating,
    Upserting,
    Done,
}

/// Fetch → (one refresh on 401) → validate → upsert.
#[derive(Clone)]
pub struct AccountSync {
    tokens: TokenManager,
    api: AccountingApi,
    accounts: AccountsStorage,
}

impl AccountSync {
    pub fn new(tokens: TokenManager, api: AccountingApi, accounts: AccountsStorage) -> Self {
        Self {
            tokens,
            api,
            accounts,
        }
    }

    /// Run one sync cycle and return every stored account afterwards.
    pub async fn sync(&self) -> Result<Vec<Account>, BridgeError> {
        let credential = self
            .tokens
            .get_current_credential()
            .await?
            .ok_or(BridgeError::CredentialNotFound)?;
        let credential = self.tokens.ensure_valid(credential).await?;

        debug!(phase = ?SyncPhase::Fetching, realm_id = %credential.realm_id);
        let mut resp = self.api.fetch_accounts(&credential).await?;
        if resp.status == StatusCode::UNAUTHORIZED {
            debug!(phase = ?SyncPhase::AuthRetry, realm_id = %credential.realm_id);
            warn!("Accounting API returned 401; refreshing credential and retrying once");
            let refreshed = self.tokens.refresh(&credential).await?;
            resp = self.api.fetch_accounts(&refreshed).await?;
            if resp.status == StatusCode::UNAUTHORIZED {
                return Err(BridgeError::CredentialRejected {
                    details: body_as_json(&resp),
                });
            }
        }
        if resp.status != StatusCode::OK {
            warn!(status = resp.status.as_u16(), "Account fetch failed");
            return Err(BridgeError::FetchFailed {
                status: resp.status.as_u16(),
                details: body_as_json(&resp),
            });
        }

        debug!(phase = ?SyncPhase::Validating);
        let accounts = parse_accounts(&resp.body)?;

        debug!(phase = ?SyncPhase::Upserting, count = accounts.len());
        let count = self.accounts.upsert_many(&accounts).await?;

        let all = self.accounts.list_all().await?;
        debug!(phase = ?SyncPhase::Done);
        info!(upserted = count, stored = all.len(), "Account sync complete");
        Ok(all)
    }
}

/// Upstream bodies are usually JSON; anything else is kept as text.
fn body_as_json(resp: &AccountsResponse) -> Value {
    serde_json::from_slice(&resp.body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&resp.body).into_owned()))
}
