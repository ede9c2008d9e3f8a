use crate::db::CredentialsStorage;
use crate::error::BridgeError;
use crate::intuit::credentials::issued_now;
use crate::intuit::{IntuitOauthEndpoints, QboCredential};
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Owns the credential lifecycle: read, validate, refresh, persist.
#[derive(Clone)]
pub struct TokenManager {
    storage: CredentialsStorage,
    endpoints: IntuitOauthEndpoints,
}

impl TokenManager {
    pub fn new(storage: CredentialsStorage, endpoints: IntuitOauthEndpoints) -> Self {
        Self { storage, endpoints }
    }

    pub async fn get_current_credential(&self) -> Result<Option<QboCredential>, BridgeError> {
        self.storage.get_latest().await
    }

    /// Return `credential` untouched while it is valid, otherwise refresh it.
    pub async fn ensure_valid(&self, credential: QboCredential) -> Result<QboCredential, BridgeError> {
        self.ensure_valid_at(credential, Utc::now()).await
    }

    pub async fn ensure_valid_at(
        &self,
        credential: QboCredential,
        now: DateTime<Utc>,
    ) -> Result<QboCredential, BridgeError> {
        if !credential.is_expired_at(now) {
            return Ok(credential);
        }
        info!(
            realm_id = %credential.realm_id,
            expired_at = ?credential.expires_at(),
            "Access token expired; refreshing"
        );
        self.refresh(&credential).await
    }

    /// Single refresh round trip; on success the store holds only the new credential.
    pub async fn refresh(&self, credential: &QboCredential) -> Result<QboCredential, BridgeError> {
        let resp = self
            .endpoints
            .refresh_access_token(&credential.refresh_token)
            .await
            .map_err(|e| {
                let detail = BridgeError::token_error_detail(&e);
                warn!(realm_id = %credential.realm_id, "Token refresh rejected: {}", detail);
                BridgeError::RefreshFailed { detail }
            })?;

        // issuance must move forward so get_latest never prefers the stale row
        let issued_at = credential
            .issued_at
            .checked_add_signed(Duration::microseconds(1))
            .map_or_else(issued_now, |floor| issued_now().max(floor));
        let refreshed = QboCredential::from_token_response(
            &resp,
            credential.realm_id.clone(),
            Some(&credential.refresh_token),
            issued_at,
        )
        .ok_or_else(|| BridgeError::RefreshFailed {
            detail: "token response carried no refresh token".to_string(),
        })?;

        self.storage.replace_all(&refreshed).await?;
        info!(
            realm_id = %refreshed.realm_id,
            expires_in = refreshed.expires_in,
            "Access token refreshed and stored"
        );
        Ok(refreshed)
    }

    /// Exchange an authorization code and make the result the current credential.
    pub async fn exchange_code(
        &self,
        code: &str,
        realm_id: &str,
    ) -> Result<QboCredential, BridgeError> {
        let resp = self.endpoints.exchange_code(code).await.map_err(|e| {
            let detail = BridgeError::token_error_detail(&e);
            warn!(realm_id = %realm_id, "Authorization code exchange rejected: {}", detail);
            BridgeError::ExchangeFailed { detail }
        })?;

        let credential = QboCredential::from_token_response(&resp, realm_id, None, issued_now())
            .ok_or_else(|| BridgeError::ExchangeFailed {
                detail: "token response carried no refresh token".to_string(),
            })?;

        self.storage.replace_all(&credential).await?;
        info!(realm_id = %realm_id, "Authorization complete; credential stored");
        Ok(credential)
    }
}
