use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use oauth2::TokenResponse;
use serde::{Deserialize, Serialize};

use super::endpoints::IntuitTokenResponse;

pub const BEARER: &str = "Bearer";

/// Upper bound applied to a provider-reported `expires_in` (one year).
pub const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

/// The operational credential for the accounting API.
///
/// Only one is ever current; see [`crate::db::CredentialsStorage::replace_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QboCredential {
    pub access_token: String,
    pub refresh_token: String,
    /// Validity window in seconds, counted from `issued_at`.
    pub expires_in: i64,
    pub realm_id: String,
    pub token_type: String,
    pub issued_at: DateTime<Utc>,
}

impl QboCredential {
    /// `None` when `issued_at + expires_in` is not representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Duration::try_seconds(self.expires_in)
            .and_then(|ttl| self.issued_at.checked_add_signed(ttl))
    }

    /// Inclusive: a token is already expired at the exact instant it expires.
    /// An unrepresentable expiry counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires_at| now >= expires_at)
    }

    /// Build a credential from a token endpoint response.
    ///
    /// Intuit does not echo the realm, so the caller supplies it. When the
    /// response carries no new refresh token, `fallback_refresh` is kept.
    pub fn from_token_response(
        resp: &IntuitTokenResponse,
        realm_id: impl Into<String>,
        fallback_refresh: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Option<Self> {
        let refresh_token = resp
            .refresh_token()
            .map(|t| t.secret().to_string())
            .or_else(|| fallback_refresh.map(str::to_string))?;
        let expires_in = resp
            .expires_in()
            .map(|d| {
                i64::try_from(d.as_secs())
                    .unwrap_or(i64::MAX)
                    .min(MAX_EXPIRES_IN_SECS)
            })
            .unwrap_or(0);
        Some(Self {
            access_token: resp.access_token().secret().to_string(),
            refresh_token,
            expires_in,
            realm_id: realm_id.into(),
            token_type: BEARER.to_string(),
            issued_at,
        })
    }
}

/// Current time at the precision the credential store keeps (microseconds).
pub fn issued_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Parse a stored issuance timestamp. Naive values are UTC.
pub fn parse_issued_at(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}
