use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::warn;

/// Token endpoint failure as returned by the `oauth2` client.
pub type TokenRequestError = RequestTokenError<
    HttpClientError<ReqwestClientError>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Credential not found; authenticate first")]
    CredentialNotFound,

    #[error("Token refresh failed: {detail}")]
    RefreshFailed { detail: String },

    #[error("Authorization code exchange failed: {detail}")]
    ExchangeFailed { detail: String },

    #[error("Invalid OAuth callback: {0}")]
    OauthCallback(String),

    #[error("Accounting API returned status {status}")]
    FetchFailed { status: u16, details: Value },

    #[error("Accounting API rejected the refreshed credential")]
    CredentialRejected { details: Value },

    #[error("Invalid account data: {0}")]
    InvalidAccountData(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl BridgeError {
    /// Flattens an `oauth2` token endpoint failure into a human-readable detail.
    pub fn token_error_detail(e: &TokenRequestError) -> String {
        match e {
            RequestTokenError::ServerResponse(err) => match err.error_description() {
                Some(desc) => format!("{}: {}", err.error(), desc),
                None => err.error().to_string(),
            },
            RequestTokenError::Request(req_e) => format!("request failed: {}", req_e),
            RequestTokenError::Parse(parse_err, body) => format!(
                "unparseable token response ({}): {}",
                parse_err,
                String::from_utf8_lossy(body)
            ),
            RequestTokenError::Other(s) => s.clone(),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        let cause = self.to_string();
        let (status, body) = match self {
            BridgeError::CredentialNotFound => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new(
                    "Credential not found",
                    json!("Please authenticate first."),
                ),
            ),
            BridgeError::RefreshFailed { detail } => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("Token refresh failed", json!(detail)),
            ),
            BridgeError::ExchangeFailed { detail } => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("Authorization failed", json!(detail)),
            ),
            BridgeError::OauthCallback(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("Invalid OAuth callback", json!(msg)),
            ),
            BridgeError::FetchFailed { status, details } => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::new(
                    "Failed to fetch accounts",
                    json!({ "status": status, "body": details }),
                ),
            ),
            BridgeError::CredentialRejected { details } => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new(
                    "Credential rejected after refresh",
                    json!({
                        "reason": "the accounting API returned 401 for a freshly refreshed token; it may have been revoked",
                        "body": details,
                    }),
                ),
            ),
            BridgeError::InvalidAccountData(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::new("Invalid account data", json!(msg)),
            ),
            BridgeError::Transport(e) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::new("Upstream unreachable", json!(e.without_url().to_string())),
            ),
            BridgeError::Database(_)
            | BridgeError::Json(_)
            | BridgeError::UrlParse(_)
            | BridgeError::Scheduler(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::new(
                    "Internal error",
                    json!("An internal server error occurred."),
                ),
            ),
        };
        warn!(
            status = status.as_u16(),
            error = %body.error,
            details = %body.details,
            cause = %cause,
            "Request failed"
        );
        (status, Json(body)).into_response()
    }
}

/// Error payload returned by every inbound endpoint: `{error, details}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub details: Value,
}

impl ApiErrorBody {
    fn new(error: &str, details: Value) -> Self {
        Self {
            error: error.to_string(),
            details,
        }
    }
}
