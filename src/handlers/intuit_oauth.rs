use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{BridgeError, router::BridgeState};

#[derive(Debug, Deserialize)]
pub struct IntuitCallbackQuery {
    pub code: Option<String>,
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
}

/// GET /callback -> exchanges the authorization code and stores the credential.
pub async fn intuit_oauth_callback(
    State(state): State<BridgeState>,
    Query(query): Query<IntuitCallbackQuery>,
) -> Result<Json<Value>, BridgeError> {
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BridgeError::OauthCallback("missing `code` in callback".to_string()))?;
    let realm_id = query
        .realm_id
        .as_deref()
        .filter(|r| !r.is_empty())
        .ok_or_else(|| BridgeError::OauthCallback("missing `realmId` in callback".to_string()))?;

    let credential = state.tokens.exchange_code(code, realm_id).await?;

    Ok(Json(json!({
        "message": "Authorization successful",
        "realm_id": credential.realm_id,
    })))
}
