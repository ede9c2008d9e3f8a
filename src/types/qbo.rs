use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::db::Account;
use crate::error::BridgeError;

/// `{"QueryResponse": {"Account": [...]}}`
#[derive(Debug, Deserialize)]
pub struct QueryEnvelope {
    #[serde(rename = "QueryResponse")]
    pub query_response: Option<QueryResponse>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    /// Kept untyped until we know it is a list.
    #[serde(rename = "Account")]
    pub account: Option<Value>,
}

/// Reference to another QBO entity, e.g. `{"value": "USD", "name": "United States Dollar"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QboRef {
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QboAccount {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: Option<String>,
    pub classification: Option<String>,
    pub currency_ref: Option<QboRef>,
    pub account_type: Option<String>,
    pub active: Option<bool>,
    pub current_balance: Option<f64>,
    pub sub_account: Option<bool>,
    pub parent_ref: Option<QboRef>,
}

impl TryFrom<QboAccount> for Account {
    type Error = BridgeError;

    fn try_from(acc: QboAccount) -> Result<Self, Self::Error> {
        let id = parse_id(&acc.id, "Id")?;
        let parent_id = match (acc.sub_account, acc.parent_ref) {
            (Some(true), Some(parent)) => Some(parse_id(&parent.value, "ParentRef")?),
            _ => None,
        };
        Ok(Account {
            id,
            name: acc.name,
            classification: acc.classification,
            currency: acc.currency_ref.map(|c| c.value),
            account_type: acc.account_type,
            active: acc.active.unwrap_or(false),
            current_balance: acc.current_balance.unwrap_or(0.0),
            parent_id,
        })
    }
}

/// Validate a 200 response body and turn it into local accounts.
///
/// Either every entry converts or none are returned.
pub fn parse_accounts(body: &[u8]) -> Result<Vec<Account>, BridgeError> {
    let envelope: QueryEnvelope = serde_json::from_slice(body)
        .map_err(|e| BridgeError::InvalidAccountData(format!("malformed response: {e}")))?;
    let list = envelope
        .query_response
        .and_then(|q| q.account)
        .ok_or_else(|| {
            BridgeError::InvalidAccountData("QueryResponse.Account is missing".to_string())
        })?;
    let Value::Array(items) = list else {
        return Err(BridgeError::InvalidAccountData(
            "QueryResponse.Account is not a list".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let acc: QboAccount = serde_json::from_value(item).map_err(|e| {
                BridgeError::InvalidAccountData(format!("account #{idx}: {e}"))
            })?;
            Account::try_from(acc)
        })
        .collect()
}

fn parse_id(raw: &str, field: &str) -> Result<i64, BridgeError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| BridgeError::InvalidAccountData(format!("{field} {raw:?} is not numeric")))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
