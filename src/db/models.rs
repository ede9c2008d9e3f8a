use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A locally stored accounting account, keyed by the upstream id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub name: Option<String>,
    pub classification: Option<String>,
    pub currency: Option<String>,
    pub account_type: Option<String>,
    pub active: bool,
    pub current_balance: f64,
    pub parent_id: Option<i64>,
}

/// Conjunctive, read-only filter for account search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountFilter {
    pub active: Option<bool>,
    pub classification: Option<String>,
}

impl AccountFilter {
    /// Empty strings are treated as "no filter".
    pub fn classification(&self) -> Option<&str> {
        self.classification.as_deref().filter(|c| !c.is_empty())
    }
}
