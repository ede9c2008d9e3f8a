use crate::db::Account;
use std::collections::BTreeMap;

/// Sum of `current_balance` per classification, rounded to cents, keys ascending.
/// Accounts without a classification are not counted.
pub fn balance_summary(accounts: &[Account]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for acc in accounts {
        if let Some(classification) = acc.classification.as_ref() {
            *sums.entry(classification.clone()).or_insert(0.0) += acc.current_balance;
        }
    }
    for total in sums.values_mut() {
        *total = round_cents(*total);
    }
    sums
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
