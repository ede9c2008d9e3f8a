//! SQL DDL for the credential and account tables.

/// SQLite schema with:
/// - `credentials`: keyed by `access_token`; holds at most one row after
///   every `replace_all`. `issued_at` is RFC3339 text.
/// - `accounts`: keyed by the upstream account id. `parent_id` points at
///   another account but is deliberately not a FOREIGN KEY, since the
///   upstream may reference accounts we have never seen.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    access_token TEXT PRIMARY KEY NOT NULL,
    refresh_token TEXT NOT NULL,
    expires_in INTEGER NOT NULL,
    realm_id TEXT NOT NULL,
    token_type TEXT NOT NULL DEFAULT 'Bearer',
    issued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_credentials_issued_at ON credentials(issued_at);

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NULL,
    classification TEXT NULL,
    currency TEXT NULL,
    account_type TEXT NULL,
    active INTEGER NOT NULL DEFAULT 0,
    current_balance REAL NOT NULL DEFAULT 0,
    parent_id INTEGER NULL
);

CREATE INDEX IF NOT EXISTS idx_accounts_parent_id ON accounts(parent_id);
CREATE INDEX IF NOT EXISTS idx_accounts_classification ON accounts(classification)
"#;
