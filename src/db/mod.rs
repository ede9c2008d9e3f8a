//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: pool setup and the credential store
//! - `accounts.rs`: the account store

pub mod accounts;
pub mod models;
pub mod schema;
pub mod sqlite;

pub use accounts::AccountsStorage;
pub use models::{Account, AccountFilter};
pub use schema::SQLITE_INIT;
pub use sqlite::{CredentialsStorage, SqlitePool, connect};
