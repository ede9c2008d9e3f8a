pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod intuit;
pub mod router;
pub mod service;
pub mod types;

pub use error::BridgeError;
pub use intuit::{IntuitOauthEndpoints, QboCredential};
pub use service::{AccountSync, TokenManager};
