//! Intuit identity provider: the credential type and the token endpoint.

pub mod credentials;
pub mod endpoints;

pub use credentials::QboCredential;
pub use endpoints::{IntuitOauthEndpoints, IntuitTokenResponse};
