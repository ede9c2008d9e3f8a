pub mod accounting_api;

pub use accounting_api::{AccountingApi, AccountsResponse};

use crate::config::BasicConfig;
use reqwest::redirect::Policy;
use std::time::Duration;

/// Shared outbound client for the identity endpoint and the accounting API.
///
/// Redirects are not followed.
pub fn build_http_client(cfg: &BasicConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent("qbo-bridge/0.1")
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15))
        .redirect(Policy::none());
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    builder.build()
}
