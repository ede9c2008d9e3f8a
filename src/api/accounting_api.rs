use crate::error::BridgeError;
use crate::intuit::QboCredential;
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const ACCOUNT_QUERY: &str = "select * from Account";
pub const MINOR_VERSION: &str = "65";

/// Transport failures only; two retries gives three attempts in total.
pub fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(2)
        .with_jitter()
}

/// Raw outcome of one account query. Non-2xx statuses are not errors here.
#[derive(Debug, Clone)]
pub struct AccountsResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// QuickBooks Online accounting API.
#[derive(Clone)]
pub struct AccountingApi {
    client: reqwest::Client,
    base_url: Url,
    retry_policy: ExponentialBuilder,
}

impl AccountingApi {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self::with_retry_policy(client, base_url, default_retry_policy())
    }

    pub fn with_retry_policy(
        client: reqwest::Client,
        base_url: Url,
        retry_policy: ExponentialBuilder,
    ) -> Self {
        Self {
            client,
            base_url,
            retry_policy,
        }
    }

    fn query_url(&self, realm_id: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("v3/company/{realm_id}/query"))
    }

    /// Fetch the full account list for the credential's realm.
    ///
    /// Connection errors, timeouts and body read failures are retried with
    /// exponential backoff; HTTP statuses (401 included) are returned as-is.
    pub async fn fetch_accounts(
        &self,
        credential: &QboCredential,
    ) -> Result<AccountsResponse, BridgeError> {
        let url = self.query_url(&credential.realm_id)?;

        let resp = (|| self.try_fetch(url.clone(), &credential.access_token))
            .retry(self.retry_policy.clone())
            .notify(|err: &reqwest::Error, dur: Duration| {
                warn!(
                    realm_id = %credential.realm_id,
                    "Account query transport error {}, retrying in {:?}",
                    err, dur
                );
            })
            .await?;

        debug!(
            realm_id = %credential.realm_id,
            status = resp.status.as_u16(),
            "Account query completed"
        );
        Ok(resp)
    }

    async fn try_fetch(&self, url: Url, token: &str) -> Result<AccountsResponse, reqwest::Error> {
        let resp = self
            .client
            .get(url)
            .query(&[("query", ACCOUNT_QUERY), ("minorversion", MINOR_VERSION)])
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/text")
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        Ok(AccountsResponse { status, body })
    }
}
