use crate::config::IntuitConfig;
use crate::error::{BridgeError, TokenRequestError};

use oauth2::{
    AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, EndpointNotSet,
    EndpointSet, ExtraTokenFields, RedirectUrl, RefreshToken, StandardRevocableToken,
    StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Intuit's identity endpoint: authorization-code exchange and token refresh.
#[derive(Clone)]
pub struct IntuitOauthEndpoints {
    client: IntuitOauth2Client,
    http: reqwest::Client,
}

impl IntuitOauthEndpoints {
    pub fn from_config(cfg: &IntuitConfig, http: reqwest::Client) -> Result<Self, BridgeError> {
        let redirect = (!cfg.redirect_uri.is_empty()).then_some(cfg.redirect_uri.as_str());
        Self::new(
            &cfg.client_id,
            &cfg.client_secret,
            redirect,
            cfg.token_url()?,
            http,
        )
    }

    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: Option<&str>,
        token_url: Url,
        http: reqwest::Client,
    ) -> Result<Self, BridgeError> {
        let mut client = OAuth2Client::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.to_string()))
            .set_token_uri(TokenUrl::from_url(token_url));
        if let Some(uri) = redirect_uri {
            client = client.set_redirect_uri(RedirectUrl::new(uri.to_string())?);
        }
        Ok(Self { client, http })
    }

    /// Exchange the callback's authorization code for a token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
    ) -> Result<IntuitTokenResponse, TokenRequestError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await?;
        info!("Authorization code exchanged successfully");
        Ok(token)
    }

    /// One refresh round trip. Not retried.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<IntuitTokenResponse, TokenRequestError> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await?;
        debug!(
            refresh_expires_in = ?token.extra_fields().x_refresh_token_expires_in,
            "Access token refreshed"
        );
        Ok(token)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntuitTokenFields {
    /// Lifetime of the refresh token itself, in seconds.
    #[serde(default)]
    pub x_refresh_token_expires_in: Option<u64>,
}
impl ExtraTokenFields for IntuitTokenFields {}

pub type IntuitTokenResponse = StandardTokenResponse<IntuitTokenFields, BasicTokenType>;

type IntuitOauth2Client = OAuth2Client<
    BasicErrorResponse,
    IntuitTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
