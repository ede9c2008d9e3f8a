use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const INTUIT_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
pub const QBO_SANDBOX_API_BASE: &str = "https://sandbox-quickbooks.api.intuit.com";
pub const QBO_PRODUCTION_API_BASE: &str = "https://quickbooks.api.intuit.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub intuit: IntuitConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Layering: built-in defaults, then `config.toml`, then `BRIDGE_*` env vars
    /// (`__` separates nesting, e.g. `BRIDGE_INTUIT__CLIENT_ID`).
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("BRIDGE_").split("__"))
            .extract()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicConfig {
    pub database_url: String,
    pub loglevel: String,
    pub listen_addr: String,
    pub proxy: Option<Url>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:bridge.db".to_string(),
            loglevel: "info".to_string(),
            listen_addr: "0.0.0.0:8000".to_string(),
            proxy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntuitEnvironment {
    #[default]
    Sandbox,
    Production,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntuitConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub environment: IntuitEnvironment,
    /// Overrides the identity provider token endpoint.
    pub token_url: Option<Url>,
    /// Overrides the accounting API base URL chosen from `environment`.
    pub api_base: Option<Url>,
}

impl IntuitConfig {
    pub fn token_url(&self) -> Result<Url, url::ParseError> {
        match &self.token_url {
            Some(u) => Ok(u.clone()),
            None => Url::parse(INTUIT_TOKEN_URL),
        }
    }

    pub fn api_base(&self) -> Result<Url, url::ParseError> {
        if let Some(u) = &self.api_base {
            return Ok(u.clone());
        }
        match self.environment {
            IntuitEnvironment::Sandbox => Url::parse(QBO_SANDBOX_API_BASE),
            IntuitEnvironment::Production => Url::parse(QBO_PRODUCTION_API_BASE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between scheduled syncs; 0 disables the periodic trigger.
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}
