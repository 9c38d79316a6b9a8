//! Client configuration.
//!
//! Defaults target the public Weasyl deployment. `from_env` lets tools point
//! the client at another deployment (or the mock server) without code
//! changes.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://www.weasyl.com/api";
pub const DEFAULT_SITE_URL: &str = "https://www.weasyl.com";
pub const DEFAULT_USER_AGENT: &str = concat!("weasyl-rs/", env!("CARGO_PKG_VERSION"));

pub const ENV_API_KEY: &str = "WEASYL_API_KEY";
pub const ENV_BASE_URL: &str = "WEASYL_BASE_URL";
pub const ENV_SITE_URL: &str = "WEASYL_SITE_URL";
pub const ENV_TIMEOUT_SECS: &str = "WEASYL_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Root of the API; endpoint paths are joined onto it.
    pub base_url: String,
    /// Root of the website, used for avatar links.
    pub site_url: String,
    /// Empty means unauthenticated.
    pub api_key: String,
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            api_key: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults overridden by `WEASYL_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(key) = lookup(ENV_API_KEY) {
            config.api_key = key;
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(url) = lookup(ENV_SITE_URL) {
            config.site_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that both URLs parse as absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), ApiError> {
        check_url("base_url", &self.base_url)?;
        check_url("site_url", &self.site_url)
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ApiError> {
    let url = Url::parse(value).map_err(|e| ApiError::Config(format!("{field} {value:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ApiError::Config(format!(
            "{field} {value:?}: unsupported scheme {other:?}"
        ))),
    }
}
