//! Request builder and response parser for the Weasyl API.
//!
//! # Design
//! `WeasylClient` holds the base URL and the credential but performs no I/O.
//! `build_get` / `build_post` produce an `HttpRequest`; `parse_get` /
//! `parse_post` consume the matching `HttpResponse`. The caller (normally
//! `Weasyl` with a `Transport`) executes the round-trip in between.
//!
//! GET responses are JSON and failed ones are classified by status. POST
//! responses are opaque text and failures are reported as `Unclassified`
//! with the raw body.

use serde_json::Value;

use crate::config::{ClientConfig, DEFAULT_SITE_URL, DEFAULT_USER_AGENT};
use crate::error::{ApiError, ErrorBody, SENTINEL_CODE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::Params;
use crate::types::AuthorizeRequest;

pub const API_KEY_HEADER: &str = "X-Weasyl-API-Key";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Path of the OAuth2 authorization endpoint, relative to the base URL.
pub const OAUTH2_AUTHORIZE_PATH: &str = "oauth2/authorize";

/// Builds Weasyl requests and parses their responses without touching the
/// network.
///
/// The credential is the only mutable state. `set_api_key` takes `&mut self`,
/// so a request can never be built from a half-updated header set.
#[derive(Debug, Clone)]
pub struct WeasylClient {
    base_url: String,
    site_url: String,
    user_agent: String,
    api_key: String,
    auth_headers: Vec<(String, String)>,
}

impl WeasylClient {
    /// Unauthenticated client for `base_url` with default site URL and user
    /// agent.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: String::new(),
            auth_headers: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(&config.base_url);
        client.site_url = config.site_url.trim_end_matches('/').to_string();
        client.user_agent = config.user_agent.clone();
        client.set_api_key(config.api_key.clone());
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn is_authenticated(&self) -> bool {
        !self.auth_headers.is_empty()
    }

    /// Headers derived from the current credential. Empty when
    /// unauthenticated.
    pub fn auth_headers(&self) -> &[(String, String)] {
        &self.auth_headers
    }

    /// Replace the credential. The header set is regenerated from scratch; an
    /// empty key leaves no authentication header at all.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
        self.auth_headers = auth_headers_for(&self.api_key);
        tracing::debug!(authenticated = self.is_authenticated(), "api key changed");
    }

    /// Absolute URL of an endpoint path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn build_get(&self, path: &str, params: &Params) -> HttpRequest {
        let mut url = self.endpoint_url(path);
        let query = params.encode();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: self.headers(),
            body: None,
        }
    }

    /// An empty encoding is sent as no body at all, not as an empty string.
    pub fn build_post(&self, path: &str, params: &Params) -> HttpRequest {
        let encoded = params.encode();
        let mut headers = self.headers();
        let body = if encoded.is_empty() {
            None
        } else {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            Some(encoded)
        };
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint_url(path),
            headers,
            body,
        }
    }

    /// Decode a GET response, classifying failures by status.
    pub fn parse_get(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Return the raw text of a POST response. Failures are not classified.
    pub fn parse_post(&self, response: HttpResponse) -> Result<String, ApiError> {
        if response.is_success() {
            return Ok(response.body);
        }
        Err(ApiError::Unclassified {
            status: response.status,
            body: ErrorBody {
                message: response.body,
                code: SENTINEL_CODE,
                reason: response.reason,
            },
        })
    }

    /// Avatar link for a login name. Users without an avatar get the default
    /// icon; no request is made.
    pub fn useravatar(&self, username: &str) -> String {
        format!("{}/~{username}/avatar", self.site_url)
    }

    /// URL the user agent must visit to start an authorization-code grant.
    pub fn oauth2_authorize_url(&self, request: &AuthorizeRequest) -> String {
        format!(
            "{}?{}",
            self.endpoint_url(OAUTH2_AUTHORIZE_PATH),
            request.to_params().encode()
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_string(), self.user_agent.clone())];
        headers.extend(self.auth_headers.iter().cloned());
        headers
    }
}

fn auth_headers_for(api_key: &str) -> Vec<(String, String)> {
    if api_key.is_empty() {
        return Vec::new();
    }
    vec![(API_KEY_HEADER.to_string(), api_key.to_string())]
}

/// Map a non-success GET response to the matching `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = ErrorBody::from_response_text(&response.body, &response.reason);
    tracing::warn!(
        status = response.status,
        error = %body.message,
        code = body.code,
        "request failed"
    );
    Err(ApiError::from_status(response.status, body))
}
