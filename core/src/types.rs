//! Typed parameter sets for the Weasyl endpoints.
//!
//! # Design
//! Each struct mirrors the optional filters one endpoint documents and lowers
//! into `Params` with `to_params`. Unset fields become absent parameters and
//! are culled before encoding, so `Default::default()` always yields a bare
//! request. Response payloads stay untyped `serde_json::Value`.

use serde::{Deserialize, Serialize};

use crate::params::Params;

/// Only scope Weasyl accepts.
pub const DEFAULT_OAUTH2_SCOPE: &str = "wholesite";
/// Only response type Weasyl accepts.
pub const DEFAULT_OAUTH2_RESPONSE_TYPE: &str = "code";

/// Filters for `submissions/frontpage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontpageQuery {
    /// ISO 8601 UTC timestamp; only newer submissions are returned.
    pub since: Option<String>,
    /// The server coerces anything above 100 down to 100.
    pub count: Option<u32>,
}

impl FrontpageQuery {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("since", self.since.as_ref())
            .with("count", self.count)
    }
}

/// Flags for `submissions/{id}/view`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionViewOptions {
    /// Ignore the current user's tag filters and rating limit.
    pub anyway: bool,
    /// Count this request as a view (only honoured when authenticated).
    pub increment_views: bool,
}

impl SubmissionViewOptions {
    /// Flags are sent as `true` when set and omitted otherwise; the server
    /// treats any non-empty value as set.
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("anyway", self.anyway.then_some("true"))
            .with("increment_views", self.increment_views.then_some("true"))
    }
}

/// Filters and cursors for `users/{username}/gallery`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryQuery {
    pub since: Option<String>,
    pub count: Option<u32>,
    pub folderid: Option<u64>,
    /// Newer page: only submissions with a `submitid` greater than this.
    pub backid: Option<u64>,
    /// Older page: only submissions with a `submitid` less than this.
    pub nextid: Option<u64>,
}

impl GalleryQuery {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("since", self.since.as_ref())
            .with("count", self.count)
            .with("folderid", self.folderid)
            .with("backid", self.backid)
            .with("nextid", self.nextid)
    }
}

/// Filters and cursors for `messages/submissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxQuery {
    pub count: Option<u32>,
    /// Newer page: unix time strictly greater than this.
    pub backtime: Option<i64>,
    /// Older page: unix time strictly less than this.
    pub nexttime: Option<i64>,
}

impl InboxQuery {
    pub fn to_params(&self) -> Params {
        Params::new()
            .with("count", self.count)
            .with("backtime", self.backtime)
            .with("nexttime", self.nexttime)
    }
}

/// Parameters of an OAuth2 authorization-code request.
///
/// On success Weasyl redirects the user agent to `redirect_uri` with `code`
/// and the unchanged `state` in the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    pub client_id: String,
    pub redirect_uri: String,
    /// Random, unguessable value echoed back on the redirect.
    pub state: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_response_type")]
    pub response_type: String,
}

fn default_scope() -> String {
    DEFAULT_OAUTH2_SCOPE.to_string()
}

fn default_response_type() -> String {
    DEFAULT_OAUTH2_RESPONSE_TYPE.to_string()
}

impl AuthorizeRequest {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            state: state.into(),
            scope: default_scope(),
            response_type: default_response_type(),
        }
    }

    pub fn to_params(&self) -> Params {
        Params::new()
            .with("client_id", Some(&self.client_id))
            .with("redirect_uri", Some(&self.redirect_uri))
            .with("scope", Some(&self.scope))
            .with("state", Some(&self.state))
            .with("response_type", Some(&self.response_type))
    }
}
