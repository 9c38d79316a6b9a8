//! Blocking facade over `WeasylClient` and a `Transport`.
//!
//! Every endpoint method is a thin call into `get` or `post` with a fixed
//! path. Where the login name is referred to, it is the lowercase
//! alphanumeric form Weasyl uses in URLs.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::client::WeasylClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::params::Params;
use crate::transport::{Transport, UreqTransport};
use crate::types::{AuthorizeRequest, FrontpageQuery, GalleryQuery, InboxQuery, SubmissionViewOptions};

/// A Weasyl API session.
///
/// # Example
/// ```no_run
/// use weasyl_core::{FrontpageQuery, Weasyl};
///
/// let api = Weasyl::new();
/// let page = api.frontpage(&FrontpageQuery { count: Some(10), ..Default::default() })?;
/// println!("{} submissions", page.as_array().map_or(0, Vec::len));
/// # Ok::<(), weasyl_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Weasyl<T = UreqTransport> {
    client: WeasylClient,
    transport: T,
}

impl Weasyl<UreqTransport> {
    /// Unauthenticated session against the public deployment.
    pub fn new() -> Self {
        let config = ClientConfig::default();
        Self::with_transport(WeasylClient::from_config(&config), UreqTransport::from_config(&config))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;
        Ok(Self::with_transport(
            WeasylClient::from_config(config),
            UreqTransport::from_config(config),
        ))
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::from_env()?)
    }
}

impl Default for Weasyl<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Weasyl<T> {
    pub fn with_transport(client: WeasylClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &WeasylClient {
        &self.client
    }

    pub fn api_key(&self) -> &str {
        self.client.api_key()
    }

    /// Replace the credential for all subsequent requests. An empty key makes
    /// the session unauthenticated.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.client.set_api_key(api_key);
    }

    /// GET `path` and decode the JSON body.
    pub fn get(&self, path: &str, params: &Params) -> Result<Value, ApiError> {
        let request = self.client.build_get(path, params);
        let response = self.transport.execute(request)?;
        self.client.parse_get(response)
    }

    /// POST `params` as a form to `path` and return the raw body text.
    pub fn post(&self, path: &str, params: &Params) -> Result<String, ApiError> {
        let request = self.client.build_post(path, params);
        let response = self.transport.execute(request)?;
        self.client.parse_post(response)
    }

    /// Current Weasyl build, as a shortened commit SHA.
    pub fn version(&self) -> Result<String, ApiError> {
        let response = self.get("version", &Params::new())?;
        response
            .get("short_sha")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("version response has no short_sha".to_string()))
    }

    /// The logged-in user, e.g. `{"login": "weykent", "userid": 5756}`.
    /// Unauthorized when there is no session.
    pub fn whoami(&self) -> Result<Value, ApiError> {
        self.get("whoami", &Params::new())
    }

    /// Avatar URL for a login name. No request is made.
    pub fn useravatar(&self, username: &str) -> String {
        self.client.useravatar(username)
    }

    /// Front page submissions, filtered by the current user's settings. At
    /// most 100 are returned whatever `count` asks for.
    pub fn frontpage(&self, query: &FrontpageQuery) -> Result<Value, ApiError> {
        self.get("submissions/frontpage", &query.to_params())
    }

    /// A single submission. A missing submission is `Forbidden` with message
    /// `submissionRecordMissing`; one hidden by the rating filter is
    /// `Forbidden` with `RatingExceeded` unless `options.anyway` is set.
    pub fn view_submission(
        &self,
        submitid: u64,
        options: SubmissionViewOptions,
    ) -> Result<Value, ApiError> {
        self.get(&format!("submissions/{submitid}/view"), &options.to_params())
    }

    pub fn view_user(&self, username: &str) -> Result<Value, ApiError> {
        self.get(&format!("users/{username}/view"), &Params::new())
    }

    /// One page of a user's gallery: `{"submissions": [...], "backid": ..,
    /// "nextid": ..}`. Feed `backid`/`nextid` back through `query` to page.
    pub fn user_gallery(&self, username: &str, query: &GalleryQuery) -> Result<Value, ApiError> {
        self.get(&format!("users/{username}/gallery"), &query.to_params())
    }

    /// One page of the authenticated user's submission inbox.
    pub fn message_submissions(&self, query: &InboxQuery) -> Result<Value, ApiError> {
        self.get("messages/submissions", &query.to_params())
    }

    /// Notification counts (`comments`, `journals`, `notifications`,
    /// `submissions`, `unread_notes`). The server caches this for about three
    /// minutes or until a new note arrives.
    pub fn message_summary(&self) -> Result<Value, ApiError> {
        self.get("messages/summary", &Params::new())
    }

    /// URL to send the user agent to for an authorization-code grant.
    pub fn oauth2_authorize_url(&self, request: &AuthorizeRequest) -> String {
        self.client.oauth2_authorize_url(request)
    }

    /// Fetch or refresh an OAuth2 token. `extra` carries the RFC 6749 form
    /// parameters (`grant_type`, `code`, `refresh_token`, ...). The body is
    /// returned as received. Access tokens expire after an hour.
    pub fn oauth2_token(
        &self,
        client_secret: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<String, ApiError> {
        let mut params: Params = extra.iter().map(|(k, v)| (k.as_str(), Some(v))).collect();
        params.insert("client_secret", Some(client_secret));
        self.post("oauth2/token", &params)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::client::API_KEY_HEADER;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    use super::*;

    /// Replays canned responses and keeps every request it was handed.
    #[derive(Default)]
    struct Recorder {
        responses: RefCell<VecDeque<HttpResponse>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl Recorder {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(HttpResponse {
                status,
                reason: String::new(),
                headers: Vec::new(),
                body: body.to_string(),
            });
            self
        }

        fn last(&self) -> HttpRequest {
            self.requests.borrow().last().cloned().unwrap()
        }
    }

    impl Transport for &Recorder {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ApiError::Transport("no canned response".to_string()))
        }
    }

    fn api(recorder: &Recorder) -> Weasyl<&Recorder> {
        Weasyl::with_transport(WeasylClient::new("https://www.weasyl.com/api"), recorder)
    }

    #[test]
    fn version_extracts_short_sha() {
        let recorder = Recorder::default().reply(200, r#"{"short_sha":"c759381"}"#);
        assert_eq!(api(&recorder).version().unwrap(), "c759381");
        assert_eq!(recorder.last().url, "https://www.weasyl.com/api/version");
    }

    #[test]
    fn version_without_short_sha_is_a_decode_error() {
        let recorder = Recorder::default().reply(200, "{}");
        let err = api(&recorder).version().unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn frontpage_sends_exact_count() {
        let items: Vec<Value> = (0..10).map(|i| serde_json::json!({ "submitid": i })).collect();
        let recorder = Recorder::default().reply(200, &Value::Array(items).to_string());
        let page = api(&recorder)
            .frontpage(&FrontpageQuery {
                since: None,
                count: Some(10),
            })
            .unwrap();
        assert_eq!(page.as_array().unwrap().len(), 10);
        assert_eq!(
            recorder.last().url,
            "https://www.weasyl.com/api/submissions/frontpage?count=10"
        );
    }

    #[test]
    fn view_submission_builds_path_and_flags() {
        let recorder = Recorder::default().reply(200, r#"{"submitid":602979}"#);
        let options = SubmissionViewOptions {
            anyway: true,
            increment_views: true,
        };
        api(&recorder).view_submission(602979, options).unwrap();
        assert_eq!(
            recorder.last().url,
            "https://www.weasyl.com/api/submissions/602979/view?anyway=true&increment_views=true"
        );
    }

    #[test]
    fn user_endpoints_build_paths() {
        let recorder = Recorder::default()
            .reply(200, "{}")
            .reply(200, r#"{"submissions":[],"backid":null,"nextid":null}"#);
        let api = api(&recorder);
        api.view_user("rechner").unwrap();
        assert_eq!(recorder.last().url, "https://www.weasyl.com/api/users/rechner/view");

        let query = GalleryQuery {
            nextid: Some(1000),
            ..Default::default()
        };
        api.user_gallery("rechner", &query).unwrap();
        assert_eq!(
            recorder.last().url,
            "https://www.weasyl.com/api/users/rechner/gallery?nextid=1000"
        );
    }

    #[test]
    fn inbox_endpoints_use_current_key() {
        let recorder = Recorder::default().reply(200, "{}").reply(200, "{}");
        let mut api = api(&recorder);
        api.set_api_key("key");
        api.message_summary().unwrap();
        assert_eq!(recorder.last().header(API_KEY_HEADER), Some("key"));

        api.set_api_key("");
        api.message_submissions(&InboxQuery {
            count: Some(5),
            ..Default::default()
        })
        .unwrap();
        let request = recorder.last();
        assert_eq!(request.url, "https://www.weasyl.com/api/messages/submissions?count=5");
        assert!(request.header(API_KEY_HEADER).is_none());
    }

    #[test]
    fn whoami_without_session_is_unauthorized() {
        let recorder = Recorder::default().reply(401, r#"{"error":{"text":"Session unsigned"}}"#);
        let err = api(&recorder).whoami().unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.message(), Some("Session unsigned"));
    }

    #[test]
    fn oauth2_token_posts_secret_and_extras() {
        let recorder = Recorder::default().reply(200, r#"{"access_token":"tok"}"#);
        let mut extra = BTreeMap::new();
        extra.insert("grant_type".to_string(), "refresh_token".to_string());
        extra.insert("refresh_token".to_string(), "r1".to_string());

        let text = api(&recorder).oauth2_token("s3cret", &extra).unwrap();
        assert_eq!(text, r#"{"access_token":"tok"}"#);

        let request = recorder.last();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://www.weasyl.com/api/oauth2/token");
        assert_eq!(
            request.body.as_deref(),
            Some("client_secret=s3cret&grant_type=refresh_token&refresh_token=r1")
        );
    }

    #[test]
    fn transport_failure_propagates() {
        let recorder = Recorder::default();
        let err = api(&recorder).message_summary().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
