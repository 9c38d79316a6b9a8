//! In-memory stand-in for the slice of the Weasyl API the client uses.
//!
//! Responses follow the shapes and error bodies the real service produces,
//! including its quirks: a missing session answers `{"error":{"text":..}}`,
//! an unknown API key answers in plain text, and missing submissions are
//! 403 rather than 404.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_KEY_HEADER: &str = "x-weasyl-api-key";
/// The only API key the mock accepts.
pub const VALID_API_KEY: &str = "mock-api-key";
pub const CLIENT_SECRET: &str = "mock-client-secret";
pub const VERSION_SHA: &str = "c759381";

pub const OWNER_LOGIN: &str = "rechner";
pub const OWNER_USERID: u64 = 5756;
pub const GENERAL_SUBMISSION: u64 = 602979;
pub const MATURE_SUBMISSION: u64 = 735256;

/// Submissions on the front page, newest first.
pub const FRONTPAGE_SIZE: u64 = 150;
/// Submissions in the owner's gallery, ids `1..=GALLERY_SIZE`.
pub const GALLERY_SIZE: u64 = 30;
pub const MAX_COUNT: u64 = 100;
const INBOX_START: i64 = 1_400_000_000;
const INBOX_SIZE: i64 = 5;

#[derive(Debug, Default)]
pub struct Store {
    pub views: HashMap<u64, u64>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/version", get(version))
        .route("/whoami", get(whoami))
        .route("/submissions/frontpage", get(frontpage))
        .route("/submissions/{id}/view", get(view_submission))
        .route("/users/{username}/view", get(view_user))
        .route("/users/{username}/gallery", get(user_gallery))
        .route("/messages/submissions", get(message_submissions))
        .route("/messages/summary", get(message_summary))
        .route("/oauth2/token", post(oauth2_token))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock weasyl api listening");
    }
    axum::serve(listener, app()).await
}

fn error_name(status: StatusCode, name: &str) -> Response {
    (status, Json(json!({ "error": { "name": name } }))).into_response()
}

fn error_coded(status: StatusCode, name: &str, code: i64) -> Response {
    (status, Json(json!({ "error": { "name": name, "code": code } }))).into_response()
}

fn session_unsigned() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "text": "Session unsigned" } })),
    )
        .into_response()
}

/// `Ok(true)` for a valid key, `Ok(false)` for none, and the plain-text 401
/// Weasyl sends for an unknown key.
fn authenticate(headers: &HeaderMap) -> Result<bool, Response> {
    match headers.get(API_KEY_HEADER) {
        None => Ok(false),
        Some(key) if key.as_bytes() == VALID_API_KEY.as_bytes() => Ok(true),
        Some(_) => {
            tracing::debug!("rejecting unknown api key");
            Err((StatusCode::UNAUTHORIZED, "Invalid API key").into_response())
        }
    }
}

fn require_session(headers: &HeaderMap) -> Result<(), Response> {
    if authenticate(headers)? {
        Ok(())
    } else {
        Err(session_unsigned())
    }
}

fn parse_count(params: &HashMap<String, String>) -> Result<u64, Response> {
    match params.get("count") {
        None => Ok(MAX_COUNT),
        Some(raw) => raw
            .parse::<u64>()
            .map(|n| n.min(MAX_COUNT))
            .map_err(|_| error_coded(StatusCode::UNPROCESSABLE_ENTITY, "invalidCount", 100)),
    }
}

fn parse_id(params: &HashMap<String, String>, key: &str) -> Result<Option<u64>, Response> {
    params
        .get(key)
        .map(|raw| raw.parse::<u64>())
        .transpose()
        .map_err(|_| error_coded(StatusCode::UNPROCESSABLE_ENTITY, "invalidId", 101))
}

/// Accepts only `YYYY-MM-DDTHH:MM:SSZ`.
fn is_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 20
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            19 => *b == b'Z',
            _ => b.is_ascii_digit(),
        })
}

fn submission(submitid: u64, rating: &str, views: u64) -> Value {
    json!({
        "submitid": submitid,
        "title": format!("Submission {submitid}"),
        "rating": rating,
        "subtype": "visual",
        "owner": OWNER_LOGIN,
        "owner_login": OWNER_LOGIN,
        "posted_at": "2014-05-13T04:24:35+00:00Z",
        "tags": ["secret_societies"],
        "views": views,
        "media": {
            "thumbnail": [{ "url": format!("https://cdn.weasyl.com/{submitid}/thumb.png") }]
        },
    })
}

async fn version() -> Json<Value> {
    Json(json!({ "short_sha": VERSION_SHA }))
}

async fn whoami(headers: HeaderMap) -> Result<Json<Value>, Response> {
    require_session(&headers)?;
    Ok(Json(json!({ "login": OWNER_LOGIN, "userid": OWNER_USERID })))
}

async fn frontpage(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    authenticate(&headers)?;
    if let Some(since) = params.get("since") {
        if !is_timestamp(since) {
            return Err(error_coded(StatusCode::UNPROCESSABLE_ENTITY, "invalidTimestamp", 102));
        }
    }
    let count = parse_count(&params)?;
    let items: Vec<Value> = (0..FRONTPAGE_SIZE.min(count))
        .map(|i| submission(1_000_000 - i, "general", 0))
        .collect();
    Ok(Json(Value::Array(items)))
}

async fn view_submission(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    let authenticated = authenticate(&headers)?;
    let flag = |key: &str| params.get(key).is_some_and(|v| !v.is_empty());

    let rating = match id {
        GENERAL_SUBMISSION => "general",
        MATURE_SUBMISSION if flag("anyway") => "mature",
        MATURE_SUBMISSION => return Err(error_name(StatusCode::FORBIDDEN, "RatingExceeded")),
        _ => return Err(error_name(StatusCode::FORBIDDEN, "submissionRecordMissing")),
    };

    let mut store = db.write().await;
    let views = store.views.entry(id).or_insert(3);
    if authenticated && flag("increment_views") {
        *views += 1;
    }
    Ok(Json(submission(id, rating, *views)))
}

async fn view_user(Path(username): Path<String>) -> Result<Json<Value>, Response> {
    if username != OWNER_LOGIN {
        return Err(error_name(StatusCode::NOT_FOUND, "userRecordMissing"));
    }
    Ok(Json(json!({
        "login_name": OWNER_LOGIN,
        "username": "Rechner",
        "created_at": "2014-05-03T02:20:29Z",
        "suspended": false,
        "recent_submissions": [submission(GENERAL_SUBMISSION, "general", 3)],
    })))
}

async fn user_gallery(
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    if username != OWNER_LOGIN {
        return Err(error_name(StatusCode::NOT_FOUND, "userRecordMissing"));
    }
    let count = parse_count(&params)? as usize;
    let folderid = parse_id(&params, "folderid")?;
    let backid = parse_id(&params, "backid")?;
    let nextid = parse_id(&params, "nextid")?;

    // Newest first; submissions are spread round-robin over three folders.
    let matching: Vec<u64> = (1..=GALLERY_SIZE)
        .rev()
        .filter(|id| folderid.is_none_or(|f| id % 3 == f))
        .filter(|id| backid.is_none_or(|b| *id > b))
        .filter(|id| nextid.is_none_or(|n| *id < n))
        .collect();

    // Paging back towards newer items returns the slice adjacent to `backid`.
    let page = if backid.is_some() && nextid.is_none() {
        &matching[matching.len().saturating_sub(count)..]
    } else {
        &matching[..matching.len().min(count)]
    };

    let newer_exists = page.first().is_some_and(|first| *first < GALLERY_SIZE);
    let older_exists = page.last().is_some_and(|last| *last > 1);
    Ok(Json(json!({
        "submissions": page.iter().map(|id| submission(*id, "general", 0)).collect::<Vec<_>>(),
        "backid": page.first().filter(|_| newer_exists),
        "nextid": page.last().filter(|_| older_exists),
    })))
}

async fn message_submissions(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, Response> {
    require_session(&headers)?;
    let count = parse_count(&params)? as usize;
    let bound = |key: &str| params.get(key).and_then(|v| v.parse::<i64>().ok());
    let backtime = bound("backtime");
    let nexttime = bound("nexttime");

    let times: Vec<i64> = (0..INBOX_SIZE)
        .rev()
        .map(|i| INBOX_START + i * 100)
        .filter(|t| backtime.is_none_or(|b| *t > b))
        .filter(|t| nexttime.is_none_or(|n| *t < n))
        .take(count)
        .collect();
    let items: Vec<Value> = times
        .iter()
        .map(|t| {
            let mut item = submission(*t as u64, "general", 0);
            item["unixtime"] = json!(t);
            item
        })
        .collect();

    Ok(Json(json!({
        "submissions": items,
        "backtime": times.first(),
        "nexttime": times.last(),
    })))
}

async fn message_summary(headers: HeaderMap) -> Result<Json<Value>, Response> {
    require_session(&headers)?;
    Ok(Json(json!({
        "comments": 0,
        "journals": 1,
        "notifications": 2,
        "submissions": INBOX_SIZE,
        "unread_notes": 1,
    })))
}

/// Answers with the JSON an OAuth2 token endpoint sends. A bodyless POST is
/// treated like an empty form.
async fn oauth2_token(form: Result<Form<HashMap<String, String>>, FormRejection>) -> Response {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    if form.get("client_secret").map(String::as_str) != Some(CLIENT_SECRET) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_client" })),
        )
            .into_response();
    }
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") | Some("refresh_token") => Json(json!({
            "access_token": "mock-access-token",
            "refresh_token": "mock-refresh-token",
            "token_type": "Bearer",
            "expires_in": 3600,
        }))
        .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response(),
    }
}
