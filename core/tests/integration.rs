//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the `Weasyl` facade
//! over real HTTP with the default ureq transport. Validates request building,
//! credential handling and error mapping against an actual server.

use std::collections::BTreeMap;
use std::time::Duration;

use mock_server::{CLIENT_SECRET, GENERAL_SUBMISSION, MATURE_SUBMISSION, VALID_API_KEY, VERSION_SHA};
use weasyl_core::{
    ApiError, AuthorizeRequest, ClientConfig, ErrorKind, FrontpageQuery, GalleryQuery, InboxQuery,
    SubmissionViewOptions, Weasyl, SENTINEL_CODE,
};

/// Start the mock server in the background and return its base address.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn api(addr: &str, key: &str) -> Weasyl {
    let config = ClientConfig::new()
        .with_base_url(format!("{addr}/api"))
        .with_site_url(addr)
        .with_api_key(key)
        .with_timeout(Duration::from_secs(10));
    Weasyl::from_config(&config).unwrap()
}

#[test]
fn unauthenticated_session() {
    let addr = start_server();
    let api = api(&addr, "");

    assert_eq!(api.version().unwrap(), VERSION_SHA);
    assert_eq!(api.useravatar("rechner"), format!("{addr}/~rechner/avatar"));

    let err = api.whoami().unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.message(), Some("Session unsigned"));
    assert_eq!(err.body().unwrap().reason, "Unauthorized");

    let err = api.message_submissions(&InboxQuery::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    let err = api.message_summary().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn submissions() {
    let addr = start_server();
    let api = api(&addr, "");

    let page = api
        .frontpage(&FrontpageQuery {
            since: None,
            count: Some(10),
        })
        .unwrap();
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 10);
    for key in ["rating", "media", "owner", "submitid"] {
        assert!(page[0].get(key).is_some(), "front page item lacks {key}");
    }

    let submission = api
        .view_submission(GENERAL_SUBMISSION, SubmissionViewOptions::default())
        .unwrap();
    assert_eq!(submission["submitid"], GENERAL_SUBMISSION);
    assert_eq!(submission["rating"], "general");
    assert!(submission["views"].as_u64().unwrap() >= 3);

    let err = api
        .view_submission(999999, SubmissionViewOptions::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    assert_eq!(err.message(), Some("submissionRecordMissing"));

    let err = api
        .view_submission(MATURE_SUBMISSION, SubmissionViewOptions::default())
        .unwrap_err();
    assert_eq!(err.message(), Some("RatingExceeded"));

    let anyway = SubmissionViewOptions {
        anyway: true,
        increment_views: false,
    };
    let mature = api.view_submission(MATURE_SUBMISSION, anyway).unwrap();
    assert_eq!(mature["rating"], "mature");

    let err = api
        .frontpage(&FrontpageQuery {
            since: Some("last tuesday".to_string()),
            count: None,
        })
        .unwrap_err();
    match err {
        ApiError::Unprocessable(body) => {
            assert_eq!(body.message, "invalidTimestamp");
            assert_ne!(body.code, SENTINEL_CODE);
        }
        other => panic!("expected Unprocessable, got {other:?}"),
    }
}

#[test]
fn users_and_gallery_paging() {
    let addr = start_server();
    let api = api(&addr, "");

    let user = api.view_user("rechner").unwrap();
    assert_eq!(user["created_at"], "2014-05-03T02:20:29Z");
    assert_eq!(user["suspended"], false);
    assert!(!user["recent_submissions"].as_array().unwrap().is_empty());

    let err = api.view_user("nobody").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let first = api
        .user_gallery(
            "rechner",
            &GalleryQuery {
                count: Some(10),
                ..Default::default()
            },
        )
        .unwrap();
    for key in ["backid", "nextid", "submissions"] {
        assert!(first.get(key).is_some(), "gallery lacks {key}");
    }
    let nextid = first["nextid"].as_u64().unwrap();

    let older = api
        .user_gallery(
            "rechner",
            &GalleryQuery {
                count: Some(10),
                nextid: Some(nextid),
                ..Default::default()
            },
        )
        .unwrap();
    let ids: Vec<u64> = older["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["submitid"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 10);
    assert!(ids.iter().all(|id| *id < nextid));

    let backid = older["backid"].as_u64().unwrap();
    let newer = api
        .user_gallery(
            "rechner",
            &GalleryQuery {
                count: Some(10),
                backid: Some(backid),
                ..Default::default()
            },
        )
        .unwrap();
    let ids: Vec<u64> = newer["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["submitid"].as_u64().unwrap())
        .collect();
    assert!(ids.iter().all(|id| *id > backid));
}

#[test]
fn credential_lifecycle() {
    let addr = start_server();
    let mut api = api(&addr, VALID_API_KEY);

    let me = api.whoami().unwrap();
    assert_eq!(me["login"], "rechner");
    let summary = api.message_summary().unwrap();
    assert!(summary.get("unread_notes").is_some());

    let inbox = api
        .message_submissions(&InboxQuery {
            count: Some(2),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(inbox["submissions"].as_array().unwrap().len(), 2);
    let nexttime = inbox["nexttime"].as_i64().unwrap();
    let older = api
        .message_submissions(&InboxQuery {
            nexttime: Some(nexttime),
            ..Default::default()
        })
        .unwrap();
    assert!(older["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["unixtime"].as_i64().unwrap() < nexttime));

    // An unknown key gets a plain-text answer.
    api.set_api_key("not-a-real-key");
    let err = api.whoami().unwrap_err();
    let body = err.body().unwrap();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(body.message, "Invalid API key");
    assert_eq!(body.code, SENTINEL_CODE);

    // Clearing the key drops the header entirely.
    api.set_api_key("");
    assert!(!api.client().is_authenticated());
    let err = api.whoami().unwrap_err();
    assert_eq!(err.message(), Some("Session unsigned"));
}

#[test]
fn oauth2_flow() {
    let addr = start_server();
    let api = api(&addr, "");

    let url = api.oauth2_authorize_url(&AuthorizeRequest::new(
        "client",
        "https://example.com/cb",
        "st8",
    ));
    assert!(url.starts_with(&format!("{addr}/api/oauth2/authorize?")));
    assert!(url.contains("scope=wholesite"));
    assert!(url.contains("response_type=code"));

    let mut extra = BTreeMap::new();
    extra.insert("grant_type".to_string(), "authorization_code".to_string());
    extra.insert("code".to_string(), "abc".to_string());
    let text = api.oauth2_token(CLIENT_SECRET, &extra).unwrap();
    let token: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(token["expires_in"], 3600);

    let err = api.oauth2_token("wrong", &extra).unwrap_err();
    assert!(matches!(err, ApiError::Unclassified { status: 401, .. }));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api = api(&format!("http://127.0.0.1:{port}"), "");
    let err = api.version().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
