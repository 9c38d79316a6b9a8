//! Blocking client for the Weasyl REST API (version 1.2).
//!
//! # Overview
//! `WeasylClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `Weasyl` pairs it
//! with a `Transport` and exposes one method per API endpoint.
//!
//! # Design
//! - The API key travels in the `X-Weasyl-API-Key` header; an empty key means
//!   unauthenticated and sends no header at all.
//! - Parameters are recorded with optional values and absent ones are culled
//!   before encoding, for GET query strings and POST bodies alike.
//! - GET responses are JSON and failures map to one `ApiError` variant per
//!   documented status. POST responses are returned as raw text.
//! - Payloads stay untyped `serde_json::Value`.
//! - No caching, retries or pagination helpers.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod transport;
pub mod types;

pub use api::Weasyl;
pub use client::WeasylClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorBody, ErrorKind, SENTINEL_CODE};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use params::Params;
pub use transport::{Transport, UreqTransport};
pub use types::{AuthorizeRequest, FrontpageQuery, GalleryQuery, InboxQuery, SubmissionViewOptions};
