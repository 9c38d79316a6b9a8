//! Error types for the Weasyl API client.
//!
//! # Design
//! The five statuses the API documents (401, 403, 404, 422, 500) each get a
//! dedicated variant so callers can match on them directly. Every other
//! non-2xx status lands in `Unclassified` with the raw status code. All
//! status variants carry the same `ErrorBody` triple extracted from the
//! server's error payload.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Placeholder for the numeric error code when the server did not supply one.
pub const SENTINEL_CODE: i64 = -1;

/// Message used when an error payload is JSON but carries no `error` object.
pub const UNSPECIFIED_MESSAGE: &str = "Unspecified";

/// The (message, code, reason) triple carried by every status error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    /// `error.name`, else `error.text`, else the raw body when it is not JSON.
    pub message: String,
    /// `error.code`, or `SENTINEL_CODE`.
    pub code: i64,
    /// HTTP reason phrase of the response.
    pub reason: String,
}

impl ErrorBody {
    /// Extract the error triple from a failed response body.
    ///
    /// Weasyl documents `{"error": {"name": ...}}` but has been observed to
    /// answer with `{"error": {"text": ...}}` and, for a bad API key, with
    /// plain text.
    pub fn from_response_text(text: &str, reason: &str) -> Self {
        let mut body = ErrorBody {
            message: UNSPECIFIED_MESSAGE.to_string(),
            code: SENTINEL_CODE,
            reason: reason.to_string(),
        };

        let decoded: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                body.message = text.to_string();
                return body;
            }
        };

        if let Some(error) = decoded.get("error") {
            let message = error
                .get("name")
                .or_else(|| error.get("text"))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            if let Some(message) = message {
                body.message = message;
            }
            if let Some(code) = error.get("code").and_then(Value::as_i64) {
                body.code = code;
            }
        }
        body
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.message)?;
        if self.code != SENTINEL_CODE {
            write!(f, " (code {})", self.code)?;
        }
        if !self.reason.is_empty() {
            write!(f, " [{}]", self.reason)?;
        }
        Ok(())
    }
}

/// Category of an `ApiError`, for callers that do not need the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Unprocessable,
    ServerError,
    Unclassified,
    Decode,
    Transport,
    Config,
}

/// Errors returned by the Weasyl client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: no session, or the API key is invalid.
    #[error("unauthorized: {0}")]
    Unauthorized(ErrorBody),

    /// 403: permission denied, missing record, or rating filter exceeded.
    #[error("forbidden: {0}")]
    Forbidden(ErrorBody),

    /// 404
    #[error("not found: {0}")]
    NotFound(ErrorBody),

    /// 422: the server rejected a parameter.
    #[error("unprocessable: {0}")]
    Unprocessable(ErrorBody),

    /// 500
    #[error("server error: {0}")]
    ServerError(ErrorBody),

    /// Any other non-2xx status, and every failed POST.
    #[error("HTTP {status}: {body}")]
    Unclassified { status: u16, body: ErrorBody },

    /// A successful response could not be decoded into the expected shape.
    #[error("decoding response failed: {0}")]
    Decode(String),

    /// No response was received.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Build the status error for a failed GET response.
    pub fn from_status(status: u16, body: ErrorBody) -> Self {
        match status {
            401 => ApiError::Unauthorized(body),
            403 => ApiError::Forbidden(body),
            404 => ApiError::NotFound(body),
            422 => ApiError::Unprocessable(body),
            500 => ApiError::ServerError(body),
            status => ApiError::Unclassified { status, body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Unprocessable(_) => ErrorKind::Unprocessable,
            ApiError::ServerError(_) => ErrorKind::ServerError,
            ApiError::Unclassified { .. } => ErrorKind::Unclassified,
            ApiError::Decode(_) => ErrorKind::Decode,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// The server's error triple, for errors that came from a response.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::Forbidden(body)
            | ApiError::NotFound(body)
            | ApiError::Unprocessable(body)
            | ApiError::ServerError(body)
            | ApiError::Unclassified { body, .. } => Some(body),
            ApiError::Decode(_) | ApiError::Transport(_) | ApiError::Config(_) => None,
        }
    }

    /// Shorthand for `body().map(|b| b.message.as_str())`.
    pub fn message(&self) -> Option<&str> {
        self.body().map(|b| b.message.as_str())
    }
}
