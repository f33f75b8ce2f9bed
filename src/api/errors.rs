/// Errors from the Exa API client layer.
use std::time::Duration;

use thiserror::Error;

/// Typed errors from the API layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API rejected the key (HTTP 401/403).
    #[error("API key rejected: {message}")]
    Unauthorized {
        /// Message returned by the API.
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("API request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message returned by the API, or the raw body.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("could not decode API response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("invalid API base URL '{url}'")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
    },

    /// A research task did not reach a terminal status in time.
    #[error("research task '{research_id}' did not finish within {}ms", timeout.as_millis())]
    PollTimeout {
        /// The polled task.
        research_id: String,
        /// The timeout bound that was exceeded.
        timeout: Duration,
    },
}

impl ApiError {
    /// Build an error from a non-success status and the response body.
    ///
    /// The body's `error` or `message` field is preferred over the raw text.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            401 | 403 => Self::Unauthorized { message },
            _ => Self::Status { status, message },
        }
    }
}

fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("message")))
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| body.trim().to_owned(), str::to_owned)
}
