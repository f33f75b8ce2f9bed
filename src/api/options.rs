/// Request options sent to the API.
///
/// Every field is optional and omitted from the JSON body when unset, so the
/// API applies its own defaults.
use std::time::Duration;

use serde::Serialize;

/// Which page contents to return alongside search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,
}

impl ContentsSelection {
    /// Build from CLI flags. `None` when no content was requested.
    #[must_use]
    pub fn from_flags(text: bool, highlights: bool, summary: bool) -> Option<Self> {
        if !(text || highlights || summary) {
            return None;
        }
        Some(Self {
            text: text.then_some(true),
            highlights: highlights.then_some(true),
            summary: summary.then_some(true),
        })
    }
}

/// Options for `POST /search`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_autoprompt: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub search_type: Option<String>,
    /// Present only for the search-and-contents variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<ContentsSelection>,
}

/// Options for `POST /findSimilar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_source_domain: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<ContentsSelection>,
}

/// Options for `POST /contents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,
    /// Accept cached contents no older than this many hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_hours: Option<u32>,
}

/// Options for `POST /answer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptions {
    /// Include full source text in citations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Body of `POST /research/v1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchCreateRequest {
    pub instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Query parameters of `GET /research/v1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Default delay between research status checks, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Default bound on how long to wait for a research task, in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 600_000;

/// How to wait for a research task to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
        }
    }
}
