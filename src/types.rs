/// Shared serializable types: API responses and the error envelope.
///
/// Response types name the fields the markdown renderers read and keep every
/// other field in `extra`, so JSON output reproduces what the API sent.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::answer::Citation;
use crate::answer::chunk::lenient_citations;
use crate::commands::CliError;

/// Research statuses after which a task never changes again.
pub const TERMINAL_RESEARCH_STATUSES: [&str; 3] = ["completed", "failed", "canceled"];

/// Request cost breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostDollars {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One search, similar or contents result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_scores: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of search, find-similar and get-contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_dollars: Option<CostDollars>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Non-streaming answer response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_dollars: Option<CostDollars>,
    /// A string, or a JSON object when an output schema was used.
    #[serde(default)]
    pub answer: Value,
    /// Citations with a URL; unreadable or URL-less entries are dropped.
    #[serde(default, deserialize_with = "lenient_citations")]
    pub citations: Vec<Citation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Final output of a research task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A progress event of a research task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchEvent {
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A long-running research task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchTask {
    pub research_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ResearchOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<ResearchEvent>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResearchTask {
    /// Whether the task reached a terminal status.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        TERMINAL_RESEARCH_STATUSES.contains(&self.status.as_str())
    }
}

/// One page of research tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchList {
    #[serde(default)]
    pub data: Vec<ResearchTask>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    /// Error details.
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status returned by the API, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorOutput {
    /// Construct from a `CliError`.
    #[must_use]
    pub fn from_cli_error(err: &CliError) -> Self {
        use crate::api::ApiError;
        let (code, status) = match err {
            CliError::MissingApiKey => ("missing_api_key", None),
            CliError::InvalidUrl { .. } => ("invalid_url", None),
            CliError::Api(api) => match api {
                ApiError::Unauthorized { .. } => ("unauthorized", None),
                ApiError::Status { status, .. } => ("api_error", Some(*status)),
                ApiError::Transport(_) => ("transport_error", None),
                ApiError::Decode(_) => ("decode_error", None),
                ApiError::InvalidBaseUrl { .. } => ("invalid_base_url", None),
                ApiError::PollTimeout { .. } => ("poll_timeout", None),
            },
            CliError::Io(_) => ("io_error", None),
            CliError::Json(_) => ("json_error", None),
        };
        Self {
            ok: false,
            error: ErrorDetail {
                code: code.to_owned(),
                message: err.to_string(),
                status,
            },
        }
    }
}
