/// Errors surfaced by command handlers.
use thiserror::Error;

use crate::api::ApiError;

/// Everything that can end an invocation with a failure status.
#[derive(Debug, Error)]
pub enum CliError {
    /// No API key from `--api-key` or `EXA_API_KEY`.
    #[error("EXA_API_KEY not set. Use --api-key or set EXA_API_KEY environment variable.")]
    MissingApiKey,

    /// A `contents` argument is not an http(s) URL.
    #[error("Invalid URL \"{url}\". URLs must use HTTP or HTTPS protocol.")]
    InvalidUrl {
        /// The rejected argument.
        url: String,
    },

    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Writing output failed.
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing JSON output failed.
    #[error("could not serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exit code mapping for `CliError` variants.
impl CliError {
    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidUrl { .. } | Self::Api(ApiError::InvalidBaseUrl { .. }) => 2,
            Self::MissingApiKey | Self::Api(ApiError::Unauthorized { .. }) => 3,
            Self::Api(_) | Self::Io(_) | Self::Json(_) => 1,
        }
    }
}
