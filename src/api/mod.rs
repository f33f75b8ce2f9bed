/// Exa API collaborator: client trait, HTTP implementation, request options.
pub mod client;
pub mod errors;
pub mod options;
pub mod sse;

pub use client::{AnswerStream, DEFAULT_BASE_URL, ExaApi, HttpExaClient};
pub use errors::ApiError;
pub use options::{
    AnswerOptions, ContentsOptions, ContentsSelection, ListOptions, PollOptions,
    ResearchCreateRequest, SearchOptions, SimilarOptions,
};
