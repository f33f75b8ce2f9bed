/// The `ExaApi` trait and its HTTP implementation.
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::debug;

use super::errors::ApiError;
use super::options::{
    AnswerOptions, ContentsOptions, ListOptions, PollOptions, ResearchCreateRequest,
    SearchOptions, SimilarOptions,
};
use super::sse::answer_chunks;
use crate::answer::AnswerChunk;
use crate::types::{AnswerResponse, ResearchList, ResearchTask, SearchResponse};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.exa.ai";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

const NO_QUERY: &[(&str, &str)] = &[];

/// An ordered, finite, non-restartable stream of answer chunks.
pub type AnswerStream = BoxStream<'static, Result<AnswerChunk, ApiError>>;

/// Operations the commands need from the Exa API.
#[async_trait]
pub trait ExaApi: Send + Sync {
    /// Search the web. Results carry page contents when `options.contents` is set.
    async fn search(&self, query: &str, options: &SearchOptions)
    -> Result<SearchResponse, ApiError>;

    /// Find pages similar to `url`.
    async fn find_similar(
        &self,
        url: &str,
        options: &SimilarOptions,
    ) -> Result<SearchResponse, ApiError>;

    /// Fetch the contents of the given pages.
    async fn get_contents(
        &self,
        urls: &[String],
        options: &ContentsOptions,
    ) -> Result<SearchResponse, ApiError>;

    /// Answer a question in one response.
    async fn answer(&self, query: &str, options: &AnswerOptions)
    -> Result<AnswerResponse, ApiError>;

    /// Answer a question as a stream of chunks.
    async fn stream_answer(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerStream, ApiError>;

    /// Create a research task.
    async fn research_create(
        &self,
        request: &ResearchCreateRequest,
    ) -> Result<ResearchTask, ApiError>;

    /// Fetch one research task.
    async fn research_get(&self, research_id: &str) -> Result<ResearchTask, ApiError>;

    /// List research tasks, newest first.
    async fn research_list(&self, options: &ListOptions) -> Result<ResearchList, ApiError>;

    /// Re-fetch a research task until it reaches a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::PollTimeout` once `options.timeout` has elapsed
    /// without a terminal status, or any error from fetching the task.
    async fn research_poll_until_finished(
        &self,
        research_id: &str,
        options: &PollOptions,
    ) -> Result<ResearchTask, ApiError> {
        let started = Instant::now();
        loop {
            let task = self.research_get(research_id).await?;
            if task.is_finished() {
                return Ok(task);
            }
            let elapsed = started.elapsed();
            if elapsed >= options.timeout {
                return Err(ApiError::PollTimeout {
                    research_id: research_id.to_owned(),
                    timeout: options.timeout,
                });
            }
            debug!(research_id, status = %task.status, "research task still running");
            // The last wait is cut short so the final check lands on the deadline.
            tokio::time::sleep(options.poll_interval.min(options.timeout - elapsed)).await;
        }
    }
}

#[derive(Serialize)]
struct QueryBody<'a, T> {
    query: &'a str,
    #[serde(flatten)]
    options: &'a T,
}

#[derive(Serialize)]
struct SimilarBody<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a SimilarOptions,
}

#[derive(Serialize)]
struct ContentsBody<'a> {
    urls: &'a [String],
    #[serde(flatten)]
    options: &'a ContentsOptions,
}

#[derive(Serialize)]
struct AnswerBody<'a> {
    query: &'a str,
    stream: bool,
    #[serde(flatten)]
    options: &'a AnswerOptions,
}

/// `ExaApi` over HTTPS with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpExaClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl HttpExaClient {
    /// Create a client for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute
    /// URL with a path, or `ApiError::Transport` if the HTTP client cannot be
    /// built (e.g. no TLS backend).
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl {
                url: base_url.to_owned(),
            })?;
        let http = Client::builder()
            .user_agent(concat!("exacli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Build an endpoint URL by appending path segments to the base URL.
    ///
    /// Segments are percent-encoded, so ids cannot escape their position.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        debug!(method = "POST", path = url.path(), "sending request");
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    async fn get_json<Q, T>(&self, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        debug!(method = "GET", path = url.path(), "sending request");
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

/// Turn a non-success status into an `ApiError`, passing successes through.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    debug!(status = status.as_u16(), "received response");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl ExaApi for HttpExaClient {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.post_json(&["search"], &QueryBody { query, options })
            .await
    }

    async fn find_similar(
        &self,
        url: &str,
        options: &SimilarOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.post_json(&["findSimilar"], &SimilarBody { url, options })
            .await
    }

    async fn get_contents(
        &self,
        urls: &[String],
        options: &ContentsOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.post_json(&["contents"], &ContentsBody { urls, options })
            .await
    }

    async fn answer(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResponse, ApiError> {
        let body = AnswerBody {
            query,
            stream: false,
            options,
        };
        self.post_json(&["answer"], &body).await
    }

    async fn stream_answer(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerStream, ApiError> {
        let url = self.endpoint(&["answer"]);
        debug!(method = "POST", path = url.path(), "opening answer stream");
        let body = AnswerBody {
            query,
            stream: true,
            options,
        };
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(answer_chunks(response.bytes_stream()).boxed())
    }

    async fn research_create(
        &self,
        request: &ResearchCreateRequest,
    ) -> Result<ResearchTask, ApiError> {
        self.post_json(&["research", "v1"], request).await
    }

    async fn research_get(&self, research_id: &str) -> Result<ResearchTask, ApiError> {
        self.get_json(&["research", "v1", research_id], NO_QUERY)
            .await
    }

    async fn research_list(&self, options: &ListOptions) -> Result<ResearchList, ApiError> {
        self.get_json(&["research", "v1"], options).await
    }
}
