/// In-memory `ExaApi` used by command tests.
use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use crate::answer::AnswerChunk;
use crate::api::{
    AnswerOptions, AnswerStream, ApiError, ContentsOptions, ExaApi, ListOptions, PollOptions,
    ResearchCreateRequest, SearchOptions, SimilarOptions,
};
use crate::types::{AnswerResponse, ResearchList, ResearchTask, SearchResponse};

/// A recorded API call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(String, SearchOptions),
    FindSimilar(String, SimilarOptions),
    GetContents(Vec<String>, ContentsOptions),
    Answer(String, AnswerOptions),
    StreamAnswer(String, AnswerOptions),
    ResearchCreate(ResearchCreateRequest),
    ResearchGet(String),
    ResearchList(ListOptions),
    ResearchPoll(String, PollOptions),
}

/// Canned responses plus a log of every call made.
#[derive(Default)]
pub struct FakeExa {
    pub calls: Mutex<Vec<Call>>,
    pub search_response: SearchResponse,
    pub answer_response: AnswerResponse,
    pub chunks: Mutex<Vec<Result<AnswerChunk, ApiError>>>,
    pub task: ResearchTask,
    pub finished_task: ResearchTask,
    pub list: ResearchList,
    /// Returned (once) by the next call instead of its canned response.
    pub failure: Mutex<Option<ApiError>>,
}

impl FakeExa {
    pub fn with_chunks(chunks: Vec<Result<AnswerChunk, ApiError>>) -> Self {
        Self {
            chunks: Mutex::new(chunks),
            ..Self::default()
        }
    }

    pub fn failing(err: ApiError) -> Self {
        Self {
            failure: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExaApi for FakeExa {
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.record(Call::Search(query.to_owned(), options.clone()))?;
        Ok(self.search_response.clone())
    }

    async fn find_similar(
        &self,
        url: &str,
        options: &SimilarOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.record(Call::FindSimilar(url.to_owned(), options.clone()))?;
        Ok(self.search_response.clone())
    }

    async fn get_contents(
        &self,
        urls: &[String],
        options: &ContentsOptions,
    ) -> Result<SearchResponse, ApiError> {
        self.record(Call::GetContents(urls.to_vec(), options.clone()))?;
        Ok(self.search_response.clone())
    }

    async fn answer(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerResponse, ApiError> {
        self.record(Call::Answer(query.to_owned(), options.clone()))?;
        Ok(self.answer_response.clone())
    }

    async fn stream_answer(
        &self,
        query: &str,
        options: &AnswerOptions,
    ) -> Result<AnswerStream, ApiError> {
        self.record(Call::StreamAnswer(query.to_owned(), options.clone()))?;
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        Ok(stream::iter(chunks).boxed())
    }

    async fn research_create(
        &self,
        request: &ResearchCreateRequest,
    ) -> Result<ResearchTask, ApiError> {
        self.record(Call::ResearchCreate(request.clone()))?;
        Ok(self.task.clone())
    }

    async fn research_get(&self, research_id: &str) -> Result<ResearchTask, ApiError> {
        self.record(Call::ResearchGet(research_id.to_owned()))?;
        Ok(self.task.clone())
    }

    async fn research_list(&self, options: &ListOptions) -> Result<ResearchList, ApiError> {
        self.record(Call::ResearchList(options.clone()))?;
        Ok(self.list.clone())
    }

    async fn research_poll_until_finished(
        &self,
        research_id: &str,
        options: &PollOptions,
    ) -> Result<ResearchTask, ApiError> {
        self.record(Call::ResearchPoll(research_id.to_owned(), *options))?;
        Ok(self.finished_task.clone())
    }
}
