/// Incremental aggregation of a streamed answer.
///
/// The aggregator pulls chunks from an externally driven stream, echoes each
/// text fragment to a sink as soon as it arrives, and builds a citation list
/// that is unique by URL and ordered by first appearance.
use std::collections::HashSet;
use std::io::{self, Write};
use std::pin::pin;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::debug;

use super::chunk::{AnswerChunk, Citation};

/// Final value of one streaming call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    /// All text fragments concatenated in arrival order.
    pub response: String,
    /// Distinct citations in first-seen order.
    pub citations: Vec<Citation>,
}

/// Aggregator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Chunks may still be consumed.
    Streaming,
    /// The stream ended or failed. Nothing more is consumed.
    Done,
}

/// Consumes one answer stream and accumulates its text and citations.
pub struct StreamingAnswerAggregator<W: Write> {
    sink: W,
    state: AggregatorState,
    response: String,
    citations: Vec<Citation>,
    seen: HashSet<String>,
}

impl<W: Write> StreamingAnswerAggregator<W> {
    /// Create an empty aggregator that echoes text to `sink`.
    ///
    /// Pass [`io::sink()`] to accumulate without echoing.
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: AggregatorState::Streaming,
            response: String::new(),
            citations: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Current lifecycle state.
    #[allow(dead_code)]
    #[must_use]
    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// Text accumulated so far.
    #[allow(dead_code)]
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Distinct citations accumulated so far.
    #[allow(dead_code)]
    #[must_use]
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Drive `chunks` to completion.
    ///
    /// Every chunk is processed in arrival order. The aggregator moves to
    /// [`AggregatorState::Done`] when the stream ends or yields an error; a
    /// second call after that returns immediately without polling.
    ///
    /// # Errors
    ///
    /// Returns the stream's own error unchanged, or a sink write failure
    /// converted into `E`.
    pub async fn consume<S, E>(&mut self, chunks: S) -> Result<(), E>
    where
        S: Stream<Item = Result<AnswerChunk, E>>,
        E: From<io::Error>,
    {
        if self.state == AggregatorState::Done {
            return Ok(());
        }

        let mut chunks = pin!(chunks);
        let outcome = loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    if let Err(err) = self.accept(chunk) {
                        break Err(E::from(err));
                    }
                }
                Some(Err(err)) => break Err(err),
                None => break Ok(()),
            }
        };

        self.state = AggregatorState::Done;
        debug!(
            chars = self.response.len(),
            citations = self.citations.len(),
            ok = outcome.is_ok(),
            "answer stream finished"
        );
        outcome
    }

    /// Consume the aggregator and return what it accumulated.
    #[must_use]
    pub fn finish(self) -> AggregationResult {
        AggregationResult {
            response: self.response,
            citations: self.citations,
        }
    }

    fn accept(&mut self, chunk: AnswerChunk) -> io::Result<()> {
        if let Some(text) = chunk.text {
            self.sink.write_all(text.as_bytes())?;
            self.sink.flush()?;
            self.response.push_str(&text);
        }

        for citation in chunk.citations.into_iter().flatten() {
            self.insert_citation(citation);
        }
        Ok(())
    }

    fn insert_citation(&mut self, citation: Citation) {
        if citation.url.is_empty() {
            debug!(title = ?citation.title, "dropping citation without url");
            return;
        }
        if self.seen.insert(citation.url.clone()) {
            self.citations.push(citation);
        }
    }
}
