/// Server-sent event decoding for streamed answers.
///
/// The answer endpoint streams events made of `data: <json>` lines and ended
/// by a blank line. Consecutive `data:` lines of one event are joined with
/// `\n` before decoding. Each payload may carry a text fragment at
/// `choices[0].delta.content` and a `citations` array. Comment lines, other
/// fields and the `[DONE]` sentinel are skipped.
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;
use tracing::warn;

use super::errors::ApiError;
use crate::answer::chunk::lenient_citations;
use crate::answer::{AnswerChunk, Citation};

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default, deserialize_with = "lenient_citations")]
    citations: Vec<Citation>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Line-buffered SSE decoder. Bytes may arrive split anywhere, including
/// inside a multi-byte UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// `data:` payloads of the event being read.
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every chunk completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<AnswerChunk> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            out.extend(self.push_line(&line));
        }
        out
    }

    /// Flush a trailing line and an event that was never terminated.
    pub fn finish(&mut self) -> Vec<AnswerChunk> {
        let rest = std::mem::take(&mut self.buf);
        let mut out = Vec::new();
        if !rest.is_empty() {
            out.extend(self.push_line(&rest));
        }
        out.extend(self.dispatch());
        out
    }

    fn push_line(&mut self, raw: &[u8]) -> Option<AnswerChunk> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.strip_prefix(' ').unwrap_or(payload);
            self.data.push(payload.to_owned());
        }
        None
    }

    fn dispatch(&mut self) -> Option<AnswerChunk> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        decode_event(&payload)
    }
}

fn decode_event(payload: &str) -> Option<AnswerChunk> {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let event: StreamEvent = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "skipping malformed answer event");
            return None;
        }
    };

    let text = event
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content);
    let citations = (!event.citations.is_empty()).then_some(event.citations);
    let chunk = AnswerChunk { text, citations };
    (!chunk.is_empty()).then_some(chunk)
}

/// Turn a response byte stream into an ordered stream of answer chunks.
///
/// A transport error is yielded once and ends the stream.
pub fn answer_chunks<S, B>(bytes: S) -> impl Stream<Item = Result<AnswerChunk, ApiError>>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send,
{
    let initial = Some((Box::pin(bytes), SseDecoder::default()));
    stream::unfold(initial, |state| async move {
        let (mut bytes, mut decoder) = match state {
            Some(state) => state,
            None => return None,
        };
        loop {
            match bytes.next().await {
                Some(Ok(b)) => {
                    let chunks = decoder.feed(b.as_ref());
                    if !chunks.is_empty() {
                        let items: Vec<_> = chunks.into_iter().map(Ok).collect();
                        return Some((stream::iter(items), Some((bytes, decoder))));
                    }
                }
                Some(Err(err)) => {
                    return Some((stream::iter(vec![Err(ApiError::from(err))]), None));
                }
                None => {
                    let items: Vec<_> = decoder.finish().into_iter().map(Ok).collect();
                    return Some((stream::iter(items), None));
                }
            }
        }
    })
    .flatten()
}
