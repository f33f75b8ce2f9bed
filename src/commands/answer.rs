/// `answer` command: a cited answer, either in one response or streamed.
use std::io::{self, Write};

use futures::TryStreamExt;

use super::CliError;
use crate::answer::StreamingAnswerAggregator;
use crate::api::{AnswerOptions, ExaApi};
use crate::cli::OutputCtx;
use crate::cli::args::AnswerArgs;
use crate::cli::markdown::format_citations;
use crate::cli::output::{write_answer_response, write_json};

const STREAM_HEADER: &str = "# Answer (streaming)\n\n## Response\n\n";

#[must_use]
pub fn build_options(args: &AnswerArgs) -> AnswerOptions {
    AnswerOptions {
        text: args.text.then_some(true),
        model: args.model.map(|m| m.as_str().to_owned()),
        system_prompt: args.system_prompt.clone(),
    }
}

/// Run `exa answer`.
///
/// With `--stream`, text is echoed as it arrives in display mode; structured
/// modes print one `{response, citations}` value once the stream ends.
///
/// # Errors
///
/// Returns `CliError` if the request, the stream or writing the output fails.
/// Text already echoed before a stream failure stays written.
pub async fn run(
    api: &dyn ExaApi,
    args: &AnswerArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let query = args.query.join(" ");
    let options = build_options(args);

    if !args.stream {
        let timer = ctx.timer("answer");
        let response = api.answer(&query, &options).await?;
        drop(timer);
        return write_answer_response(&response, ctx, out);
    }

    let _timer = ctx.timer("stream_answer");
    let chunks = api.stream_answer(&query, &options).await?.map_err(CliError::from);

    if ctx.is_structured() {
        let mut aggregator = StreamingAnswerAggregator::new(io::sink());
        aggregator.consume(chunks).await?;
        return write_json(&aggregator.finish(), ctx, out);
    }

    out.write_all(STREAM_HEADER.as_bytes())?;
    out.flush()?;
    let mut aggregator = StreamingAnswerAggregator::new(&mut *out);
    aggregator.consume(chunks).await?;
    let result = aggregator.finish();

    write!(out, "\n\n{}", format_citations(&result.citations))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::answer::{AnswerChunk, Citation};
    use crate::api::ApiError;
    use crate::cli::OutputFormat;
    use crate::cli::args::AnswerModel;
    use crate::commands::fake::{Call, FakeExa};

    fn args(stream: bool) -> AnswerArgs {
        AnswerArgs {
            query: vec!["what".to_owned(), "is".to_owned(), "rust".to_owned()],
            stream,
            ..AnswerArgs::default()
        }
    }

    fn chunks() -> Vec<Result<AnswerChunk, ApiError>> {
        vec![
            Ok(AnswerChunk::text("Hello")),
            Ok(AnswerChunk::citations(vec![Citation::new(
                "https://a.com",
                Some("A"),
            )])),
            Ok(AnswerChunk::text(" world")),
            Ok(AnswerChunk::citations(vec![
                Citation::new("https://a.com", Some("A again")),
                Citation::new("https://b.com", None),
            ])),
        ]
    }

    #[test]
    fn test_build_options() {
        let args = AnswerArgs {
            model: Some(AnswerModel::ExaPro),
            system_prompt: Some("be brief".to_owned()),
            text: true,
            ..args(false)
        };
        assert_eq!(
            build_options(&args),
            AnswerOptions {
                text: Some(true),
                model: Some("exa-pro".to_owned()),
                system_prompt: Some("be brief".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn test_stream_display_echoes_then_lists_citations() {
        let api = FakeExa::with_chunks(chunks());
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        run(&api, &args(true), &ctx, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# Answer (streaming)\n\n## Response\n\nHello world\n\n\
             ## Citations\n\n1. [A](https://a.com)\n2. [Untitled](https://b.com)\n\n"
        );
        assert_eq!(
            api.calls(),
            vec![Call::StreamAnswer(
                "what is rust".to_owned(),
                AnswerOptions::default()
            )]
        );
    }

    #[tokio::test]
    async fn test_stream_display_without_citations() {
        let api = FakeExa::with_chunks(vec![Ok(AnswerChunk::text("Hi"))]);
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        run(&api, &args(true), &ctx, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# Answer (streaming)\n\n## Response\n\nHi\n\n"
        );
    }

    #[tokio::test]
    async fn test_stream_json_prints_single_value() {
        let api = FakeExa::with_chunks(chunks());
        let ctx = OutputCtx::new(OutputFormat::Json, false, false);
        let mut out = Vec::new();
        run(&api, &args(true), &ctx, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            value,
            json!({
                "response": "Hello world",
                "citations": [
                    {"url": "https://a.com", "title": "A"},
                    {"url": "https://b.com"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_stream_failure_keeps_echoed_text() {
        let api = FakeExa::with_chunks(vec![
            Ok(AnswerChunk::text("partial")),
            Err(ApiError::Decode("connection reset".to_owned())),
        ]);
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        let err = run(&api, &args(true), &ctx, &mut out).await.unwrap_err();

        assert!(matches!(err, CliError::Api(ApiError::Decode(_))));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# Answer (streaming)\n\n## Response\n\npartial"
        );
    }

    #[tokio::test]
    async fn test_non_stream_uses_answer_endpoint() {
        let api = FakeExa {
            answer_response: serde_json::from_value(json!({
                "answer": "42",
                "citations": []
            }))
            .unwrap(),
            ..FakeExa::default()
        };
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        run(&api, &args(false), &ctx, &mut out).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::Answer(
                "what is rust".to_owned(),
                AnswerOptions::default()
            )]
        );
        assert!(String::from_utf8(out).unwrap().contains("## Response\n\n42\n"));
    }
}
