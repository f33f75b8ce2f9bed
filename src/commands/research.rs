/// Research commands: create (optionally waiting), status, list.
use std::io::Write;
use std::time::Duration;

use tracing::info;

use super::CliError;
use crate::api::{ExaApi, ListOptions, PollOptions, ResearchCreateRequest};
use crate::cli::OutputCtx;
use crate::cli::args::{ResearchArgs, ResearchListArgs, ResearchStatusArgs};
use crate::cli::markdown::format_success;
use crate::cli::output::{write_json, write_research_list, write_research_task};

#[must_use]
pub fn build_request(args: &ResearchArgs) -> ResearchCreateRequest {
    ResearchCreateRequest {
        instructions: args.instructions.join(" "),
        model: args.model.map(|m| m.api_name().to_owned()),
    }
}

#[must_use]
pub fn poll_options(args: &ResearchArgs) -> PollOptions {
    PollOptions {
        poll_interval: Duration::from_millis(args.poll_interval),
        timeout: Duration::from_millis(args.timeout),
    }
}

/// Run `exa research`.
///
/// In structured modes only one JSON value is printed: the finished task
/// with `--poll`, the created task otherwise.
///
/// # Errors
///
/// Returns `CliError` if creating or polling the task fails, including when
/// polling exceeds `--timeout`.
pub async fn create(
    api: &dyn ExaApi,
    args: &ResearchArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let request = build_request(args);

    let timer = ctx.timer("research_create");
    let task = api.research_create(&request).await?;
    drop(timer);
    info!(research_id = %task.research_id, status = %task.status, "research task created");

    if ctx.is_structured() {
        if !args.poll {
            return write_json(&task, ctx, out);
        }
        let finished = api
            .research_poll_until_finished(&task.research_id, &poll_options(args))
            .await?;
        return write_json(&finished, ctx, out);
    }

    writeln!(out, "{}", format_success("Research task created"))?;
    writeln!(out, "Task ID: {}", task.research_id)?;
    writeln!(out, "Status: {}", task.status)?;
    if !args.poll {
        return Ok(());
    }

    writeln!(out, "\nPolling for results...\n")?;
    out.flush()?;
    let timer = ctx.timer("research_poll");
    let finished = api
        .research_poll_until_finished(&task.research_id, &poll_options(args))
        .await?;
    drop(timer);
    write_research_task(&finished, ctx, out)
}

/// Run `exa research-status`.
///
/// # Errors
///
/// Returns `CliError` if the request or writing the output fails.
pub async fn status(
    api: &dyn ExaApi,
    args: &ResearchStatusArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let timer = ctx.timer("research_get");
    let task = api.research_get(&args.id).await?;
    drop(timer);
    write_research_task(&task, ctx, out)
}

/// Run `exa research-list`.
///
/// # Errors
///
/// Returns `CliError` if the request or writing the output fails.
pub async fn list(
    api: &dyn ExaApi,
    args: &ResearchListArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let options = ListOptions {
        limit: args.limit,
        cursor: args.cursor.clone(),
    };

    let timer = ctx.timer("research_list");
    let page = api.research_list(&options).await?;
    drop(timer);
    write_research_list(&page, ctx, out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::api::ApiError;
    use crate::cli::OutputFormat;
    use crate::cli::args::ResearchModel;
    use crate::commands::fake::{Call, FakeExa};
    use crate::types::{ResearchList, ResearchTask};

    fn task(status: &str) -> ResearchTask {
        ResearchTask {
            research_id: "r_1".to_owned(),
            status: status.to_owned(),
            ..ResearchTask::default()
        }
    }

    fn args(poll: bool) -> ResearchArgs {
        ResearchArgs {
            instructions: vec!["compare".to_owned(), "databases".to_owned()],
            model: None,
            poll,
            poll_interval: 250,
            timeout: 5_000,
        }
    }

    fn api() -> FakeExa {
        FakeExa {
            task: task("pending"),
            finished_task: task("completed"),
            ..FakeExa::default()
        }
    }

    #[test]
    fn test_build_request() {
        let args = ResearchArgs {
            model: Some(ResearchModel::Pro),
            ..args(false)
        };
        assert_eq!(
            build_request(&args),
            ResearchCreateRequest {
                instructions: "compare databases".to_owned(),
                model: Some("exa-research-pro".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn test_create_without_poll() {
        let api = api();
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        create(&api, &args(false), &ctx, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[OK] Research task created\nTask ID: r_1\nStatus: pending\n"
        );
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_poll_prints_final_task() {
        let api = api();
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        create(&api, &args(true), &ctx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Status: pending\n\nPolling for results...\n\n# Research Task"));
        assert!(text.contains("- **Status:** completed"));
        assert_eq!(
            api.calls()[1],
            Call::ResearchPoll(
                "r_1".to_owned(),
                PollOptions {
                    poll_interval: Duration::from_millis(250),
                    timeout: Duration::from_millis(5_000),
                }
            )
        );
    }

    #[tokio::test]
    async fn test_create_json_with_poll_prints_only_final_task() {
        let api = api();
        let ctx = OutputCtx::new(OutputFormat::Json, false, false);
        let mut out = Vec::new();
        create(&api, &args(true), &ctx, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "completed");
    }

    #[tokio::test]
    async fn test_create_json_without_poll() {
        let api = api();
        let ctx = OutputCtx::new(OutputFormat::Json, false, false);
        let mut out = Vec::new();
        create(&api, &args(false), &ctx, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["researchId"], "r_1");
        assert_eq!(value["status"], "pending");
    }

    #[tokio::test]
    async fn test_status_fetches_by_id() {
        let api = api();
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        let args = ResearchStatusArgs {
            id: "r_1".to_owned(),
        };
        status(&api, &args, &ctx, &mut out).await.unwrap();

        assert_eq!(api.calls(), vec![Call::ResearchGet("r_1".to_owned())]);
        assert!(String::from_utf8(out).unwrap().starts_with("# Research Task\n\n- **ID:** r_1"));
    }

    #[tokio::test]
    async fn test_list_forwards_paging() {
        let api = FakeExa {
            list: ResearchList {
                data: vec![task("running")],
                ..ResearchList::default()
            },
            ..FakeExa::default()
        };
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        let args = ResearchListArgs {
            limit: Some(2),
            cursor: Some("c1".to_owned()),
        };
        list(&api, &args, &ctx, &mut out).await.unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::ResearchList(ListOptions {
                limit: Some(2),
                cursor: Some("c1".to_owned()),
            })]
        );
        assert!(String::from_utf8(out).unwrap().contains("r_1"));
    }

    #[tokio::test]
    async fn test_create_failure_writes_nothing() {
        let api = FakeExa {
            failure: std::sync::Mutex::new(Some(ApiError::Unauthorized {
                message: "bad key".to_owned(),
            })),
            ..api()
        };
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        let err = create(&api, &args(true), &ctx, &mut out).await.unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert!(out.is_empty());
    }
}
