/// `contents` command: fetch page contents for a list of URLs.
use std::io::Write;

use reqwest::Url;

use super::CliError;
use crate::api::{ContentsOptions, ExaApi};
use crate::cli::OutputCtx;
use crate::cli::args::ContentsArgs;
use crate::cli::output::write_search_results;

/// True for absolute `http`/`https` URLs.
#[must_use]
pub fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// Map CLI flags onto request options.
#[must_use]
pub fn build_options(args: &ContentsArgs) -> ContentsOptions {
    ContentsOptions {
        text: args.content.text.then_some(true),
        highlights: args.content.highlights.then_some(true),
        summary: args.content.summary.then_some(true),
        max_age_hours: args.max_age_hours,
    }
}

/// Run `exa contents`.
///
/// # Errors
///
/// Returns `CliError::InvalidUrl` for the first non-http(s) argument, before
/// any request is made. Otherwise propagates request and output failures.
pub async fn run(
    api: &dyn ExaApi,
    args: &ContentsArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    if let Some(url) = args.urls.iter().find(|url| !is_http_url(url)) {
        return Err(CliError::InvalidUrl { url: url.clone() });
    }
    let options = build_options(args);

    let timer = ctx.timer("contents");
    let response = api.get_contents(&args.urls, &options).await?;
    drop(timer);

    write_search_results(&response, ctx, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::cli::args::ContentFlags;
    use crate::commands::fake::{Call, FakeExa};

    fn args(urls: &[&str]) -> ContentsArgs {
        ContentsArgs {
            urls: urls.iter().map(|s| (*s).to_owned()).collect(),
            ..ContentsArgs::default()
        }
    }

    #[test]
    fn test_url_validation() {
        assert!(is_http_url("https://example.com/a?b=c"));
        assert!(is_http_url("http://localhost:3000"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn test_build_options() {
        let args = ContentsArgs {
            content: ContentFlags {
                text: true,
                highlights: true,
                summary: false,
            },
            max_age_hours: Some(24),
            ..args(&["https://a.com"])
        };
        assert_eq!(
            build_options(&args),
            ContentsOptions {
                text: Some(true),
                highlights: Some(true),
                summary: None,
                max_age_hours: Some(24),
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_request() {
        let api = FakeExa::default();
        let ctx = OutputCtx::new(OutputFormat::Markdown, false, false);
        let mut out = Vec::new();
        let err = run(
            &api,
            &args(&["https://ok.com", "ftp://files.example.com"]),
            &ctx,
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(
            matches!(&err, CliError::InvalidUrl { url } if url == "ftp://files.example.com")
        );
        assert_eq!(err.exit_code(), 2);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_sends_all_urls() {
        let api = FakeExa::default();
        let ctx = OutputCtx::new(OutputFormat::Json, false, false);
        let mut out = Vec::new();
        run(&api, &args(&["https://a.com", "http://b.org"]), &ctx, &mut out)
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec![Call::GetContents(
                vec!["https://a.com".to_owned(), "http://b.org".to_owned()],
                ContentsOptions::default()
            )]
        );
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(value["results"].is_array());
    }
}
