/// `search` command: web search, optionally with page contents.
use std::io::Write;

use super::{CliError, parse_list};
use crate::api::{ContentsSelection, ExaApi, SearchOptions};
use crate::cli::OutputCtx;
use crate::cli::args::SearchArgs;
use crate::cli::output::write_search_results;

/// Map CLI flags onto request options. Unset flags stay unset.
#[must_use]
pub fn build_options(args: &SearchArgs) -> SearchOptions {
    SearchOptions {
        num_results: args.num_results,
        include_domains: parse_list(args.include_domains.as_deref()),
        exclude_domains: parse_list(args.exclude_domains.as_deref()),
        category: args.category.clone(),
        start_published_date: args.start_date.clone(),
        end_published_date: args.end_date.clone(),
        use_autoprompt: args.autoprompt.then_some(true),
        search_type: args.search_type.map(|t| t.as_str().to_owned()),
        contents: ContentsSelection::from_flags(
            args.content.text,
            args.content.highlights,
            args.content.summary,
        ),
    }
}

/// Run `exa search`.
///
/// # Errors
///
/// Returns `CliError` if the request or writing the output fails.
pub async fn run(
    api: &dyn ExaApi,
    args: &SearchArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let query = args.query.join(" ");
    let options = build_options(args);

    let timer = ctx.timer("search");
    let response = api.search(&query, &options).await?;
    drop(timer);

    write_search_results(&response, ctx, out)
}
