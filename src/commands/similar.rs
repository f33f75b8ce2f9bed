/// `similar` command: pages similar to a given URL.
use std::io::Write;

use super::CliError;
use crate::api::{ContentsSelection, ExaApi, SimilarOptions};
use crate::cli::OutputCtx;
use crate::cli::args::SimilarArgs;
use crate::cli::output::write_search_results;

#[must_use]
pub fn build_options(args: &SimilarArgs) -> SimilarOptions {
    SimilarOptions {
        num_results: args.num_results,
        exclude_source_domain: args.exclude_source_domain.then_some(true),
        category: args.category.clone(),
        contents: ContentsSelection::from_flags(
            args.content.text,
            args.content.highlights,
            args.content.summary,
        ),
    }
}

/// Run `exa similar`.
///
/// # Errors
///
/// Returns `CliError` if the request or writing the output fails.
pub async fn run(
    api: &dyn ExaApi,
    args: &SimilarArgs,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let options = build_options(args);

    let timer = ctx.timer("find_similar");
    let response = api.find_similar(&args.url, &options).await?;
    drop(timer);

    write_search_results(&response, ctx, out)
}
