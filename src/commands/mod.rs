/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod answer;
pub mod contents;
pub mod errors;
pub mod research;
pub mod search;
pub mod similar;

#[cfg(test)]
mod fake;

use std::io::Write;

pub use errors::CliError;

use crate::api::ExaApi;
use crate::cli::OutputCtx;
use crate::cli::args::Command;

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `CliError` on any command failure.
pub async fn dispatch(
    command: &Command,
    api: &dyn ExaApi,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Search(args) => search::run(api, args, ctx, out).await,
        Command::Contents(args) => contents::run(api, args, ctx, out).await,
        Command::Similar(args) => similar::run(api, args, ctx, out).await,
        Command::Answer(args) => answer::run(api, args, ctx, out).await,
        Command::Research(args) => research::create(api, args, ctx, out).await,
        Command::ResearchStatus(args) => research::status(api, args, ctx, out).await,
        Command::ResearchList(args) => research::list(api, args, ctx, out).await,
    }
}

/// Split a comma-separated argument, trimming entries and dropping empty ones.
///
/// Returns `None` when nothing is left, so the option is omitted entirely.
#[must_use]
pub fn parse_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    (!items.is_empty()).then_some(items)
}
