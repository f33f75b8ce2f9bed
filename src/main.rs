#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! exa: search the web, read pages and get cited answers from the Exa API.

mod answer;
mod api;
mod cli;
mod commands;
mod types;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api::HttpExaClient;
use cli::{Cli, OutputCtx, write_error};
use commands::CliError;
use types::ErrorOutput;

/// Send diagnostics to stderr. `EXA_LOG` takes a full filter; `--debug`
/// raises this crate to `debug` on top of it.
fn init_logging(debug: bool) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("EXA_LOG")
        .from_env_lossy();
    if debug {
        if let Ok(directive) = concat!(env!("CARGO_CRATE_NAME"), "=debug").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

async fn run(cli: &Cli, ctx: &OutputCtx) -> Result<(), CliError> {
    let api_key = cli
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(CliError::MissingApiKey)?;
    let client = HttpExaClient::new(api_key, &cli.base_url)?;

    let mut stdout = std::io::stdout();
    commands::dispatch(&cli.command, &client, ctx, &mut stdout).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let ctx = OutputCtx::new(cli.output, cli.json, cli.debug);

    match run(&cli, &ctx).await {
        Ok(()) => {}
        Err(err) => {
            let error_output = ErrorOutput::from_cli_error(&err);
            write_error(&error_output, ctx.format);
            std::process::exit(err.exit_code());
        }
    }
}
