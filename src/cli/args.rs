/// CLI argument definitions via clap derive.
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::DEFAULT_BASE_URL;
use crate::api::options::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS};

/// exa: search the web and get cited answers with the Exa API.
#[derive(Debug, Parser)]
#[command(
    name = "exa",
    about = "Exa CLI - AI-powered search and content retrieval",
    version,
    arg_required_else_help = true,
    after_help = "Examples:\n  \
        exa search \"AI startups\" --num-results 5 --text\n  \
        exa contents https://example.com --text\n  \
        exa answer \"What is quantum computing?\" --stream\n  \
        exa similar https://example.com --exclude-source-domain\n  \
        exa research \"Latest AI developments\" --poll\n  \
        exa research-status abc-123"
)]
pub struct Cli {
    /// Exa API key.
    #[arg(long, global = true, env = "EXA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API base URL.
    #[arg(long, global = true, env = "EXA_BASE_URL", default_value = DEFAULT_BASE_URL, hide = true)]
    pub base_url: String,

    /// Output format. `auto` renders markdown on a TTY and JSON when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "markdown")]
    pub output: OutputFormat,

    /// Output raw JSON instead of markdown (shorthand for --output json).
    #[arg(long, global = true)]
    pub json: bool,

    /// Log requests and timings to stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable markdown.
    #[default]
    Markdown,
    /// Pretty-printed JSON.
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Markdown when stdout is a TTY, JSON when piped.
    Auto,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the web.
    Search(SearchArgs),
    /// Get the contents of URLs.
    Contents(ContentsArgs),
    /// Find pages similar to a URL.
    Similar(SimilarArgs),
    /// Get an AI-generated answer with citations.
    Answer(AnswerArgs),
    /// Create a research task.
    Research(ResearchArgs),
    /// Check the status of a research task.
    ResearchStatus(ResearchStatusArgs),
    /// List research tasks.
    ResearchList(ResearchListArgs),
}

/// Page-content flags shared by search, similar and contents.
#[derive(Debug, Clone, Default, Args)]
pub struct ContentFlags {
    /// Include page text.
    #[arg(long)]
    pub text: bool,

    /// Include highlights.
    #[arg(long)]
    pub highlights: bool,

    /// Include a summary.
    #[arg(long)]
    pub summary: bool,
}

/// Search type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchType {
    Auto,
    Fast,
    Deep,
    Instant,
}

impl SearchType {
    /// Value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Fast => "fast",
            Self::Deep => "deep",
            Self::Instant => "instant",
        }
    }
}

/// Arguments for `exa search`.
#[derive(Debug, Clone, Default, Parser)]
pub struct SearchArgs {
    /// Search query. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Number of results.
    #[arg(long, value_name = "N")]
    pub num_results: Option<u32>,

    /// Search type.
    #[arg(long = "type", value_name = "TYPE")]
    pub search_type: Option<SearchType>,

    #[command(flatten)]
    pub content: ContentFlags,

    /// Filter by category (e.g. "research paper", "news", "company").
    #[arg(long)]
    pub category: Option<String>,

    /// Comma-separated list of domains to search in.
    #[arg(long, value_name = "LIST")]
    pub include_domains: Option<String>,

    /// Comma-separated list of domains to exclude.
    #[arg(long, value_name = "LIST")]
    pub exclude_domains: Option<String>,

    /// Only results published after this date (ISO 8601).
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Only results published before this date (ISO 8601).
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<String>,

    /// Let the API rewrite the query.
    #[arg(long)]
    pub autoprompt: bool,
}

/// Arguments for `exa contents`.
#[derive(Debug, Clone, Default, Parser)]
pub struct ContentsArgs {
    /// One or more http(s) URLs.
    #[arg(required = true, num_args = 1..)]
    pub urls: Vec<String>,

    #[command(flatten)]
    pub content: ContentFlags,

    /// Accept cached contents no older than N hours.
    #[arg(long, value_name = "N")]
    pub max_age_hours: Option<u32>,
}

/// Arguments for `exa similar`.
#[derive(Debug, Clone, Default, Parser)]
pub struct SimilarArgs {
    /// Page to find similar pages for.
    pub url: String,

    /// Number of results.
    #[arg(long, value_name = "N")]
    pub num_results: Option<u32>,

    /// Leave out results from the source page's domain.
    #[arg(long)]
    pub exclude_source_domain: bool,

    /// Filter by category.
    #[arg(long)]
    pub category: Option<String>,

    #[command(flatten)]
    pub content: ContentFlags,
}

/// Answer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnswerModel {
    Exa,
    ExaPro,
}

impl AnswerModel {
    /// Value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exa => "exa",
            Self::ExaPro => "exa-pro",
        }
    }
}

/// Arguments for `exa answer`.
#[derive(Debug, Clone, Default, Parser)]
pub struct AnswerArgs {
    /// Question to answer. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Model to use.
    #[arg(long)]
    pub model: Option<AnswerModel>,

    /// Print the answer as it is generated.
    #[arg(long)]
    pub stream: bool,

    /// System prompt guiding the answer.
    #[arg(long, value_name = "TEXT")]
    pub system_prompt: Option<String>,

    /// Include full source text in citations.
    #[arg(long)]
    pub text: bool,
}

/// Research model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResearchModel {
    Fast,
    Regular,
    Pro,
}

impl ResearchModel {
    /// Model identifier sent to the API.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Fast => "exa-research-fast",
            Self::Regular => "exa-research",
            Self::Pro => "exa-research-pro",
        }
    }
}

/// Arguments for `exa research`.
#[derive(Debug, Clone, Parser)]
pub struct ResearchArgs {
    /// Research instructions. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub instructions: Vec<String>,

    /// Research model.
    #[arg(long)]
    pub model: Option<ResearchModel>,

    /// Wait for the task to finish and print its output.
    #[arg(long)]
    pub poll: bool,

    /// Milliseconds between status checks while polling.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_INTERVAL_MS, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: u64,

    /// Give up polling after this many milliseconds.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_TIMEOUT_MS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

/// Arguments for `exa research-status`.
#[derive(Debug, Clone, Parser)]
pub struct ResearchStatusArgs {
    /// Research task ID.
    pub id: String,
}

/// Arguments for `exa research-list`.
#[derive(Debug, Clone, Default, Parser)]
pub struct ResearchListArgs {
    /// Number of tasks to list.
    #[arg(long, value_name = "N")]
    pub limit: Option<u32>,

    /// Pagination cursor from a previous page.
    #[arg(long, value_name = "TOKEN")]
    pub cursor: Option<String>,
}
