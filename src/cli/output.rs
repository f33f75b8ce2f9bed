/// Output handling: format resolution, JSON/markdown writers, error output.
use std::io::{IsTerminal, Write};

use serde::Serialize;
use tracing::debug;

use super::args::OutputFormat;
use super::markdown::{
    format_answer_response, format_research_list, format_research_task, format_search_results,
};
use crate::commands::CliError;
use crate::types::{AnswerResponse, ErrorOutput, ResearchList, ResearchTask, SearchResponse};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Markdown
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all commands.
#[derive(Debug, Clone, Copy)]
pub struct OutputCtx {
    pub format: OutputFormat,
    /// When true, report request timings.
    pub debug: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, debug: bool) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            debug,
        }
    }

    /// Whether output must be a single machine-readable JSON value.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::Compact)
    }

    /// Start a named debug timer. Logs elapsed time on drop only when `--debug` is set.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label, self.debug)
    }
}

/// Write any serializable value as JSON in the context's style.
///
/// # Errors
///
/// Returns `CliError` if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let text = if ctx.format == OutputFormat::Compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    writeln!(out, "{text}")?;
    Ok(())
}

fn write_either<T: Serialize>(
    value: &T,
    render: fn(&T) -> String,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    if ctx.is_structured() {
        return write_json(value, ctx, out);
    }
    writeln!(out, "{}", render(value))?;
    Ok(())
}

/// Write search/similar/contents results.
///
/// # Errors
///
/// Returns `CliError` if writing to `out` fails.
pub fn write_search_results(
    response: &SearchResponse,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    write_either(response, format_search_results, ctx, out)
}

/// Write a non-streaming answer.
///
/// # Errors
///
/// Returns `CliError` if writing to `out` fails.
pub fn write_answer_response(
    response: &AnswerResponse,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    write_either(response, format_answer_response, ctx, out)
}

/// Write one research task.
///
/// # Errors
///
/// Returns `CliError` if writing to `out` fails.
pub fn write_research_task(
    task: &ResearchTask,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    write_either(task, format_research_task, ctx, out)
}

/// Write a page of research tasks.
///
/// # Errors
///
/// Returns `CliError` if writing to `out` fails.
pub fn write_research_list(
    list: &ResearchList,
    ctx: &OutputCtx,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    write_either(list, format_research_list, ctx, out)
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match format {
        OutputFormat::Json | OutputFormat::Compact => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        OutputFormat::Markdown | OutputFormat::Auto => {
            let _ = writeln!(out, "Error: {}", err.error.message);
        }
    }
}

// --- Debug timer ---

/// A RAII timer that logs elapsed milliseconds on drop.
///
/// Created via [`OutputCtx::timer`]. Does nothing when `debug` is false.
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
    active: bool,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str, active: bool) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
            active,
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        if self.active {
            let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
            debug!(label = self.label, elapsed_ms, "timing");
        }
    }
}
