/// Markdown renderers for API responses.
///
/// All renderers are pure: they take a response and return the text to print.
use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat};
use comfy_table::{Table, presets::ASCII_MARKDOWN};

use crate::answer::Citation;
use crate::types::{
    AnswerResponse, CostDollars, ResearchList, ResearchTask, SearchResponse,
};

/// Instructions longer than this are truncated in the task list.
const INSTRUCTIONS_PREVIEW_CHARS: usize = 60;

fn push_request_meta(out: &mut String, request_id: Option<&str>, cost: Option<&CostDollars>) {
    if let Some(id) = request_id.filter(|id| !id.is_empty()) {
        let _ = write!(out, "Request ID: {id}\n\n");
    }
    if let Some(cost) = cost {
        let _ = write!(out, "Cost: ${:.4}\n\n", cost.total.unwrap_or(0.0));
    }
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Render search, similar and contents results.
#[must_use]
pub fn format_search_results(response: &SearchResponse) -> String {
    let mut out = String::from("# Search Results\n\n");
    push_request_meta(
        &mut out,
        response.request_id.as_deref(),
        response.cost_dollars.as_ref(),
    );

    if response.results.is_empty() {
        out.push_str("No results found.\n");
        return out;
    }

    for (i, result) in response.results.iter().enumerate() {
        let title = non_empty(result.title.as_deref()).unwrap_or("Untitled");
        let _ = write!(out, "## {}. {title}\n\n", i + 1);
        let _ = writeln!(out, "- **URL:** {}", result.url);
        let _ = writeln!(out, "- **ID:** {}", result.id);
        if let Some(date) = non_empty(result.published_date.as_deref()) {
            let _ = writeln!(out, "- **Published:** {date}");
        }
        if let Some(author) = non_empty(result.author.as_deref()) {
            let _ = writeln!(out, "- **Author:** {author}");
        }
        if let Some(score) = result.score {
            let _ = writeln!(out, "- **Relevance Score:** {score:.3}");
        }
        out.push('\n');

        if let Some(text) = non_empty(result.text.as_deref()) {
            let _ = write!(out, "### Content\n\n{text}\n\n");
        }

        if let Some(highlights) = result.highlights.as_ref().filter(|h| !h.is_empty()) {
            out.push_str("### Highlights\n\n");
            for (j, highlight) in highlights.iter().enumerate() {
                let score = result.highlight_scores.as_ref().and_then(|s| s.get(j));
                match score {
                    Some(score) => {
                        let _ = writeln!(out, "- {highlight} (score: {score:.2})");
                    }
                    None => {
                        let _ = writeln!(out, "- {highlight}");
                    }
                }
            }
            out.push('\n');
        }

        if let Some(summary) = non_empty(result.summary.as_deref()) {
            let _ = write!(out, "### Summary\n\n{summary}\n\n");
        }

        out.push_str("---\n\n");
    }

    out
}

/// Render a numbered citation section, skipping citations without a URL.
/// Empty string when none are left.
#[must_use]
pub fn format_citations(citations: &[Citation]) -> String {
    let linked: Vec<&Citation> = citations.iter().filter(|c| !c.url.is_empty()).collect();
    if linked.is_empty() {
        return String::new();
    }
    let mut out = String::from("## Citations\n\n");
    for (i, citation) in linked.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}]({})",
            i + 1,
            citation.display_title(),
            citation.url
        );
    }
    out.push('\n');
    out
}

/// Render a non-streaming answer.
#[must_use]
pub fn format_answer_response(response: &AnswerResponse) -> String {
    let mut out = String::from("# Answer\n\n");
    push_request_meta(
        &mut out,
        response.request_id.as_deref(),
        response.cost_dollars.as_ref(),
    );

    out.push_str("## Response\n\n");
    match &response.answer {
        serde_json::Value::String(text) => {
            let _ = write!(out, "{text}\n\n");
        }
        other => {
            let _ = write!(out, "```json\n{}\n```\n\n", pretty_json(other));
        }
    }

    out.push_str(&format_citations(&response.citations));
    out
}

/// Format epoch milliseconds as an ISO-8601 UTC timestamp.
fn iso_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Render one research task with its output and events.
#[must_use]
pub fn format_research_task(task: &ResearchTask) -> String {
    let mut out = String::from("# Research Task\n\n");
    let _ = writeln!(out, "- **ID:** {}", task.research_id);
    let _ = writeln!(out, "- **Status:** {}", task.status);
    if let Some(instructions) = non_empty(task.instructions.as_deref()) {
        let _ = writeln!(out, "- **Instructions:** {instructions}");
    }
    out.push('\n');

    if let Some(output) = &task.output {
        out.push_str("## Output\n\n");
        if let Some(parsed) = &output.parsed {
            let _ = write!(out, "```json\n{}\n```\n\n", pretty_json(parsed));
        }
        if let Some(content) = non_empty(output.content.as_deref()) {
            let _ = write!(out, "{content}\n\n");
        }
    }

    if let Some(events) = task.events.as_ref().filter(|e| !e.is_empty()) {
        out.push_str("## Events\n\n");
        for event in events {
            let _ = write!(
                out,
                "- [{}] {}",
                iso_timestamp(event.created_at),
                event.event_type
            );
            if let Some(message) = non_empty(event.message.as_deref()) {
                let _ = write!(out, ": {message}");
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn preview(text: &str) -> String {
    if text.chars().count() <= INSTRUCTIONS_PREVIEW_CHARS {
        return text.to_owned();
    }
    let cut: String = text.chars().take(INSTRUCTIONS_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// Render one page of research tasks as a table.
#[must_use]
pub fn format_research_list(list: &ResearchList) -> String {
    let mut out = String::from("# Research Tasks\n\n");
    if list.data.is_empty() {
        out.push_str("No research tasks found.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_header(["ID", "STATUS", "INSTRUCTIONS"]);
    for task in &list.data {
        table.add_row([
            task.research_id.clone(),
            task.status.clone(),
            preview(task.instructions.as_deref().unwrap_or("")),
        ]);
    }
    let _ = writeln!(out, "{table}");

    if let Some(cursor) = list.next_cursor.as_deref().filter(|_| list.has_more) {
        let _ = write!(
            out,
            "\nMore results available. Use --cursor {cursor} to see more.\n"
        );
    }
    out
}

/// Prefix a confirmation message.
#[must_use]
pub fn format_success(message: &str) -> String {
    format!("[OK] {message}")
}
