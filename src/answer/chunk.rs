/// Streamed answer data model: chunks and the citations they carry.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// A source backing part of an answer.
///
/// Two citations are the same source iff their `url`s are equal. Everything
/// else (`title` and whatever extra fields the API attaches) is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Identity key. Empty when the API sent no URL.
    #[serde(default)]
    pub url: String,
    /// Page title, if the API knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Remaining fields (`id`, `publishedDate`, `author`, ...), passed through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Citation {
    /// A citation with only a URL and an optional title.
    #[cfg(test)]
    #[must_use]
    pub fn new(url: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            url: url.into(),
            title: title.map(str::to_owned),
            extra: serde_json::Map::new(),
        }
    }

    /// Title for display, `"Untitled"` when absent or empty.
    #[must_use]
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "Untitled",
        }
    }
}

/// Decode a `citations` array leniently.
///
/// `null` entries, entries that are not citation objects and entries without
/// a URL are dropped one by one; a missing, `null` or non-array field yields
/// an empty list. The surrounding payload never fails because of them.
///
/// # Errors
///
/// Only when the underlying deserializer itself fails.
pub fn lenient_citations<'de, D>(deserializer: D) -> Result<Vec<Citation>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(entries)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Citation>(entry) {
            Ok(citation) if !citation.url.is_empty() => Some(citation),
            Ok(citation) => {
                debug!(title = ?citation.title, "dropping citation without url");
                None
            }
            Err(err) => {
                debug!(error = %err, "dropping unreadable citation");
                None
            }
        })
        .collect())
}

/// One incremental unit of a streamed answer.
///
/// Either field may be absent; an absent field means "nothing to do".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerChunk {
    /// Text fragment to append to the answer.
    pub text: Option<String>,
    /// Citations observed in this chunk. May repeat earlier ones.
    pub citations: Option<Vec<Citation>>,
}

impl AnswerChunk {
    /// A chunk carrying only text.
    #[cfg(test)]
    #[must_use]
    pub fn text(fragment: impl Into<String>) -> Self {
        Self {
            text: Some(fragment.into()),
            citations: None,
        }
    }

    /// A chunk carrying only citations.
    #[cfg(test)]
    #[must_use]
    pub fn citations(citations: Vec<Citation>) -> Self {
        Self {
            text: None,
            citations: Some(citations),
        }
    }

    /// Whether the chunk carries neither text nor citations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.citations.is_none()
    }
}
