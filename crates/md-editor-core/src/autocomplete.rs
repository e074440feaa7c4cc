//! Autocomplete helpers.
//!
//! A query starts at a trigger (by default the wiki-link opener `[[`) and runs up to the caret on
//! the same line. The host fetches suggestions for the query text (usually asynchronously, see
//! [`crate::EditorSession::begin_suggestions`]) and the accepted item replaces the query.

use crate::error::TransformError;
use crate::line_ending::line_at;
use crate::selection::Selection;
use crate::text::{byte_offset, char_len, char_offset};
use crate::transform::{self, TransformResult};
use serde::{Deserialize, Serialize};

/// What opens and closes an autocomplete query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteTrigger {
    /// Text that starts a query. Default: `[[`.
    pub open: String,
    /// Text appended after an accepted item. Default: `]]`.
    pub close: String,
    /// Longest query, in characters, that still counts as a query. Default: 64.
    pub max_query_len: usize,
}

impl Default for AutocompleteTrigger {
    fn default() -> Self {
        Self {
            open: "[[".to_string(),
            close: "]]".to_string(),
            max_query_len: 64,
        }
    }
}

/// One suggestion from a [`SuggestionSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteItem {
    /// Text shown in the suggestion list.
    pub label: String,
    /// Text inserted when accepted.
    pub value: String,
    /// Secondary text (page summary, path, ...).
    #[serde(default)]
    pub detail: Option<String>,
}

impl AutocompleteItem {
    /// An item whose label and value are the same.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            detail: None,
        }
    }
}

/// An active query in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    /// Char offset of the trigger's first character.
    pub start: usize,
    /// Text typed after the trigger, up to the caret.
    pub text: String,
}

/// Host-side suggestion provider.
///
/// Results are advisory: an `Err` is treated as an empty list.
pub trait SuggestionSource {
    /// Suggestions for `query`.
    fn suggestions(&self, query: &str) -> Result<Vec<AutocompleteItem>, String>;
}

/// The query under the caret, if any. Only the caret's line is inspected.
pub fn query_at(
    buffer: &str,
    selection: Selection,
    trigger: &AutocompleteTrigger,
) -> Option<SuggestionQuery> {
    if selection.has_selection() || trigger.open.is_empty() || selection.validate(buffer).is_err() {
        return None;
    }

    let line = line_at(buffer, selection.start);
    let before_caret = &line.content[..byte_offset(line.content, selection.start - line.start)];
    let open_at = before_caret.rfind(trigger.open.as_str())?;
    let typed = &before_caret[open_at + trigger.open.len()..];

    if (!trigger.close.is_empty() && typed.contains(trigger.close.as_str()))
        || char_len(typed) > trigger.max_query_len
    {
        return None;
    }

    Some(SuggestionQuery {
        start: line.start + char_offset(line.content, open_at),
        text: typed.to_string(),
    })
}

/// Replace `query` (trigger included) with `open + item.value + close`, caret after it.
///
/// A `close` already following the caret is consumed rather than duplicated.
pub fn apply_suggestion(
    buffer: &str,
    selection: Selection,
    query: &SuggestionQuery,
    item: &AutocompleteItem,
    trigger: &AutocompleteTrigger,
) -> Result<TransformResult, TransformError> {
    selection.validate(buffer)?;
    if query.start > selection.start {
        return Err(TransformError::InvalidRange {
            start: query.start as i64,
            end: selection.start as i64,
            len: char_len(buffer),
        });
    }

    let after_caret = &buffer[byte_offset(buffer, selection.end)..];
    let consumed_close = if !trigger.close.is_empty() && after_caret.starts_with(trigger.close.as_str()) {
        char_len(&trigger.close)
    } else {
        0
    };

    let replaced = Selection {
        start: query.start,
        end: selection.end + consumed_close,
    };
    let text = format!("{}{}{}", trigger.open, item.value, trigger.close);
    let len = char_len(&text) as isize;
    transform::insert_at_cursor(buffer, replaced, &text, len)
}
