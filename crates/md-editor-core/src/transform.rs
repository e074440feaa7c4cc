//! Text transform engine.
//!
//! Pure functions from `(buffer, selection)` to a [`TransformResult`]. There are three
//! primitive families:
//!
//! - [`insert_at_cursor`] - replace the selection with text and place a caret
//! - [`wrap_selection`] - surround the selection with a prefix/suffix pair
//! - [`modify_lines`] - rewrite every line the selection touches
//!
//! The toggles used by formatting actions ([`toggle_wrap`], [`toggle_line_prefix`],
//! [`set_heading_level`], [`number_lines`]) are built from the same splice, so all of them share
//! one selection-adjustment policy.
//!
//! # Example
//!
//! ```rust
//! use md_editor_core::{Selection, transform};
//!
//! let sel = Selection::new("Hello World", 6, 11).unwrap();
//! let result = transform::wrap_selection("Hello World", sel, "**", "**", true).unwrap();
//! assert_eq!(result.new_content(), "Hello **World**");
//! assert_eq!(result.new_selection(), Selection { start: 8, end: 13 });
//! ```

use crate::delta::TextEdit;
use crate::error::TransformError;
use crate::line_ending::{Line, lines};
use crate::selection::Selection;
use crate::text::{byte_offset, char_len};
use std::ops::Range;
use md_editor_core_syntax::MarkdownSyntax;

/// Output of every transform: the new buffer, the new selection and the replacement performed.
///
/// Only the transform engine constructs these, so a committed result always carries a
/// selection computed by the engine's policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    new_content: String,
    new_selection: Selection,
    edit: TextEdit,
}

impl TransformResult {
    /// The transformed buffer.
    pub fn new_content(&self) -> &str {
        &self.new_content
    }

    /// Start of the new selection.
    pub fn new_selection_start(&self) -> usize {
        self.new_selection.start
    }

    /// End of the new selection.
    pub fn new_selection_end(&self) -> usize {
        self.new_selection.end
    }

    /// The new selection.
    pub fn new_selection(&self) -> Selection {
        self.new_selection
    }

    /// The single replacement that turns the input buffer into [`Self::new_content`].
    pub fn edit(&self) -> &TextEdit {
        &self.edit
    }

    /// Consume the result, keeping only the buffer.
    pub fn into_content(self) -> String {
        self.new_content
    }

    pub(crate) fn into_parts(self) -> (String, Selection, TextEdit) {
        (self.new_content, self.new_selection, self.edit)
    }
}

/// Result of a line transform: the transform result plus the touched lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTransformResult {
    /// Buffer and selection after the rewrite.
    pub result: TransformResult,
    /// 1-indexed numbers (original numbering) of the rewritten lines.
    pub affected_lines: Vec<usize>,
}

impl From<LineTransformResult> for TransformResult {
    fn from(value: LineTransformResult) -> Self {
        value.result
    }
}

/// Replace the byte range `range` (char offset `start`) with `inserted`.
fn splice(
    buffer: &str,
    range: Range<usize>,
    start: usize,
    inserted: &str,
    new_selection: Selection,
) -> TransformResult {
    let mut new_content =
        String::with_capacity(buffer.len() - (range.end - range.start) + inserted.len());
    new_content.push_str(&buffer[..range.start]);
    new_content.push_str(inserted);
    new_content.push_str(&buffer[range.end..]);

    TransformResult {
        new_content,
        new_selection,
        edit: TextEdit {
            start,
            deleted_text: buffer[range].to_string(),
            inserted_text: inserted.to_string(),
        },
    }
}

/// Unwrap an optional argument coming from untyped input.
pub fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, TransformError> {
    value.ok_or(TransformError::InvalidArgument(name))
}

/// Replace the selection with `insert_text` and place a caret.
///
/// A non-negative `cursor_offset` counts from the start of the inserted text, a negative one
/// counts back from its end. The caret is clamped into the inserted span.
pub fn insert_at_cursor(
    buffer: &str,
    selection: Selection,
    insert_text: &str,
    cursor_offset: isize,
) -> Result<TransformResult, TransformError> {
    let range = selection.byte_range(buffer)?;
    let inserted_len = char_len(insert_text);

    let within = if cursor_offset >= 0 {
        cursor_offset.unsigned_abs().min(inserted_len)
    } else {
        inserted_len.saturating_sub(cursor_offset.unsigned_abs())
    };
    let caret = Selection::caret(selection.start + within);

    Ok(splice(buffer, range, selection.start, insert_text, caret))
}

/// Surround the selection with `prefix` and `suffix`.
///
/// Resulting selection:
/// 1. caret only: caret between prefix and suffix;
/// 2. selected and `select_wrapped`: the original text inside the wrapper;
/// 3. selected otherwise: caret after the whole wrapped span.
pub fn wrap_selection(
    buffer: &str,
    selection: Selection,
    prefix: &str,
    suffix: &str,
    select_wrapped: bool,
) -> Result<TransformResult, TransformError> {
    let range = selection.byte_range(buffer)?;
    let selected = &buffer[range.clone()];

    let mut wrapped = String::with_capacity(prefix.len() + selected.len() + suffix.len());
    wrapped.push_str(prefix);
    wrapped.push_str(selected);
    wrapped.push_str(suffix);

    let inner_start = selection.start + char_len(prefix);
    let new_selection = if selection.is_caret() {
        Selection::caret(inner_start)
    } else if select_wrapped {
        Selection {
            start: inner_start,
            end: inner_start + selection.len(),
        }
    } else {
        Selection::caret(selection.start + char_len(&wrapped))
    };

    Ok(splice(buffer, range, selection.start, &wrapped, new_selection))
}

/// Lines intersected by `[selection.start, selection.end]`.
///
/// A selection ending right after a separator does reach the next line; one ending on the
/// separator itself does not.
fn touched_lines(buffer: &str, selection: Selection) -> Result<Vec<Line<'_>>, TransformError> {
    selection.validate(buffer)?;
    Ok(lines(buffer)
        .skip_while(|line| !line.owns(selection.start))
        .take_while(|line| line.start <= selection.end)
        .collect())
}

/// 1-indexed numbers of the lines a line transform would rewrite.
pub fn affected_lines(buffer: &str, selection: Selection) -> Result<Vec<usize>, TransformError> {
    Ok(touched_lines(buffer, selection)?
        .iter()
        .map(|line| line.number)
        .collect())
}

/// Apply `line_transform` to every line touched by the selection.
///
/// Separators are preserved exactly. The new selection spans the rewritten lines.
pub fn modify_lines<F>(
    buffer: &str,
    selection: Selection,
    mut line_transform: F,
) -> Result<LineTransformResult, TransformError>
where
    F: FnMut(&str) -> String,
{
    modify_lines_indexed(buffer, selection, |_, line| line_transform(line))
}

/// Like [`modify_lines`], also passing the 0-based index of the line within the affected block.
pub fn modify_lines_indexed<F>(
    buffer: &str,
    selection: Selection,
    mut line_transform: F,
) -> Result<LineTransformResult, TransformError>
where
    F: FnMut(usize, &str) -> String,
{
    let touched = touched_lines(buffer, selection)?;
    let (Some(first), Some(last)) = (touched.first(), touched.last()) else {
        return Err(TransformError::InvalidRange {
            start: selection.start as i64,
            end: selection.end as i64,
            len: char_len(buffer),
        });
    };

    let mut replacement = String::new();
    for (idx, line) in touched.iter().enumerate() {
        replacement.push_str(&line_transform(idx, line.content));
        if idx + 1 < touched.len() {
            replacement.push_str(line.separator);
        }
    }

    let range = byte_offset(buffer, first.start)..byte_offset(buffer, last.end);
    let new_selection = Selection {
        start: first.start,
        end: first.start + char_len(&replacement),
    };

    Ok(LineTransformResult {
        result: splice(buffer, range, first.start, &replacement, new_selection),
        affected_lines: touched.iter().map(|line| line.number).collect(),
    })
}

/// The repeated character of a marker like `*`, `**` or `~~`.
fn marker_char(marker: &str) -> Option<char> {
    let mut chars = marker.chars();
    let first = chars.next()?;
    chars.all(|c| c == first).then_some(first)
}

/// A run of `run` marker characters carries a marker of `len` characters. A run of three
/// carries both one- and two-character markers (`***bold italic***`).
fn run_carries(run: usize, len: usize) -> bool {
    run == len || (run == 3 && len < 3)
}

/// `text` starts with `marker`, and the run of marker characters there is not a longer marker.
fn opens_with(text: &str, marker: &str) -> bool {
    text.starts_with(marker)
        && marker_char(marker).is_none_or(|c| {
            run_carries(text.chars().take_while(|&x| x == c).count(), char_len(marker))
        })
}

/// `text` ends with `marker`, and the run of marker characters there is not a longer marker.
fn closes_with(text: &str, marker: &str) -> bool {
    text.ends_with(marker)
        && marker_char(marker).is_none_or(|c| {
            run_carries(text.chars().rev().take_while(|&x| x == c).count(), char_len(marker))
        })
}

fn wraps_inside(selected: &str, prefix: &str, suffix: &str) -> bool {
    selected.len() >= prefix.len() + suffix.len()
        && opens_with(selected, prefix)
        && closes_with(selected, suffix)
}

/// Returns `true` if the selection is wrapped by `prefix`/`suffix`, either inside the selected
/// text or immediately around it.
///
/// Marker runs must match exactly, so `*` does not match one star of a surrounding `**`.
pub fn is_wrapped(buffer: &str, selection: Selection, prefix: &str, suffix: &str) -> bool {
    if prefix.is_empty() && suffix.is_empty() {
        return false;
    }
    let Ok(range) = selection.byte_range(buffer) else {
        return false;
    };
    wraps_inside(&buffer[range.clone()], prefix, suffix)
        || (closes_with(&buffer[..range.start], prefix) && opens_with(&buffer[range.end..], suffix))
}

/// Remove `prefix`/`suffix` if they already wrap the selection, otherwise wrap it.
///
/// After unwrapping, the formerly wrapped text is selected (a caret stays a caret).
pub fn toggle_wrap(
    buffer: &str,
    selection: Selection,
    prefix: &str,
    suffix: &str,
) -> Result<TransformResult, TransformError> {
    let range = selection.byte_range(buffer)?;
    let selected = &buffer[range.clone()];

    if !prefix.is_empty() || !suffix.is_empty() {
        if wraps_inside(selected, prefix, suffix) {
            let inner = &selected[prefix.len()..selected.len() - suffix.len()];
            let new_selection = Selection {
                start: selection.start,
                end: selection.start + char_len(inner),
            };
            return Ok(splice(buffer, range, selection.start, inner, new_selection));
        }

        if closes_with(&buffer[..range.start], prefix) && opens_with(&buffer[range.end..], suffix) {
            let outer = (range.start - prefix.len())..(range.end + suffix.len());
            let start = selection.start - char_len(prefix);
            let new_selection = Selection {
                start,
                end: start + selection.len(),
            };
            return Ok(splice(buffer, outer, start, selected, new_selection));
        }
    }

    wrap_selection(buffer, selection, prefix, suffix, true)
}

/// Remove `prefix` from every touched line if all of them carry it, otherwise add it to the
/// lines that lack it.
pub fn toggle_line_prefix(
    buffer: &str,
    selection: Selection,
    prefix: &str,
) -> Result<LineTransformResult, TransformError> {
    let all_prefixed = touched_lines(buffer, selection)?
        .iter()
        .all(|line| line.content.starts_with(prefix));

    modify_lines(buffer, selection, |line| {
        if all_prefixed {
            line.strip_prefix(prefix).unwrap_or(line).to_string()
        } else if line.starts_with(prefix) {
            line.to_string()
        } else {
            format!("{prefix}{line}")
        }
    })
}

/// ATX heading level of a line (`"## Title"` is 2), if any.
pub fn heading_level(line: &str) -> Option<u8> {
    split_heading(line).map(|(level, _)| level)
}

fn split_heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    Some((hashes as u8, rest.trim_start_matches(' ')))
}

/// Turn every touched line into a heading of `level` (clamped to `1..=6`).
///
/// Existing headings are re-levelled; if every touched line already has this level the headings
/// are removed instead.
pub fn set_heading_level(
    buffer: &str,
    selection: Selection,
    level: u8,
) -> Result<LineTransformResult, TransformError> {
    let level = level.clamp(1, 6);
    let all_at_level = touched_lines(buffer, selection)?
        .iter()
        .all(|line| heading_level(line.content) == Some(level));

    modify_lines(buffer, selection, |line| {
        let body = split_heading(line).map(|(_, body)| body).unwrap_or(line);
        if all_at_level {
            body.to_string()
        } else {
            format!("{}{body}", MarkdownSyntax::heading_prefix(level))
        }
    })
}

/// Byte length of an ordered-list marker (`"12. "`) at the start of `line`.
pub fn ordered_marker_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !line[digits..].starts_with(". ") {
        return None;
    }
    Some(digits + 2)
}

/// Number the touched lines `1. `, `2. `, ... or strip the numbering if every line has one.
pub fn number_lines(
    buffer: &str,
    selection: Selection,
) -> Result<LineTransformResult, TransformError> {
    let all_numbered = touched_lines(buffer, selection)?
        .iter()
        .all(|line| ordered_marker_len(line.content).is_some());

    modify_lines_indexed(buffer, selection, |idx, line| {
        let body = ordered_marker_len(line).map_or(line, |len| &line[len..]);
        if all_numbered {
            body.to_string()
        } else {
            format!("{}. {body}", idx + 1)
        }
    })
}
