//! Selection model.
//!
//! A [`Selection`] is a half-open range of character offsets into a buffer. It is a plain value:
//! every transform returns a new one instead of mutating the old.

use crate::error::TransformError;
use crate::text::{byte_offset, char_len, char_slice};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A caret (`start == end`) or a selected range.
///
/// Invariant once validated against a buffer: `start <= end <= char_len(buffer)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl Selection {
    /// Create a selection, validating it against `buffer`.
    pub fn new(buffer: &str, start: usize, end: usize) -> Result<Self, TransformError> {
        let selection = Self { start, end };
        selection.validate(buffer)?;
        Ok(selection)
    }

    /// A caret at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns `true` if this is a caret.
    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if a non-empty range is selected.
    pub fn has_selection(&self) -> bool {
        self.start != self.end
    }

    /// Number of selected characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` for a caret.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `offset` lies within `[start, end]`.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// The selected text. Out-of-range offsets are clamped.
    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        char_slice(buffer, self.start, self.end)
    }

    /// Check the selection invariant against `buffer`.
    pub fn validate(&self, buffer: &str) -> Result<(), TransformError> {
        self.validate_len(char_len(buffer))
    }

    pub(crate) fn validate_len(&self, len: usize) -> Result<(), TransformError> {
        if self.start > self.end || self.end > len {
            return Err(TransformError::InvalidRange {
                start: self.start as i64,
                end: self.end as i64,
                len,
            });
        }
        Ok(())
    }

    /// Validate and convert to a byte range of `buffer`.
    pub(crate) fn byte_range(&self, buffer: &str) -> Result<Range<usize>, TransformError> {
        self.validate(buffer)?;
        Ok(byte_offset(buffer, self.start)..byte_offset(buffer, self.end))
    }
}

/// Project raw offsets (e.g. from a host surface) onto `buffer`.
///
/// Fails with [`TransformError::InvalidRange`] if either offset is negative or past the end of
/// the buffer, or if `raw_end < raw_start`.
pub fn get_selection(buffer: &str, raw_start: i64, raw_end: i64) -> Result<Selection, TransformError> {
    let len = char_len(buffer);
    let invalid = TransformError::InvalidRange {
        start: raw_start,
        end: raw_end,
        len,
    };
    let (Ok(start), Ok(end)) = (usize::try_from(raw_start), usize::try_from(raw_end)) else {
        return Err(invalid);
    };
    if start > end || end > len {
        return Err(invalid);
    }
    Ok(Selection { start, end })
}

/// A live editable surface holding a buffer and a selection.
pub trait EditSurface {
    /// Current buffer.
    fn text(&self) -> &str;

    /// Current selection.
    fn selection(&self) -> Selection;

    /// Store an already validated selection as one value.
    fn store_selection(&mut self, selection: Selection);
}

/// Set the selection of a live surface. `end` defaults to `start` (a caret).
///
/// The new selection is fully validated against the surface's current buffer before it is
/// stored, so a failed call leaves the old selection untouched.
pub fn set_selection<S: EditSurface + ?Sized>(
    surface: &mut S,
    start: usize,
    end: Option<usize>,
) -> Result<Selection, TransformError> {
    let selection = Selection {
        start,
        end: end.unwrap_or(start),
    };
    selection.validate(surface.text())?;
    surface.store_selection(selection);
    Ok(selection)
}
