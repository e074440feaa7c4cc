//! Structured text change deltas.
//!
//! Every transform replaces exactly one contiguous span of the buffer. Hosts that mirror the
//! buffer elsewhere (a DOM field, a persistence layer, an index) can consume the [`TextEdit`]
//! instead of diffing old and new text.
//!
//! All offsets are **character offsets** (Unicode scalar values).

use crate::selection::Selection;

/// A single replacement expressed in character offsets.
///
/// Semantics:
/// - `start` is a character offset in the buffer **before** the edit is applied.
/// - The deleted range is defined by the length (in `char`s) of `deleted_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Start character offset of the edit.
    pub start: usize,
    /// Exact deleted text (may be empty).
    pub deleted_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
}

impl TextEdit {
    /// Length of `deleted_text` in characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Exclusive end character offset in the pre-edit buffer.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len())
    }

    /// Exclusive end character offset of the inserted text in the post-edit buffer.
    pub fn inserted_end(&self) -> usize {
        self.start.saturating_add(self.inserted_len())
    }

    /// Returns `true` if the edit leaves the text unchanged.
    pub fn is_noop(&self) -> bool {
        self.deleted_text == self.inserted_text
    }
}

/// A committed change, delivered to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDelta {
    /// Session version after the change.
    pub version: u64,
    /// Character count before applying `edit`.
    pub before_char_count: usize,
    /// Character count after applying `edit`.
    pub after_char_count: usize,
    /// The replacement that was applied.
    pub edit: TextEdit,
    /// Selection after the change.
    pub selection: Selection,
}
