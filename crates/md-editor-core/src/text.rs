//! Character offset helpers.
//!
//! Every public offset in this crate counts Unicode scalar values, while `str` slicing works on
//! bytes. These helpers convert between the two.

/// Number of characters in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `char_offset`, clamped to `text.len()`.
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Character offset of `byte_offset`, which must lie on a char boundary.
pub(crate) fn char_offset(text: &str, byte_offset: usize) -> usize {
    let clamped = byte_offset.min(text.len());
    text.get(..clamped).map(char_len).unwrap_or_else(|| {
        // Not a boundary: count the chars that start before it.
        text.char_indices().take_while(|(b, _)| *b < clamped).count()
    })
}

/// Slice `text` by a half-open character range (clamped).
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end.max(start));
    &text[start_byte..end_byte]
}
