//! Wiki-link notation codec.
//!
//! Parses `[[target|display#section]]` spans out of raw text and renders [`WikiLink`] values back
//! into notation.
//!
//! Grammar of one span: `[[` TARGET (`|` DISPLAY)? (`#` SECTION)? `]]`, where an opening `[[` is
//! closed by the first `]]` after it. The text is split at the first `|`. Without a `|`, the
//! section is everything after the first `#` of the target segment. With a `|`, the target is
//! kept verbatim and the section is taken from the display segment, so
//! `[[Target#x|Display#section]]` has target `Target#x`, display `Display` and section `section`.
//!
//! All offsets are character offsets.
//!
//! ```rust
//! use md_editor_core::wiki_link;
//!
//! let m = wiki_link::parse("Check [[Aragorn|Hero#appearance]] today").next().unwrap();
//! assert_eq!(m.link.target, "Aragorn");
//! assert_eq!(m.link.display, "Hero");
//! assert_eq!(m.link.section.as_deref(), Some("appearance"));
//! assert_eq!((m.start, m.end), (6, 33));
//! ```

use crate::error::TransformError;
use crate::selection::Selection;
use crate::text::char_len;
use crate::transform::{self, TransformResult};
use std::fmt;

/// Opening delimiter.
pub const OPEN: &str = "[[";
/// Closing delimiter.
pub const CLOSE: &str = "]]";
/// Separates the target from the display text.
pub const ALIAS: char = '|';
/// Introduces the section.
pub const SECTION: char = '#';

/// One parsed (or constructed) wiki link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Referenced page or entity.
    pub target: String,
    /// Text to show; equals `target` unless given explicitly.
    pub display: String,
    /// Section anchor, present iff a `#` was written.
    pub section: Option<String>,
    /// The exact notation, brackets included.
    pub raw: String,
}

impl WikiLink {
    /// A link to `target` with default display and no section.
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        let mut link = Self {
            display: target.clone(),
            target,
            section: None,
            raw: String::new(),
        };
        link.raw = render(&link);
        link
    }

    /// Set an explicit display text. An empty display falls back to the target.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        let display = display.into();
        self.display = if display.is_empty() {
            self.target.clone()
        } else {
            display
        };
        self.raw = render(&self);
        self
    }

    /// Set the section anchor.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self.raw = render(&self);
        self
    }

    /// Returns `true` if both links have the same target, display and section.
    pub fn is_equivalent(&self, other: &WikiLink) -> bool {
        self.target == other.target && self.display == other.display && self.section == other.section
    }

    /// Returns `true` if the display text was given explicitly.
    pub fn has_explicit_display(&self) -> bool {
        self.display != self.target
    }

    fn from_inner(inner: &str, raw: &str) -> Self {
        let (target, display, section) = match inner.split_once(ALIAS) {
            Some((target, rest)) => {
                let (display, section) = split_section(rest);
                let display = if display.is_empty() { target } else { display };
                (target, display, section)
            }
            None => {
                let (target, section) = split_section(inner);
                (target, target, section)
            }
        };

        Self {
            target: target.to_string(),
            display: display.to_string(),
            section: section.map(str::to_string),
            raw: raw.to_string(),
        }
    }
}

impl fmt::Display for WikiLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

fn split_section(segment: &str) -> (&str, Option<&str>) {
    match segment.split_once(SECTION) {
        Some((head, section)) => (head, Some(section)),
        None => (segment, None),
    }
}

/// A link found by [`parse`], with its half-open char range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLinkMatch {
    /// The parsed link.
    pub link: WikiLink,
    /// Char offset of the opening `[[`.
    pub start: usize,
    /// Char offset just past the closing `]]`.
    pub end: usize,
}

impl WikiLinkMatch {
    /// The span as a selection.
    pub fn selection(&self) -> Selection {
        Selection {
            start: self.start,
            end: self.end,
        }
    }
}

/// Lazy iterator over the wiki links of a text, see [`parse`].
#[derive(Debug, Clone)]
pub struct WikiLinks<'a> {
    text: &'a str,
    byte_pos: usize,
    char_pos: usize,
}

impl Iterator for WikiLinks<'_> {
    type Item = WikiLinkMatch;

    fn next(&mut self) -> Option<WikiLinkMatch> {
        let rest = &self.text[self.byte_pos..];
        let open = rest.find(OPEN)?;
        let inner_start = open + OPEN.len();
        let Some(close) = rest[inner_start..].find(CLOSE).map(|idx| idx + inner_start) else {
            // No `]]` anywhere after this `[[`, so no later span can close either.
            self.byte_pos = self.text.len();
            return None;
        };
        let span_end = close + CLOSE.len();
        let raw = &rest[open..span_end];

        let start = self.char_pos + char_len(&rest[..open]);
        let end = start + char_len(raw);
        self.byte_pos += span_end;
        self.char_pos = end;

        Some(WikiLinkMatch {
            link: WikiLink::from_inner(&rest[inner_start..close], raw),
            start,
            end,
        })
    }
}

/// Find every well-formed wiki link in `text`, left to right, non-overlapping.
pub fn parse(text: &str) -> WikiLinks<'_> {
    WikiLinks {
        text,
        byte_pos: 0,
        char_pos: 0,
    }
}

/// The link whose span contains char `offset` (`start <= offset < end`).
pub fn link_at(text: &str, offset: usize) -> Option<WikiLinkMatch> {
    parse(text)
        .take_while(|m| m.start <= offset)
        .find(|m| offset < m.end)
}

/// Render a link back into notation, omitting defaulted parts.
///
/// A target containing `#` always uses the `|` form (with an empty display when the display is
/// defaulted) so that the output parses back to an equivalent link.
pub fn render(link: &WikiLink) -> String {
    let mut out = String::with_capacity(link.target.len() + link.display.len() + 8);
    out.push_str(OPEN);
    out.push_str(&link.target);

    let defaulted_display = link.display.is_empty() || link.display == link.target;
    if !defaulted_display {
        out.push(ALIAS);
        out.push_str(&link.display);
    } else if link.target.contains(SECTION) {
        out.push(ALIAS);
    }

    if let Some(section) = &link.section {
        out.push(SECTION);
        out.push_str(section);
    }
    out.push_str(CLOSE);
    out
}

/// Replace the selection with the notation of `link`, leaving the caret after it.
pub fn insert_link(
    buffer: &str,
    selection: Selection,
    link: &WikiLink,
) -> Result<TransformResult, TransformError> {
    let notation = render(link);
    let len = char_len(&notation) as isize;
    transform::insert_at_cursor(buffer, selection, &notation, len)
}
