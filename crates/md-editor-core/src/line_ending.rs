//! Line ending helpers.
//!
//! `md-editor-core` never normalizes newlines: the buffer is edited exactly as the host supplied
//! it. Both `"\n"` and `"\r\n"` count as line separators; a lone `'\r'` is ordinary line content.
//! Text inserted by the built-in actions uses the buffer's dominant [`LineEnding`].

use crate::text::char_len;

/// The newline sequence used by a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Detect the dominant line ending from a source text.
    ///
    /// Policy: if the input contains any CRLF (`"\r\n"`), returns [`LineEnding::Crlf`],
    /// otherwise [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    /// The separator as a string slice.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }

    /// Rewrite the `'\n'` newlines of an LF template (e.g. a code fence) to this line ending.
    pub fn apply_to_text(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            Self::Crlf => text.replace('\n', "\r\n"),
        }
    }
}

/// One logical line of a buffer.
///
/// Offsets are character offsets into the whole buffer. `end` is the end of the line content,
/// i.e. the offset of the separator (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-indexed line number.
    pub number: usize,
    /// Char offset of the first character of the line.
    pub start: usize,
    /// Char offset just past the line content (excluding the separator).
    pub end: usize,
    /// Line content without its separator.
    pub content: &'a str,
    /// `"\n"`, `"\r\n"`, or `""` for the last line.
    pub separator: &'a str,
}

impl Line<'_> {
    /// Char offset of the first character of the next line (past the separator).
    pub fn next_start(&self) -> usize {
        self.end + self.separator.len()
    }

    /// Returns `true` if `offset` belongs to this line, separator included.
    pub fn owns(&self, offset: usize) -> bool {
        if self.separator.is_empty() {
            offset >= self.start
        } else {
            offset >= self.start && offset < self.next_start()
        }
    }
}

/// Iterator over the lines of a buffer, see [`lines`].
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    text: &'a str,
    byte_pos: usize,
    char_pos: usize,
    number: usize,
    done: bool,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.byte_pos..];
        let (content, separator) = match rest.find('\n') {
            Some(idx) => {
                let raw = &rest[..idx];
                match raw.strip_suffix('\r') {
                    Some(content) => (content, &rest[content.len()..=idx]),
                    None => (raw, &rest[idx..=idx]),
                }
            }
            None => {
                self.done = true;
                (rest, "")
            }
        };

        self.number += 1;
        let start = self.char_pos;
        let end = start + char_len(content);
        self.byte_pos += content.len() + separator.len();
        self.char_pos = end + separator.len();

        Some(Line {
            number: self.number,
            start,
            end,
            content,
            separator,
        })
    }
}

/// Split `text` into lines, keeping each line's own separator.
///
/// N separators produce N + 1 lines, so `""` is one empty line and a trailing newline yields a
/// final empty line.
pub fn lines(text: &str) -> Lines<'_> {
    Lines {
        text,
        byte_pos: 0,
        char_pos: 0,
        number: 0,
        done: false,
    }
}

/// The line that owns char `offset` (the last line if `offset` is past the end).
pub fn line_at(text: &str, offset: usize) -> Line<'_> {
    let mut last = None;
    for line in lines(text) {
        if line.owns(offset) {
            return line;
        }
        last = Some(line);
    }
    // `lines` always yields at least one line.
    last.unwrap_or(Line {
        number: 1,
        start: 0,
        end: 0,
        content: "",
        separator: "",
    })
}
