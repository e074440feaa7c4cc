#![warn(missing_docs)]
//! `md-editor-core-syntax` - data-driven markdown markup tokens for `md-editor-core`.
//!
//! This crate intentionally stays lightweight and does **not** depend on a markdown parser. It
//! provides small structs that hosts can use to configure which markers the built-in formatting
//! actions emit (e.g. `**` vs `__` for bold).

use serde::{Deserialize, Serialize};

/// Markup tokens emitted by the built-in formatting actions.
///
/// Every field has a CommonMark/GFM default, see [`MarkdownSyntax::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownSyntax {
    /// Strong emphasis delimiter. Default: `**`.
    pub bold: String,
    /// Emphasis delimiter. Default: `*`.
    pub italic: String,
    /// Strikethrough delimiter (GFM). Default: `~~`.
    pub strikethrough: String,
    /// Inline code delimiter. Default: `` ` ``.
    pub code: String,
    /// Fenced code block delimiter. Default: ```` ``` ````.
    pub code_fence: String,
    /// Bullet list item prefix, including the trailing space. Default: `- `.
    pub bullet: String,
    /// Block quote prefix, including the trailing space. Default: `> `.
    pub quote: String,
    /// Task list item prefix (GFM), including the trailing space. Default: `- [ ] `.
    pub task: String,
    /// Thematic break line. Default: `---`.
    pub horizontal_rule: String,
}

impl Default for MarkdownSyntax {
    fn default() -> Self {
        Self {
            bold: "**".to_string(),
            italic: "*".to_string(),
            strikethrough: "~~".to_string(),
            code: "`".to_string(),
            code_fence: "```".to_string(),
            bullet: "- ".to_string(),
            quote: "> ".to_string(),
            task: "- [ ] ".to_string(),
            horizontal_rule: "---".to_string(),
        }
    }
}

impl MarkdownSyntax {
    /// Underscore flavour: `__bold__`, `_italic_` and `* ` bullets.
    pub fn underscore() -> Self {
        Self {
            bold: "__".to_string(),
            italic: "_".to_string(),
            bullet: "* ".to_string(),
            ..Self::default()
        }
    }

    /// ATX heading prefix for `level` (clamped to `1..=6`), including the trailing space.
    pub fn heading_prefix(level: u8) -> String {
        let level = level.clamp(1, 6) as usize;
        format!("{} ", "#".repeat(level))
    }

    /// Returns `true` if every delimiter used for wrapping is non-empty.
    pub fn has_inline_markers(&self) -> bool {
        [&self.bold, &self.italic, &self.strikethrough, &self.code]
            .iter()
            .all(|s| !s.is_empty())
    }
}
