//! Session configuration.
//!
//! Plain structs with per-field defaults. Everything deserializes from JSON with missing fields
//! falling back to the defaults, so `{}` is a valid configuration.

use crate::actions::BUILTIN_NAMES;
use crate::autocomplete::AutocompleteTrigger;
use crate::error::EditorError;
use md_editor_core_syntax::MarkdownSyntax;
use serde::{Deserialize, Serialize};

/// Configuration of an [`crate::EditorSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Markers emitted by the built-in actions. Default: [`MarkdownSyntax::default`].
    pub syntax: MarkdownSyntax,
    /// Toolbar layout as plugin names. Default: every built-in, in [`BUILTIN_NAMES`] order.
    pub toolbar: Vec<String>,
    /// Autocomplete trigger. Default: `[[` ... `]]`.
    pub autocomplete: AutocompleteTrigger,
    /// Render the preview after each commit. Default: `true`.
    pub preview: bool,
    /// Custom data-defined actions registered on top of the built-ins. Default: none.
    pub actions: Vec<ActionSpec>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            syntax: MarkdownSyntax::default(),
            toolbar: BUILTIN_NAMES.iter().map(|name| name.to_string()).collect(),
            autocomplete: AutocompleteTrigger::default(),
            preview: true,
            actions: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Transform family of a data-defined action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionSpecKind {
    /// Wrap the selection with `prefix`/`suffix`.
    #[default]
    Wrap,
    /// Insert `text` at the caret.
    Insert,
    /// Toggle `prefix` on every touched line.
    LinePrefix,
}

/// A custom toolbar action described as data.
///
/// Which optional fields are required depends on `kind`: `prefix` and `suffix` for `wrap`,
/// `text` for `insert`, `prefix` for `line-prefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    /// Plugin name.
    pub name: String,
    /// Transform family.
    pub kind: ActionSpecKind,
    /// Wrapper or line prefix.
    pub prefix: Option<String>,
    /// Wrapper suffix.
    pub suffix: Option<String>,
    /// Inserted text.
    pub text: Option<String>,
    /// Caret offset for `insert`. Default: after the inserted text.
    pub cursor_offset: Option<isize>,
    /// Keep the wrapped text selected. Default: `false`.
    pub select_wrapped: bool,
    /// Keyboard shortcut, e.g. `"Ctrl+Shift+H"`.
    pub shortcut: Option<String>,
    /// Take the shortcut over from a built-in. Default: `false`.
    pub overrides_shortcut: bool,
    /// Tooltip text.
    pub tooltip: Option<String>,
    /// Icon identifier.
    pub icon: Option<String>,
}
