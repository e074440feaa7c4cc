//! Built-in formatting actions and data-defined custom actions.
//!
//! Every action is an [`Action`]: a name, presentation metadata and an [`ActionKind`] telling
//! which transform to run. Built-ins take their markers from [`MarkdownSyntax`]; custom actions
//! come from [`ActionSpec`] records in the configuration.

use crate::config::{ActionSpec, ActionSpecKind};
use crate::error::{EditorError, TransformError};
use crate::line_ending::LineEnding;
use crate::plugin::{Plugin, PluginContext, PluginMeta, Shortcut};
use crate::transform::{self, require};
use crate::wiki_link;
use md_editor_core_syntax::MarkdownSyntax;

/// Names of the built-in actions, in default toolbar order.
pub const BUILTIN_NAMES: &[&str] = &[
    "bold",
    "italic",
    "strikethrough",
    "code",
    "heading1",
    "heading2",
    "heading3",
    "heading4",
    "heading5",
    "heading6",
    "bullet-list",
    "ordered-list",
    "task-list",
    "quote",
    "code-block",
    "link",
    "image",
    "wiki-link",
    "horizontal-rule",
];

/// Which transform an [`Action`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Surround the selection. `toggle` removes an existing wrapper instead of nesting.
    Wrap {
        /// Text before the selection.
        prefix: String,
        /// Text after the selection.
        suffix: String,
        /// Keep the original text selected inside the wrapper.
        select_wrapped: bool,
        /// Unwrap when already wrapped.
        toggle: bool,
    },
    /// Insert a template at the caret.
    Insert {
        /// Inserted text.
        text: String,
        /// Caret offset, see [`transform::insert_at_cursor`].
        cursor_offset: isize,
    },
    /// Toggle a prefix on every touched line.
    LinePrefix {
        /// Line prefix, e.g. `"> "`.
        prefix: String,
    },
    /// ATX heading of the given level.
    Heading(u8),
    /// `1. ` / `2. ` numbering.
    OrderedList,
    /// Fenced code block around the selection.
    CodeBlock {
        /// Fence marker.
        fence: String,
    },
    /// `[text](url)` or `![alt](url)` template.
    Link {
        /// Emit an image instead of a link.
        image: bool,
    },
    /// `[[...]]` around the selection.
    WikiLink,
    /// Thematic break on its own line.
    HorizontalRule {
        /// Rule text.
        rule: String,
    },
}

/// A formatting action usable as a [`Plugin`].
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    meta: PluginMeta,
    kind: ActionKind,
}

fn shortcut(spec: &str) -> Option<Shortcut> {
    spec.parse().ok()
}

fn meta(tooltip: &str, icon: &str, keys: Option<&str>) -> PluginMeta {
    PluginMeta {
        icon: Some(icon.to_string()),
        tooltip: Some(tooltip.to_string()),
        shortcut: keys.and_then(shortcut),
        overrides_shortcut: false,
    }
}

fn inline_wrap(marker: &str) -> ActionKind {
    ActionKind::Wrap {
        prefix: marker.to_string(),
        suffix: marker.to_string(),
        select_wrapped: true,
        toggle: true,
    }
}

/// Build the built-in action called `name`.
pub fn builtin(name: &str, syntax: &MarkdownSyntax) -> Option<Box<dyn Plugin>> {
    let (meta, kind) = match name {
        "bold" => (meta("Bold", "bold", Some("Ctrl+B")), inline_wrap(&syntax.bold)),
        "italic" => (
            meta("Italic", "italic", Some("Ctrl+I")),
            inline_wrap(&syntax.italic),
        ),
        "strikethrough" => (
            meta("Strikethrough", "strikethrough", Some("Ctrl+Shift+X")),
            inline_wrap(&syntax.strikethrough),
        ),
        "code" => (
            meta("Inline code", "code", Some("Ctrl+E")),
            inline_wrap(&syntax.code),
        ),
        "bullet-list" => (
            meta("Bulleted list", "list-ul", Some("Ctrl+Shift+8")),
            ActionKind::LinePrefix {
                prefix: syntax.bullet.clone(),
            },
        ),
        "ordered-list" => (
            meta("Numbered list", "list-ol", Some("Ctrl+Shift+7")),
            ActionKind::OrderedList,
        ),
        "task-list" => (
            meta("Task list", "tasks", None),
            ActionKind::LinePrefix {
                prefix: syntax.task.clone(),
            },
        ),
        "quote" => (
            meta("Quote", "quote", Some("Ctrl+Shift+9")),
            ActionKind::LinePrefix {
                prefix: syntax.quote.clone(),
            },
        ),
        "code-block" => (
            meta("Code block", "code-block", Some("Ctrl+Shift+C")),
            ActionKind::CodeBlock {
                fence: syntax.code_fence.clone(),
            },
        ),
        "link" => (
            meta("Link", "link", Some("Ctrl+K")),
            ActionKind::Link { image: false },
        ),
        "image" => (meta("Image", "image", None), ActionKind::Link { image: true }),
        "wiki-link" => (
            meta("Wiki link", "wiki-link", Some("Ctrl+Shift+K")),
            ActionKind::WikiLink,
        ),
        "horizontal-rule" => (
            meta("Horizontal rule", "minus", None),
            ActionKind::HorizontalRule {
                rule: syntax.horizontal_rule.clone(),
            },
        ),
        _ => {
            let level = name.strip_prefix("heading")?.parse::<u8>().ok()?;
            if !(1..=6).contains(&level) {
                return None;
            }
            let keys = format!("Ctrl+Alt+{level}");
            (
                meta(&format!("Heading {level}"), name, Some(keys.as_str())),
                ActionKind::Heading(level),
            )
        }
    };

    Some(Box::new(Action {
        name: name.to_string(),
        meta,
        kind,
    }))
}

impl Action {
    /// Create an action from parts.
    pub fn new(name: impl Into<String>, meta: PluginMeta, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            meta,
            kind,
        }
    }

    /// Build a custom action from its data description.
    ///
    /// Fails with [`TransformError::InvalidArgument`] naming the field the kind requires but the
    /// spec lacks, or with an invalid-shortcut registry error.
    pub fn from_spec(spec: &ActionSpec) -> Result<Self, EditorError> {
        if spec.name.is_empty() {
            return Err(TransformError::InvalidArgument("name").into());
        }

        let kind = match spec.kind {
            ActionSpecKind::Wrap => ActionKind::Wrap {
                prefix: require(spec.prefix.as_deref(), "prefix")?.to_string(),
                suffix: require(spec.suffix.as_deref(), "suffix")?.to_string(),
                select_wrapped: spec.select_wrapped,
                toggle: false,
            },
            ActionSpecKind::Insert => {
                let text = require(spec.text.as_deref(), "text")?.to_string();
                let cursor_offset = spec
                    .cursor_offset
                    .unwrap_or(text.chars().count() as isize);
                ActionKind::Insert {
                    text,
                    cursor_offset,
                }
            }
            ActionSpecKind::LinePrefix => ActionKind::LinePrefix {
                prefix: require(spec.prefix.as_deref(), "prefix")?.to_string(),
            },
        };

        let shortcut = spec
            .shortcut
            .as_deref()
            .map(str::parse::<Shortcut>)
            .transpose()?;

        Ok(Self {
            name: spec.name.clone(),
            meta: PluginMeta {
                icon: spec.icon.clone(),
                tooltip: spec.tooltip.clone(),
                shortcut,
                overrides_shortcut: spec.overrides_shortcut,
            },
            kind,
        })
    }

    /// The transform this action runs.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }
}

/// Line-ending-aware leading break so block syntax starts on its own line.
fn leading_break(ctx: &PluginContext<'_>) -> &'static str {
    let line = ctx.current_line();
    if ctx.selection().start > line.start {
        LineEnding::detect_in_text(ctx.text()).as_str()
    } else {
        ""
    }
}

impl Plugin for Action {
    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> PluginMeta {
        self.meta.clone()
    }

    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError> {
        let text = ctx.text();
        let selection = ctx.selection();

        let result = match &self.kind {
            ActionKind::Wrap {
                prefix,
                suffix,
                select_wrapped,
                toggle,
            } => {
                if *toggle {
                    transform::toggle_wrap(text, selection, prefix, suffix)?
                } else {
                    transform::wrap_selection(text, selection, prefix, suffix, *select_wrapped)?
                }
            }
            ActionKind::Insert {
                text: insert,
                cursor_offset,
            } => transform::insert_at_cursor(text, selection, insert, *cursor_offset)?,
            ActionKind::LinePrefix { prefix } => {
                transform::toggle_line_prefix(text, selection, prefix)?.into()
            }
            ActionKind::Heading(level) => {
                transform::set_heading_level(text, selection, *level)?.into()
            }
            ActionKind::OrderedList => transform::number_lines(text, selection)?.into(),
            ActionKind::CodeBlock { fence } => {
                let eol = LineEnding::detect_in_text(text).as_str();
                let prefix = format!("{}{fence}{eol}", leading_break(ctx));
                let suffix = format!("{eol}{fence}");
                transform::wrap_selection(text, selection, &prefix, &suffix, true)?
            }
            ActionKind::Link { image } => {
                let bang = if *image { "!" } else { "" };
                if selection.has_selection() {
                    let template = format!("{bang}[{}]()", selection.text(text));
                    transform::insert_at_cursor(text, selection, &template, -1)?
                } else {
                    let template = format!("{bang}[]()");
                    transform::insert_at_cursor(text, selection, &template, bang.len() as isize + 1)?
                }
            }
            ActionKind::WikiLink => transform::toggle_wrap(
                text,
                selection,
                wiki_link::OPEN,
                wiki_link::CLOSE,
            )?,
            ActionKind::HorizontalRule { rule } => {
                let eol = LineEnding::detect_in_text(text).as_str();
                let block = format!("{}{rule}{eol}", leading_break(ctx));
                let len = block.chars().count() as isize;
                transform::insert_at_cursor(text, selection, &block, len)?
            }
        };

        ctx.commit(result);
        Ok(())
    }

    fn can_execute(&self, ctx: &PluginContext<'_>) -> bool {
        match &self.kind {
            ActionKind::Wrap { toggle: true, .. } | ActionKind::Link { .. } | ActionKind::WikiLink => {
                ctx.selection_in_line().is_some()
            }
            _ => true,
        }
    }

    fn is_active(&self, ctx: &PluginContext<'_>) -> bool {
        let line = ctx.current_line();
        match &self.kind {
            ActionKind::Wrap { prefix, suffix, .. } => ctx
                .selection_in_line()
                .is_some_and(|rel| transform::is_wrapped(line.content, rel, prefix, suffix)),
            ActionKind::LinePrefix { prefix } => line.content.starts_with(prefix.as_str()),
            ActionKind::Heading(level) => transform::heading_level(line.content) == Some(*level),
            ActionKind::OrderedList => transform::ordered_marker_len(line.content).is_some(),
            ActionKind::WikiLink => ctx
                .selection_in_line()
                .is_some_and(|rel| wiki_link::link_at(line.content, rel.start).is_some()),
            ActionKind::HorizontalRule { rule } => line.content == rule,
            ActionKind::Insert { .. } | ActionKind::CodeBlock { .. } | ActionKind::Link { .. } => {
                false
            }
        }
    }
}
