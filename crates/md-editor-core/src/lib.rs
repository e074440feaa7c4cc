#![warn(missing_docs)]
//! Markdown Editor Core - Headless Markdown Editing Kernel
//!
//! # Overview
//!
//! `md-editor-core` is the editing core of a markdown editor: a selection model, a text
//! transform engine, wiki-link notation and the plugin contract formatting actions are built on.
//! It does not render anything; the host owns the input widget and the preview pane and hands
//! the core a buffer plus a selection.
//!
//! # Core Features
//!
//! - **Character offsets everywhere**: selections count Unicode scalar values, never bytes
//! - **Pure transforms**: every transform returns new content plus the selection to restore
//! - **Line-aware editing**: `\n` and `\r\n` are preserved exactly as found
//! - **Wiki links**: `[[target|display#section]]` parsing, rendering and insertion
//! - **Plugins**: built-in and data-defined formatting actions with shortcut bookkeeping
//! - **Session**: one owner for buffer, selection, preview and async collaborators
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditorSession (commit, preview, async)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Plugins & Actions (registry, toolbar)      │  ← Formatting actions
//! ├─────────────────────────────────────────────┤
//! │  Wiki Links · Upload · Autocomplete         │  ← Notation helpers
//! ├─────────────────────────────────────────────┤
//! │  Transform Engine (insert / wrap / lines)   │  ← Pure text edits
//! ├─────────────────────────────────────────────┤
//! │  Selection Model & Line Splitting           │  ← Offsets
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Using the transform engine
//!
//! ```rust
//! use md_editor_core::{Selection, transform};
//!
//! let result = transform::wrap_selection("Hello World", Selection { start: 6, end: 11 }, "**", "**", false)
//!     .unwrap();
//! assert_eq!(result.new_content(), "Hello **World**");
//! assert_eq!(result.new_selection(), Selection::caret(15));
//! ```
//!
//! ## Using a session
//!
//! ```rust
//! use md_editor_core::{EditorConfig, EditorSession};
//!
//! let mut session = EditorSession::new("one\ntwo", EditorConfig::default()).unwrap();
//!
//! session.subscribe(|delta| {
//!     println!("v{}: {:?}", delta.version, delta.edit);
//! });
//!
//! session.set_selection(0, Some(7)).unwrap();
//! session.execute("bullet-list").unwrap();
//! assert_eq!(session.text(), "- one\n- two");
//! ```
//!
//! # Module Description
//!
//! - [`selection`] - Selection model and offset validation
//! - [`transform`] - Insert, wrap and line transforms
//! - [`line_ending`] - Line splitting and line ending detection
//! - [`wiki_link`] - Wiki-link codec
//! - [`plugin`] - Plugin contract and registry
//! - [`actions`] - Built-in and data-defined formatting actions
//! - [`session`] - Edit session, preview and async request tracking
//! - [`upload`] / [`autocomplete`] - Host collaborator boundaries
//! - [`config`] - Session configuration
//!
//! # Unicode Support
//!
//! - UTF-8 internal encoding, offsets in characters
//! - A lone `\r` is line content, not a separator
//! - Preview rendering lives in `md-editor-core-render`

pub mod actions;
pub mod autocomplete;
pub mod config;
pub mod delta;
pub mod error;
pub mod line_ending;
pub mod plugin;
pub mod render;
pub mod selection;
pub mod session;
mod text;
pub mod transform;
pub mod upload;
pub mod wiki_link;

pub use actions::{Action, ActionKind, BUILTIN_NAMES};
pub use autocomplete::{AutocompleteItem, AutocompleteTrigger, SuggestionQuery, SuggestionSource};
pub use config::{ActionSpec, ActionSpecKind, EditorConfig};
pub use delta::{TextDelta, TextEdit};
pub use error::{EditorError, RegistryError, RenderError, TransformError};
pub use line_ending::{Line, LineEnding};
pub use md_editor_core_syntax::MarkdownSyntax;
pub use plugin::{
    Plugin, PluginContext, PluginMeta, PluginRef, PluginRegistry, Shortcut, Toolbar,
    ToolbarButton,
};
pub use render::Renderer;
pub use selection::{EditSurface, Selection, get_selection, set_selection};
pub use session::{ChangeCallback, CommitOutcome, EditorSession, RequestId, UploadOutcome};
pub use transform::{LineTransformResult, TransformResult};
pub use upload::{UploadFile, UploadResult, Uploader};
pub use wiki_link::{WikiLink, WikiLinkMatch};
