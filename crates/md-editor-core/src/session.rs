//! Edit session.
//!
//! [`EditorSession`] is the single owner of the buffer and selection. Everything that changes
//! the text funnels through [`EditorSession::apply`], which:
//!
//! 1. checks the [`TransformResult`] was computed against the current buffer,
//! 2. swaps buffer and selection in one step and bumps the version,
//! 3. notifies subscribers with a [`TextDelta`],
//! 4. re-renders the preview (a render failure is recorded, the edit is kept).
//!
//! # Example
//!
//! ```rust
//! use md_editor_core::{EditorConfig, EditorSession};
//!
//! let mut session = EditorSession::new("Hello World", EditorConfig::default()).unwrap();
//! session.set_selection(6, Some(11)).unwrap();
//! session.execute("bold").unwrap();
//!
//! assert_eq!(session.text(), "Hello **World**");
//! assert_eq!(session.selection().start, 8);
//! ```
//!
//! # Async collaborators
//!
//! Uploads and suggestion fetches are started with `begin_*`, which hands out a [`RequestId`],
//! and completed with `finish_*`. Only the most recently issued id is accepted; results for
//! superseded requests are discarded.

use crate::actions::Action;
use crate::autocomplete::{self, AutocompleteItem, SuggestionQuery, SuggestionSource};
use crate::config::EditorConfig;
use crate::delta::TextDelta;
use crate::error::{EditorError, TransformError};
use crate::line_ending::LineEnding;
use crate::plugin::{Plugin, PluginContext, PluginRef, PluginRegistry, Shortcut, Toolbar};
use crate::render::Renderer;
use crate::selection::{self, EditSurface, Selection};
use crate::text::{byte_offset, char_len};
use crate::transform::{self, TransformResult};
use crate::upload::{self, UploadFile, UploadResult, Uploader};
use md_editor_core_syntax::MarkdownSyntax;

/// Change callback type.
pub type ChangeCallback = Box<dyn FnMut(&TextDelta) + Send>;

/// Token identifying one asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// What happened to the preview after a commit.
#[derive(Debug)]
pub enum CommitOutcome {
    /// The preview was re-rendered.
    Rendered,
    /// No renderer is attached or the preview is disabled.
    PreviewSkipped,
    /// The renderer failed; the edit is kept.
    RenderFailed(EditorError),
}

impl CommitOutcome {
    /// Returns `true` unless the renderer failed.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::RenderFailed(_))
    }
}

/// Outcome of [`EditorSession::finish_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The image notation was inserted.
    Inserted,
    /// The request was superseded; the result was ignored.
    Discarded,
}

/// Buffer, selection and collaborators of one editor instance.
pub struct EditorSession {
    text: String,
    selection: Selection,
    version: u64,
    config: EditorConfig,
    registry: PluginRegistry,
    renderer: Option<Box<dyn Renderer>>,
    preview_html: String,
    last_render_error: Option<String>,
    callbacks: Vec<ChangeCallback>,
    next_request: u64,
    pending_upload: Option<RequestId>,
    pending_suggestions: Option<(RequestId, SuggestionQuery)>,
    active_query: Option<SuggestionQuery>,
    suggestions: Vec<AutocompleteItem>,
}

fn run_plugin(
    plugin: &dyn Plugin,
    text: &str,
    selection: Selection,
    syntax: &MarkdownSyntax,
) -> Result<Option<Vec<TransformResult>>, EditorError> {
    let mut ctx = PluginContext::new(text, selection, syntax);
    if !plugin.can_execute(&ctx) {
        log::debug!("plugin '{}' cannot execute here", plugin.name());
        return Ok(None);
    }
    plugin.execute(&mut ctx)?;
    Ok(Some(ctx.into_commits()))
}

impl EditorSession {
    /// Create a session over `text` with the caret at the start.
    ///
    /// Registers the built-ins plus every custom action of `config`.
    pub fn new(text: &str, config: EditorConfig) -> Result<Self, EditorError> {
        if !config.syntax.has_inline_markers() {
            log::warn!("markdown syntax has an empty inline marker; wrap actions will not format");
        }
        let mut registry = PluginRegistry::with_builtins(config.syntax.clone());
        for spec in &config.actions {
            let action = Action::from_spec(spec)?;
            registry.register(PluginRef::Custom(Box::new(action)))?;
        }

        Ok(Self {
            text: text.to_string(),
            selection: Selection::caret(0),
            version: 0,
            config,
            registry,
            renderer: None,
            preview_html: String::new(),
            last_render_error: None,
            callbacks: Vec::new(),
            next_request: 0,
            pending_upload: None,
            pending_suggestions: None,
            active_query: None,
            suggestions: Vec::new(),
        })
    }

    /// Attach a preview renderer and render the current buffer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self.render_preview();
        self
    }

    /// Current buffer.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Number of committed changes.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Dominant line ending of the buffer.
    pub fn line_ending(&self) -> LineEnding {
        LineEnding::detect_in_text(&self.text)
    }

    /// Plugin registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Mutable plugin registry, for registering host plugins.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    /// HTML of the last successful render.
    pub fn preview_html(&self) -> &str {
        &self.preview_html
    }

    /// Message of the last render failure, cleared by the next successful render.
    pub fn last_render_error(&self) -> Option<&str> {
        self.last_render_error.as_deref()
    }

    /// Subscribe to committed changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&TextDelta) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Set the selection; `end` defaults to `start`.
    pub fn set_selection(
        &mut self,
        start: usize,
        end: Option<usize>,
    ) -> Result<Selection, TransformError> {
        selection::set_selection(self, start, end)
    }

    /// Verify `result` was computed against the current buffer.
    fn check_fresh(&self, result: &TransformResult) -> Result<(), EditorError> {
        if computed_against(&self.text, result) {
            Ok(())
        } else {
            Err(EditorError::StaleTransform)
        }
    }

    fn commit(&mut self, result: TransformResult) -> Result<(), EditorError> {
        self.check_fresh(&result)?;

        let before_char_count = char_len(&self.text);
        let (content, selection, edit) = result.into_parts();
        self.text = content;
        self.selection = selection;
        self.version += 1;

        let delta = TextDelta {
            version: self.version,
            before_char_count,
            after_char_count: char_len(&self.text),
            edit,
            selection,
        };
        log::debug!(
            "commit v{}: replaced {} chars at {} with {} chars",
            delta.version,
            delta.edit.deleted_len(),
            delta.edit.start,
            delta.edit.inserted_len()
        );
        for callback in &mut self.callbacks {
            callback(&delta);
        }
        Ok(())
    }

    /// Commit a transform result, then re-render the preview.
    pub fn apply(&mut self, result: TransformResult) -> Result<CommitOutcome, EditorError> {
        self.commit(result)?;
        Ok(self.render_preview())
    }

    fn apply_all(&mut self, commits: Vec<TransformResult>) -> Result<CommitOutcome, EditorError> {
        if commits.is_empty() {
            return Ok(CommitOutcome::PreviewSkipped);
        }
        // Each commit must build on the one before it; check the whole chain before mutating.
        let mut scratch = self.text.as_str();
        for result in &commits {
            if !computed_against(scratch, result) {
                return Err(EditorError::StaleTransform);
            }
            scratch = result.new_content();
        }
        for result in commits {
            self.commit(result)?;
        }
        Ok(self.render_preview())
    }

    /// Run a transform against the current buffer and selection and commit it.
    pub fn transform<F, R>(&mut self, f: F) -> Result<CommitOutcome, EditorError>
    where
        F: FnOnce(&str, Selection) -> Result<R, TransformError>,
        R: Into<TransformResult>,
    {
        let result = f(&self.text, self.selection)?.into();
        self.apply(result)
    }

    /// Replace the selection with `text`, see [`transform::insert_at_cursor`].
    pub fn insert_text(
        &mut self,
        text: &str,
        cursor_offset: isize,
    ) -> Result<CommitOutcome, EditorError> {
        self.transform(|buffer, selection| {
            transform::insert_at_cursor(buffer, selection, text, cursor_offset)
        })
    }

    /// Re-render the preview from the current buffer.
    pub fn render_preview(&mut self) -> CommitOutcome {
        if !self.config.preview {
            return CommitOutcome::PreviewSkipped;
        }
        let Some(renderer) = &self.renderer else {
            return CommitOutcome::PreviewSkipped;
        };

        match renderer.render(&self.text) {
            Ok(html) => {
                self.preview_html = html;
                self.last_render_error = None;
                CommitOutcome::Rendered
            }
            Err(err) => {
                log::warn!("preview render failed at v{}: {err}", self.version);
                self.last_render_error = Some(err.message.clone());
                CommitOutcome::RenderFailed(err.into())
            }
        }
    }

    /// Resolve and run the plugin called `name`.
    ///
    /// Returns `Ok(false)` if the plugin declined via `can_execute`. A failing plugin leaves the
    /// buffer untouched.
    pub fn execute(&mut self, name: &str) -> Result<bool, EditorError> {
        let plugin = PluginRef::Builtin(name.to_string());
        self.execute_ref(&plugin)
    }

    /// Run a plugin given by reference.
    pub fn execute_ref(&mut self, plugin: &PluginRef) -> Result<bool, EditorError> {
        let commits = {
            let resolved = self.registry.lookup(plugin).ok_or_else(|| {
                let name = match plugin {
                    PluginRef::Builtin(name) => name.clone(),
                    PluginRef::Custom(custom) => custom.name().to_string(),
                };
                EditorError::UnknownPlugin(name)
            })?;
            run_plugin(resolved, &self.text, self.selection, self.registry.syntax())?
        };

        match commits {
            Some(commits) => {
                self.apply_all(commits)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run the plugin bound to `shortcut`. Returns `Ok(false)` if nothing is bound.
    pub fn execute_shortcut(&mut self, shortcut: &str) -> Result<bool, EditorError> {
        let shortcut: Shortcut = shortcut.parse()?;
        let Some(name) = self
            .registry
            .by_shortcut(&shortcut)
            .map(|plugin| plugin.name().to_string())
        else {
            return Ok(false);
        };
        self.execute(&name)
    }

    fn with_context<T>(
        &self,
        name: &str,
        f: impl FnOnce(&dyn Plugin, &PluginContext<'_>) -> T,
    ) -> Option<T> {
        let plugin = self.registry.get(name)?;
        let ctx = PluginContext::new(&self.text, self.selection, self.registry.syntax());
        Some(f(plugin, &ctx))
    }

    /// Whether the named plugin's formatting is active at the selection.
    pub fn is_active(&self, name: &str) -> Option<bool> {
        self.with_context(name, |plugin, ctx| plugin.is_active(ctx))
    }

    /// Whether the named plugin can run at the selection.
    pub fn can_execute(&self, name: &str) -> Option<bool> {
        self.with_context(name, |plugin, ctx| plugin.can_execute(ctx))
    }

    /// Resolve the configured toolbar layout.
    pub fn toolbar(&self) -> Toolbar {
        self.registry.toolbar(&self.config.toolbar)
    }

    fn issue_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Start an upload. Any upload still in flight is superseded.
    pub fn begin_upload(&mut self) -> RequestId {
        let id = self.issue_request();
        self.pending_upload = Some(id);
        id
    }

    /// Complete an upload started with [`Self::begin_upload`].
    ///
    /// `Err` is a rejected upload. Both a rejection and a result carrying `error` fail with
    /// [`EditorError::UploadFailure`] and insert nothing.
    pub fn finish_upload(
        &mut self,
        id: RequestId,
        outcome: Result<UploadResult, String>,
    ) -> Result<UploadOutcome, EditorError> {
        if self.pending_upload != Some(id) {
            log::debug!("discarding superseded upload result {id:?}");
            return Ok(UploadOutcome::Discarded);
        }
        self.pending_upload = None;

        let result = outcome.map_err(EditorError::UploadFailure);
        let inserted = result
            .and_then(|result| upload::insert_uploaded_image(&self.text, self.selection, &result));
        match inserted {
            Ok(transform) => {
                self.apply(transform)?;
                Ok(UploadOutcome::Inserted)
            }
            Err(err) => {
                log::warn!("image upload not inserted: {err}");
                Err(err)
            }
        }
    }

    /// Upload through a synchronous [`Uploader`] and insert the result.
    pub fn upload_with(
        &mut self,
        uploader: &mut dyn Uploader,
        file: &UploadFile,
    ) -> Result<UploadOutcome, EditorError> {
        let id = self.begin_upload();
        let outcome = uploader.upload(file);
        self.finish_upload(id, outcome)
    }

    /// Start a suggestion fetch for the query under the caret.
    ///
    /// Returns the request id and the query to pass to the suggestion source, or `None`
    /// (clearing any suggestions) when the caret is not in a query.
    pub fn begin_suggestions(&mut self) -> Option<(RequestId, SuggestionQuery)> {
        let Some(query) = autocomplete::query_at(&self.text, self.selection, &self.config.autocomplete)
        else {
            self.dismiss_suggestions();
            return None;
        };
        let id = self.issue_request();
        self.pending_suggestions = Some((id, query.clone()));
        Some((id, query))
    }

    /// Complete a suggestion fetch. Returns `false` if the request was superseded.
    ///
    /// An `Err` from the source is logged and treated as an empty list.
    pub fn finish_suggestions(
        &mut self,
        id: RequestId,
        items: Result<Vec<AutocompleteItem>, String>,
    ) -> bool {
        let query = match self.pending_suggestions.take() {
            Some((pending, query)) if pending == id => query,
            other => {
                self.pending_suggestions = other;
                log::debug!("discarding superseded suggestions {id:?}");
                return false;
            }
        };

        self.suggestions = items.unwrap_or_else(|err| {
            log::warn!("suggestion source failed for '{}': {err}", query.text);
            Vec::new()
        });
        self.active_query = Some(query);
        true
    }

    /// Fetch suggestions synchronously from `source`.
    pub fn suggest_with(&mut self, source: &dyn SuggestionSource) -> &[AutocompleteItem] {
        if let Some((id, query)) = self.begin_suggestions() {
            let items = source.suggestions(&query.text);
            self.finish_suggestions(id, items);
        }
        &self.suggestions
    }

    /// Current suggestion list.
    pub fn suggestions(&self) -> &[AutocompleteItem] {
        &self.suggestions
    }

    /// Drop the suggestion list and any pending fetch.
    pub fn dismiss_suggestions(&mut self) {
        self.pending_suggestions = None;
        self.active_query = None;
        self.suggestions.clear();
    }

    /// Replace the active query with suggestion `index`.
    ///
    /// Returns `Ok(false)` if there is no such suggestion or the caret has left the query.
    pub fn accept_suggestion(&mut self, index: usize) -> Result<bool, EditorError> {
        let (Some(query), Some(item)) = (self.active_query.clone(), self.suggestions.get(index))
        else {
            return Ok(false);
        };
        let still_there = autocomplete::query_at(&self.text, self.selection, &self.config.autocomplete)
            .is_some_and(|current| current.start == query.start);
        if !still_there {
            self.dismiss_suggestions();
            return Ok(false);
        }

        let result = autocomplete::apply_suggestion(
            &self.text,
            self.selection,
            &query,
            item,
            &self.config.autocomplete,
        )?;
        self.dismiss_suggestions();
        self.apply(result)?;
        Ok(true)
    }
}

impl EditSurface for EditorSession {
    fn text(&self) -> &str {
        &self.text
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn store_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }
}

/// `true` if `result` was computed against `text`.
fn computed_against(text: &str, result: &TransformResult) -> bool {
    let edit = result.edit();
    let new_content = result.new_content();
    let start = byte_offset(text, edit.start);
    let deleted_end = start + edit.deleted_text.len();
    let inserted_end = start + edit.inserted_text.len();

    text.get(start..deleted_end) == Some(edit.deleted_text.as_str())
        && new_content.get(..start) == text.get(..start)
        && new_content.get(inserted_end..) == text.get(deleted_end..)
}
