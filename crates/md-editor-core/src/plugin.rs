//! Plugin invocation contract.
//!
//! A plugin is a named formatting action (bold, heading, list, ...). Plugins never touch the
//! buffer directly: they read a [`PluginContext`], call the transform engine and
//! [`commit`](PluginContext::commit) the resulting [`TransformResult`]. Since only the engine can
//! build a `TransformResult`, every action shares the same selection-adjustment policy.
//!
//! Plugins are referenced either by built-in name or by value ([`PluginRef`]) and resolved
//! through one lookup, [`PluginRegistry::lookup`].

use crate::actions;
use crate::error::{EditorError, RegistryError};
use crate::line_ending::{Line, line_at};
use crate::selection::Selection;
use crate::transform::TransformResult;
use md_editor_core_syntax::MarkdownSyntax;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A normalized keyboard shortcut, e.g. `Ctrl+Shift+B`.
///
/// Parsing accepts `+` or `-` as separators and is case-insensitive, so `"shift-ctrl-b"` and
/// `"Ctrl+Shift+B"` are equal. `Mod` and `Cmd` are accepted aliases of `Ctrl` and `Meta`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    ctrl: bool,
    alt: bool,
    shift: bool,
    meta: bool,
    key: String,
}

impl FromStr for Shortcut {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidShortcut(s.to_string());
        let mut shortcut = Shortcut {
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            key: String::new(),
        };

        let parts: Vec<&str> = s.split(['+', '-']).map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(invalid());
        };
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "mod" => shortcut.ctrl = true,
                "alt" | "option" => shortcut.alt = true,
                "shift" => shortcut.shift = true,
                "meta" | "cmd" | "super" => shortcut.meta = true,
                _ => return Err(invalid()),
            }
        }
        if key.is_empty() {
            return Err(invalid());
        }
        shortcut.key = key.to_lowercase();
        Ok(shortcut)
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [
            (self.ctrl, "Ctrl+"),
            (self.alt, "Alt+"),
            (self.shift, "Shift+"),
            (self.meta, "Meta+"),
        ] {
            if on {
                f.write_str(name)?;
            }
        }
        f.write_str(&self.key.to_uppercase())
    }
}

/// Presentation metadata of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginMeta {
    /// Icon identifier for the toolbar button.
    pub icon: Option<String>,
    /// Tooltip text.
    pub tooltip: Option<String>,
    /// Keyboard shortcut.
    pub shortcut: Option<Shortcut>,
    /// Take over `shortcut` even if another plugin already owns it.
    pub overrides_shortcut: bool,
}

/// What a plugin sees while it runs: the buffer, the selection and a commit operation.
///
/// Commits are applied in order; after a commit, [`text`](Self::text) and
/// [`selection`](Self::selection) reflect it, so a multi-step plugin never reads a stale
/// snapshot.
pub struct PluginContext<'a> {
    text: &'a str,
    selection: Selection,
    syntax: &'a MarkdownSyntax,
    commits: Vec<TransformResult>,
}

impl<'a> PluginContext<'a> {
    /// Create a context over a buffer and selection.
    pub fn new(text: &'a str, selection: Selection, syntax: &'a MarkdownSyntax) -> Self {
        Self {
            text,
            selection,
            syntax,
            commits: Vec::new(),
        }
    }

    /// Current buffer.
    pub fn text(&self) -> &str {
        self.commits
            .last()
            .map(TransformResult::new_content)
            .unwrap_or(self.text)
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.commits
            .last()
            .map(TransformResult::new_selection)
            .unwrap_or(self.selection)
    }

    /// Markup tokens configured for this session.
    pub fn syntax(&self) -> &MarkdownSyntax {
        self.syntax
    }

    /// The line holding the selection start.
    pub fn current_line(&self) -> Line<'_> {
        line_at(self.text(), self.selection().start)
    }

    /// The selection relative to [`Self::current_line`], if it does not leave that line.
    pub fn selection_in_line(&self) -> Option<Selection> {
        let line = self.current_line();
        let selection = self.selection();
        (selection.end <= line.end).then(|| Selection {
            start: selection.start - line.start,
            end: selection.end - line.start,
        })
    }

    /// Queue a transform result computed against [`Self::text`].
    pub fn commit(&mut self, result: impl Into<TransformResult>) {
        self.commits.push(result.into());
    }

    /// Number of commits made so far.
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub(crate) fn into_commits(self) -> Vec<TransformResult> {
        self.commits
    }
}

/// A named formatting capability.
///
/// `can_execute` and `is_active` run on every selection change; implementations must stay
/// local to the current line (see [`PluginContext::current_line`]).
pub trait Plugin {
    /// Unique name used for lookup.
    fn name(&self) -> &str;

    /// Presentation metadata.
    fn meta(&self) -> PluginMeta {
        PluginMeta::default()
    }

    /// Run the action, committing transform results through `ctx`.
    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError>;

    /// Whether the action applies in this context.
    fn can_execute(&self, _ctx: &PluginContext<'_>) -> bool {
        true
    }

    /// Whether the action's formatting is already present at the selection.
    fn is_active(&self, _ctx: &PluginContext<'_>) -> bool {
        false
    }

    /// Release resources. Called when the plugin is replaced or the registry is dropped.
    fn destroy(&mut self) {}
}

/// A plugin referenced by built-in name or supplied by value.
pub enum PluginRef {
    /// One of [`actions::BUILTIN_NAMES`].
    Builtin(String),
    /// A host-provided plugin.
    Custom(Box<dyn Plugin>),
}

impl fmt::Debug for PluginRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => f.debug_tuple("Builtin").field(name).finish(),
            Self::Custom(plugin) => f.debug_tuple("Custom").field(&plugin.name()).finish(),
        }
    }
}

impl From<&str> for PluginRef {
    fn from(name: &str) -> Self {
        Self::Builtin(name.to_string())
    }
}

/// A resolved toolbar button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarButton {
    /// Plugin name.
    pub name: String,
    /// Plugin metadata.
    pub meta: PluginMeta,
}

/// Result of resolving a toolbar layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolbar {
    /// Buttons in layout order.
    pub buttons: Vec<ToolbarButton>,
    /// Names that did not resolve; those buttons are skipped.
    pub unresolved: Vec<String>,
}

/// Name → plugin table with shortcut bookkeeping.
///
/// Name conflicts resolve as last-registration-wins. Shortcut conflicts are rejected unless the
/// incoming plugin declares [`PluginMeta::overrides_shortcut`].
pub struct PluginRegistry {
    syntax: MarkdownSyntax,
    plugins: HashMap<String, Box<dyn Plugin>>,
    shortcuts: HashMap<Shortcut, String>,
}

impl PluginRegistry {
    /// An empty registry. Built-ins can still be added via [`PluginRef::Builtin`].
    pub fn empty(syntax: MarkdownSyntax) -> Self {
        Self {
            syntax,
            plugins: HashMap::new(),
            shortcuts: HashMap::new(),
        }
    }

    /// A registry holding every built-in action.
    pub fn with_builtins(syntax: MarkdownSyntax) -> Self {
        let mut registry = Self::empty(syntax);
        for name in actions::BUILTIN_NAMES {
            if let Some(plugin) = actions::builtin(name, &registry.syntax) {
                registry.insert(plugin);
            }
        }
        registry
    }

    /// Markup tokens used for built-ins.
    pub fn syntax(&self) -> &MarkdownSyntax {
        &self.syntax
    }

    /// Register a plugin, replacing any plugin of the same name.
    pub fn register(&mut self, plugin: PluginRef) -> Result<(), RegistryError> {
        let plugin = match plugin {
            PluginRef::Builtin(name) => actions::builtin(&name, &self.syntax)
                .ok_or(RegistryError::UnknownBuiltin(name))?,
            PluginRef::Custom(plugin) => plugin,
        };

        let meta = plugin.meta();
        if let Some(shortcut) = &meta.shortcut
            && let Some(owner) = self.shortcuts.get(shortcut)
            && owner != plugin.name()
            && !meta.overrides_shortcut
        {
            log::warn!(
                "rejecting plugin '{}': shortcut {} is bound to '{}'",
                plugin.name(),
                shortcut,
                owner
            );
            return Err(RegistryError::ShortcutConflict {
                shortcut: shortcut.to_string(),
                existing: owner.clone(),
                incoming: plugin.name().to_string(),
            });
        }

        self.insert(plugin);
        Ok(())
    }

    fn insert(&mut self, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();
        if let Some(mut old) = self.plugins.remove(&name) {
            log::debug!("plugin '{name}' replaced");
            old.destroy();
            self.shortcuts.retain(|_, owner| owner != &name);
        }
        if let Some(shortcut) = plugin.meta().shortcut {
            if let Some(previous) = self.shortcuts.insert(shortcut.clone(), name.clone()) {
                log::debug!("shortcut {shortcut} moved from '{previous}' to '{name}'");
            }
        }
        self.plugins.insert(name, plugin);
    }

    /// Remove a plugin by name, destroying it.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.plugins.remove(name) {
            Some(mut plugin) => {
                plugin.destroy();
                self.shortcuts.retain(|_, owner| owner != name);
                true
            }
            None => false,
        }
    }

    /// Plugin registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|plugin| plugin.as_ref())
    }

    /// Resolve a plugin reference: built-ins by name, custom plugins as themselves.
    pub fn lookup<'a>(&'a self, plugin: &'a PluginRef) -> Option<&'a dyn Plugin> {
        match plugin {
            PluginRef::Builtin(name) => self.get(name),
            PluginRef::Custom(plugin) => Some(plugin.as_ref()),
        }
    }

    /// Plugin bound to `shortcut`.
    pub fn by_shortcut(&self, shortcut: &Shortcut) -> Option<&dyn Plugin> {
        self.shortcuts
            .get(shortcut)
            .and_then(|name| self.get(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a toolbar layout. Unknown names are reported, not fatal.
    pub fn toolbar<S: AsRef<str>>(&self, names: &[S]) -> Toolbar {
        let mut toolbar = Toolbar::default();
        for name in names {
            let name = name.as_ref();
            match self.get(name) {
                Some(plugin) => toolbar.buttons.push(ToolbarButton {
                    name: name.to_string(),
                    meta: plugin.meta(),
                }),
                None => {
                    log::warn!("toolbar: no plugin named '{name}', skipping button");
                    toolbar.unresolved.push(name.to_string());
                }
            }
        }
        toolbar
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        for plugin in self.plugins.values_mut() {
            plugin.destroy();
        }
    }
}
