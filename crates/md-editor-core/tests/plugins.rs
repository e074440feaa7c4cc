use md_editor_core::transform;
use md_editor_core::{
    Action, ActionSpec, ActionSpecKind, EditorConfig, EditorError, EditorSession, MarkdownSyntax,
    Plugin, PluginContext, PluginMeta, PluginRef, PluginRegistry, RegistryError, RenderError,
    Selection, Shortcut, TransformError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Inserts a fixed stamp and counts `destroy` calls.
struct Stamp {
    name: &'static str,
    stamp: &'static str,
    shortcut: Option<&'static str>,
    overrides: bool,
    destroyed: Arc<AtomicUsize>,
}

impl Stamp {
    fn new(name: &'static str, stamp: &'static str) -> Self {
        Self {
            name,
            stamp,
            shortcut: None,
            overrides: false,
            destroyed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_shortcut(mut self, shortcut: &'static str, overrides: bool) -> Self {
        self.shortcut = Some(shortcut);
        self.overrides = overrides;
        self
    }
}

impl Plugin for Stamp {
    fn name(&self) -> &str {
        self.name
    }

    fn meta(&self) -> PluginMeta {
        PluginMeta {
            shortcut: self.shortcut.and_then(|s| s.parse().ok()),
            overrides_shortcut: self.overrides,
            ..PluginMeta::default()
        }
    }

    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError> {
        let len = self.stamp.chars().count() as isize;
        let result = transform::insert_at_cursor(ctx.text(), ctx.selection(), self.stamp, len)?;
        ctx.commit(result);
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Commits twice; the second step must see the first.
struct Twice;

impl Plugin for Twice {
    fn name(&self) -> &str {
        "twice"
    }

    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError> {
        for _ in 0..2 {
            let result = transform::insert_at_cursor(ctx.text(), ctx.selection(), "ab", 2)?;
            ctx.commit(result);
        }
        Ok(())
    }
}

/// Always fails after a commit.
struct Broken;

impl Plugin for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError> {
        let result = transform::insert_at_cursor(ctx.text(), ctx.selection(), "x", 1)?;
        ctx.commit(result);
        Err(TransformError::InvalidArgument("stamp").into())
    }
}

/// Commits two inserts, both computed against the text it started with.
struct Snapshot;

impl Plugin for Snapshot {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn execute(&self, ctx: &mut PluginContext<'_>) -> Result<(), EditorError> {
        let text = ctx.text().to_string();
        let selection = ctx.selection();
        for stamp in ["A", "B"] {
            ctx.commit(transform::insert_at_cursor(&text, selection, stamp, 1)?);
        }
        Ok(())
    }
}

fn paragraph(markdown: &str) -> Result<String, RenderError> {
    Ok(format!("<p>{markdown}</p>"))
}

fn session(text: &str) -> EditorSession {
    EditorSession::new(text, EditorConfig::default()).unwrap()
}

#[test]
fn test_bold_toggles() {
    let mut s = session("Hello World");
    s.set_selection(6, Some(11)).unwrap();
    assert_eq!(s.is_active("bold"), Some(false));

    assert!(s.execute("bold").unwrap());
    assert_eq!(s.text(), "Hello **World**");
    assert_eq!(s.selection(), Selection { start: 8, end: 13 });
    assert_eq!(s.is_active("bold"), Some(true));

    assert!(s.execute("bold").unwrap());
    assert_eq!(s.text(), "Hello World");
    assert_eq!(s.selection(), Selection { start: 6, end: 11 });
}

#[test]
fn test_inline_wrap_refuses_multiline_selection() {
    let mut s = session("one\ntwo");
    s.set_selection(1, Some(6)).unwrap();
    assert_eq!(s.can_execute("italic"), Some(false));
    assert!(!s.execute("italic").unwrap());
    assert_eq!(s.text(), "one\ntwo");
    assert_eq!(s.version(), 0);
}

#[test]
fn test_line_actions() {
    let mut s = session("a\nb");
    s.set_selection(0, Some(3)).unwrap();
    s.execute("quote").unwrap();
    assert_eq!(s.text(), "> a\n> b");
    assert_eq!(s.is_active("quote"), Some(true));

    s.execute("ordered-list").unwrap();
    assert_eq!(s.text(), "1. > a\n2. > b");

    let mut h = session("Title");
    h.execute("heading2").unwrap();
    assert_eq!(h.text(), "## Title");
    assert_eq!(h.is_active("heading2"), Some(true));
    assert_eq!(h.is_active("heading1"), Some(false));
}

#[test]
fn test_link_templates() {
    let mut s = session("go now");
    s.set_selection(0, Some(2)).unwrap();
    s.execute("link").unwrap();
    assert_eq!(s.text(), "[go]() now");
    assert_eq!(s.selection(), Selection::caret(5));

    let mut empty = session("");
    empty.execute("image").unwrap();
    assert_eq!(empty.text(), "![]()");
    assert_eq!(empty.selection(), Selection::caret(2));

    let mut wiki = session("Gondor");
    wiki.set_selection(0, Some(6)).unwrap();
    wiki.execute("wiki-link").unwrap();
    assert_eq!(wiki.text(), "[[Gondor]]");
    assert_eq!(wiki.is_active("wiki-link"), Some(true));
}

#[test]
fn test_block_actions_follow_line_ending() {
    let mut s = session("x\r\ncode");
    s.set_selection(3, Some(7)).unwrap();
    s.execute("code-block").unwrap();
    assert_eq!(s.text(), "x\r\n```\r\ncode\r\n```");
    assert_eq!(s.selection(), Selection { start: 8, end: 12 });

    let mut hr = session("abc");
    hr.set_selection(3, None).unwrap();
    hr.execute("horizontal-rule").unwrap();
    assert_eq!(hr.text(), "abc\n---\n");
    assert_eq!(hr.selection(), Selection::caret(8));
}

#[test]
fn test_custom_syntax_markers() {
    let config = EditorConfig {
        syntax: MarkdownSyntax::underscore(),
        ..EditorConfig::default()
    };
    let mut s = EditorSession::new("x", config).unwrap();
    s.set_selection(0, Some(1)).unwrap();
    s.execute("bold").unwrap();
    assert_eq!(s.text(), "__x__");
}

#[test]
fn test_shortcut_conflict_rejected_without_override() {
    let mut registry = PluginRegistry::with_builtins(MarkdownSyntax::default());
    let err = registry
        .register(PluginRef::Custom(Box::new(
            Stamp::new("stamp", "!").with_shortcut("Ctrl+B", false),
        )))
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::ShortcutConflict {
            shortcut: "Ctrl+B".to_string(),
            existing: "bold".to_string(),
            incoming: "stamp".to_string(),
        }
    );
    assert!(registry.get("stamp").is_none());

    registry
        .register(PluginRef::Custom(Box::new(
            Stamp::new("stamp", "!").with_shortcut("mod-b", true),
        )))
        .unwrap();
    let bound = registry.by_shortcut(&"Ctrl+B".parse::<Shortcut>().unwrap()).unwrap();
    assert_eq!(bound.name(), "stamp");
    // The built-in itself stays registered.
    assert!(registry.get("bold").is_some());
}

#[test]
fn test_name_conflict_last_registration_wins() {
    let first = Stamp::new("stamp", "1");
    let first_destroyed = first.destroyed.clone();
    let second = Stamp::new("stamp", "2");
    let second_destroyed = second.destroyed.clone();

    let mut s = session("");
    s.registry_mut().register(PluginRef::Custom(Box::new(first))).unwrap();
    s.registry_mut().register(PluginRef::Custom(Box::new(second))).unwrap();
    assert_eq!(first_destroyed.load(Ordering::SeqCst), 1);

    s.execute("stamp").unwrap();
    assert_eq!(s.text(), "2");

    assert!(s.registry_mut().unregister("stamp"));
    assert_eq!(second_destroyed.load(Ordering::SeqCst), 1);
    assert!(matches!(s.execute("stamp"), Err(EditorError::UnknownPlugin(name)) if name == "stamp"));
}

#[test]
fn test_registry_drop_destroys_plugins() {
    let plugin = Stamp::new("stamp", "!");
    let destroyed = plugin.destroyed.clone();
    {
        let mut registry = PluginRegistry::empty(MarkdownSyntax::default());
        registry.register(PluginRef::Custom(Box::new(plugin))).unwrap();
    }
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_builtin_ref_resolution() {
    let mut registry = PluginRegistry::empty(MarkdownSyntax::default());
    registry.register(PluginRef::from("italic")).unwrap();
    assert_eq!(registry.names(), vec!["italic"]);
    assert_eq!(
        registry.register(PluginRef::from("sparkles")),
        Err(RegistryError::UnknownBuiltin("sparkles".to_string()))
    );
}

#[test]
fn test_custom_plugin_by_value() {
    let mut s = session("ab");
    s.set_selection(1, None).unwrap();
    let plugin = PluginRef::Custom(Box::new(Stamp::new("inline", "X")));
    assert!(s.execute_ref(&plugin).unwrap());
    assert_eq!(s.text(), "aXb");
    assert!(s.registry().get("inline").is_none());
}

#[test]
fn test_multi_commit_plugin_reads_latest_state() {
    let mut s = session("");
    s.execute_ref(&PluginRef::Custom(Box::new(Twice))).unwrap();
    assert_eq!(s.text(), "abab");
    assert_eq!(s.selection(), Selection::caret(4));
    assert_eq!(s.version(), 2);
}

#[test]
fn test_failing_plugin_commits_nothing() {
    let mut s = session("keep");
    assert!(s.execute_ref(&PluginRef::Custom(Box::new(Broken))).is_err());
    assert_eq!(s.text(), "keep");
    assert_eq!(s.version(), 0);
}

#[test]
fn test_stale_second_commit_rolls_back_whole_plugin() {
    let mut s = session("xyz").with_renderer(paragraph);
    s.set_selection(1, None).unwrap();
    let deltas = Arc::new(AtomicUsize::new(0));
    let seen = deltas.clone();
    s.subscribe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let err = s.execute_ref(&PluginRef::Custom(Box::new(Snapshot))).unwrap_err();
    assert!(matches!(err, EditorError::StaleTransform));
    assert_eq!(s.text(), "xyz");
    assert_eq!(s.version(), 0);
    assert_eq!(s.selection(), Selection::caret(1));
    assert_eq!(deltas.load(Ordering::SeqCst), 0);
    assert_eq!(s.preview_html(), "<p>xyz</p>");
}

#[test]
fn test_italic_on_bold_text_adds_emphasis() {
    let mut s = session("**World**");
    s.set_selection(2, Some(7)).unwrap();
    assert_eq!(s.is_active("bold"), Some(true));
    assert_eq!(s.is_active("italic"), Some(false));

    s.execute("italic").unwrap();
    assert_eq!(s.text(), "***World***");
    assert_eq!(s.selection(), Selection { start: 3, end: 8 });
    assert_eq!(s.is_active("bold"), Some(true));
    assert_eq!(s.is_active("italic"), Some(true));

    s.execute("italic").unwrap();
    assert_eq!(s.text(), "**World**");
}

#[test]
fn test_bold_on_italic_text_adds_emphasis() {
    let mut s = session("*World*");
    s.set_selection(1, Some(6)).unwrap();
    assert_eq!(s.is_active("bold"), Some(false));

    s.execute("bold").unwrap();
    assert_eq!(s.text(), "***World***");

    s.execute("bold").unwrap();
    assert_eq!(s.text(), "*World*");
    assert_eq!(s.selection(), Selection { start: 1, end: 6 });
}

#[test]
fn test_execute_by_shortcut() {
    let mut s = session("x");
    s.set_selection(0, Some(1)).unwrap();
    assert!(s.execute_shortcut("ctrl+i").unwrap());
    assert_eq!(s.text(), "*x*");
    assert!(!s.execute_shortcut("Ctrl+Alt+Z").unwrap());
    assert!(s.execute_shortcut("Hyper+Q").is_err());
}

#[test]
fn test_toolbar_reports_unresolved_names() {
    let config = EditorConfig {
        toolbar: vec!["bold".to_string(), "sparkles".to_string(), "quote".to_string()],
        ..EditorConfig::default()
    };
    let s = EditorSession::new("", config).unwrap();
    let toolbar = s.toolbar();
    let names: Vec<&str> = toolbar.buttons.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["bold", "quote"]);
    assert_eq!(toolbar.unresolved, vec!["sparkles".to_string()]);
    assert_eq!(toolbar.buttons[0].meta.tooltip.as_deref(), Some("Bold"));
}

#[test]
fn test_default_toolbar_has_every_builtin() {
    let s = session("");
    let toolbar = s.toolbar();
    assert!(toolbar.unresolved.is_empty());
    assert_eq!(toolbar.buttons.len(), md_editor_core::BUILTIN_NAMES.len());
}

#[test]
fn test_action_spec_requires_fields() {
    let spec = ActionSpec {
        name: "highlight".to_string(),
        kind: ActionSpecKind::Wrap,
        prefix: Some("==".to_string()),
        ..ActionSpec::default()
    };
    assert!(matches!(
        Action::from_spec(&spec),
        Err(EditorError::Transform(TransformError::InvalidArgument("suffix")))
    ));

    let insert = ActionSpec {
        name: "sig".to_string(),
        kind: ActionSpecKind::Insert,
        ..ActionSpec::default()
    };
    assert!(matches!(
        Action::from_spec(&insert),
        Err(EditorError::Transform(TransformError::InvalidArgument("text")))
    ));

    assert!(matches!(
        Action::from_spec(&ActionSpec::default()),
        Err(EditorError::Transform(TransformError::InvalidArgument("name")))
    ));
}

#[test]
fn test_configured_actions_are_registered() {
    let config = EditorConfig::from_json(
        r#"{
            "actions": [
                { "name": "highlight", "prefix": "==", "suffix": "==", "shortcut": "Ctrl+Shift+H" },
                { "name": "sig", "kind": "insert", "text": "-- me", "cursor_offset": 3 }
            ]
        }"#,
    )
    .unwrap();
    let mut s = EditorSession::new("x", config).unwrap();

    s.set_selection(0, Some(1)).unwrap();
    assert!(s.execute_shortcut("Ctrl+Shift+H").unwrap());
    assert_eq!(s.text(), "==x==");
    assert_eq!(s.selection(), Selection::caret(5));

    s.execute("sig").unwrap();
    assert_eq!(s.text(), "==x==-- me");
    assert_eq!(s.selection(), Selection::caret(8));
}

#[test]
fn test_configured_shortcut_conflict_fails_session() {
    let config = EditorConfig::from_json(
        r#"{ "actions": [ { "name": "mine", "prefix": "+", "suffix": "+", "shortcut": "Ctrl+B" } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        EditorSession::new("", config),
        Err(EditorError::Registry(RegistryError::ShortcutConflict { .. }))
    ));
}
