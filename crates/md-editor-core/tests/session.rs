use md_editor_core::transform;
use md_editor_core::{
    AutocompleteItem, CommitOutcome, EditorConfig, EditorError, EditorSession, RenderError,
    Selection, SuggestionSource, TextDelta, UploadFile, UploadOutcome, UploadResult, Uploader,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn session(text: &str) -> EditorSession {
    EditorSession::new(text, EditorConfig::default()).unwrap()
}

fn echo(markdown: &str) -> Result<String, RenderError> {
    Ok(format!("<p>{markdown}</p>"))
}

#[test]
fn test_commit_notifies_subscribers() {
    let mut s = session("abc");
    let deltas: Arc<Mutex<Vec<TextDelta>>> = Arc::new(Mutex::new(Vec::new()));
    let deltas_cb = deltas.clone();
    s.subscribe(move |delta| {
        deltas_cb.lock().expect("lock").push(delta.clone());
    });

    s.set_selection(1, None).unwrap();
    s.insert_text("X", 1).unwrap();

    let deltas = deltas.lock().expect("lock");
    assert_eq!(deltas.len(), 1);
    let delta = &deltas[0];
    assert_eq!(delta.version, 1);
    assert_eq!(delta.before_char_count, 3);
    assert_eq!(delta.after_char_count, 4);
    assert_eq!(delta.edit.start, 1);
    assert_eq!(delta.edit.deleted_text, "");
    assert_eq!(delta.edit.inserted_text, "X");
    assert_eq!(delta.selection, Selection::caret(2));
}

#[test]
fn test_transform_commits_atomically() {
    let mut s = session("Hello World");
    s.set_selection(6, Some(11)).unwrap();
    s.transform(|buffer, selection| transform::wrap_selection(buffer, selection, "_", "_", true))
        .unwrap();
    assert_eq!(s.text(), "Hello _World_");
    assert_eq!(s.selection(), Selection { start: 7, end: 12 });
    assert_eq!(s.version(), 1);

    // A failing transform leaves everything as it was.
    let err = s
        .transform(|buffer, _| transform::insert_at_cursor(buffer, Selection::caret(99), "x", 0))
        .unwrap_err();
    assert!(matches!(err, EditorError::Transform(_)));
    assert_eq!(s.text(), "Hello _World_");
    assert_eq!(s.selection(), Selection { start: 7, end: 12 });
    assert_eq!(s.version(), 1);
}

#[test]
fn test_line_transform_through_session() {
    let mut s = session("a\r\nb");
    s.set_selection(0, Some(4)).unwrap();
    s.transform(|buffer, selection| {
        transform::modify_lines(buffer, selection, |line| format!("- {line}"))
    })
    .unwrap();
    assert_eq!(s.text(), "- a\r\n- b");
    assert_eq!(s.selection(), Selection { start: 0, end: 8 });
}

#[test]
fn test_stale_transform_rejected() {
    let mut s = session("abc");
    let stale = transform::insert_at_cursor("abc", Selection::caret(3), "!", 1).unwrap();
    s.insert_text("Z", 1).unwrap();

    assert!(matches!(s.apply(stale), Err(EditorError::StaleTransform)));
    assert_eq!(s.text(), "Zabc");
}

#[test]
fn test_preview_renders_after_commit() {
    let mut s = session("a").with_renderer(echo);
    assert_eq!(s.preview_html(), "<p>a</p>");

    s.set_selection(1, None).unwrap();
    let outcome = s.insert_text("b", 1).unwrap();
    assert!(matches!(outcome, CommitOutcome::Rendered));
    assert_eq!(s.preview_html(), "<p>ab</p>");
}

#[test]
fn test_render_failure_keeps_edit() {
    let failing = |_: &str| -> Result<String, RenderError> { Err(RenderError::new("boom")) };
    let mut s = session("a").with_renderer(failing);
    assert_eq!(s.last_render_error(), Some("boom"));

    let outcome = s.insert_text("b", 1).unwrap();
    assert!(!outcome.is_ok());
    assert!(matches!(
        outcome,
        CommitOutcome::RenderFailed(EditorError::RenderFailure(ref message)) if message == "boom"
    ));
    assert_eq!(s.text(), "ba");
    assert_eq!(s.version(), 1);
    assert_eq!(s.preview_html(), "");
}

#[test]
fn test_render_error_cleared_by_success() {
    let flaky = |markdown: &str| -> Result<String, RenderError> {
        if markdown.contains('!') {
            Err(RenderError::new("no bangs"))
        } else {
            Ok(markdown.to_string())
        }
    };
    let mut s = session("!").with_renderer(flaky);
    assert!(s.last_render_error().is_some());

    s.set_selection(0, Some(1)).unwrap();
    s.insert_text("ok", 2).unwrap();
    assert_eq!(s.last_render_error(), None);
    assert_eq!(s.preview_html(), "ok");
}

#[test]
fn test_preview_disabled() {
    let config = EditorConfig {
        preview: false,
        ..EditorConfig::default()
    };
    let mut s = EditorSession::new("a", config).unwrap().with_renderer(echo);
    assert_eq!(s.preview_html(), "");
    let outcome = s.insert_text("b", 1).unwrap();
    assert!(matches!(outcome, CommitOutcome::PreviewSkipped));
}

#[test]
fn test_set_selection_rejects_out_of_range() {
    let mut s = session("abc");
    s.set_selection(1, Some(2)).unwrap();
    assert!(s.set_selection(2, Some(4)).is_err());
    assert_eq!(s.selection(), Selection { start: 1, end: 2 });
}

#[test]
fn test_upload_inserts_image() {
    let mut s = session("see ");
    s.set_selection(4, None).unwrap();
    let id = s.begin_upload();
    let result = UploadResult {
        url: "https://cdn.example/cat 1.png".to_string(),
        alt: Some("a cat".to_string()),
        title: Some("Cat".to_string()),
        error: None,
    };
    assert_eq!(s.finish_upload(id, Ok(result)).unwrap(), UploadOutcome::Inserted);
    assert_eq!(s.text(), "see ![a cat](https://cdn.example/cat%201.png \"Cat\")");
    assert_eq!(s.selection(), Selection::caret(s.text().chars().count()));
}

#[test]
fn test_upload_alt_falls_back_to_selection() {
    let mut s = session("my cat");
    s.set_selection(3, Some(6)).unwrap();
    let id = s.begin_upload();
    s.finish_upload(id, Ok(UploadResult::ok("c.png"))).unwrap();
    assert_eq!(s.text(), "my ![cat](c.png)");
}

#[test]
fn test_upload_error_inserts_nothing() {
    let mut s = session("x");
    let id = s.begin_upload();
    let err = s
        .finish_upload(id, Ok(UploadResult::failed("too large")))
        .unwrap_err();
    assert!(matches!(err, EditorError::UploadFailure(ref m) if m == "too large"));

    let id = s.begin_upload();
    let err = s.finish_upload(id, Err("network down".to_string())).unwrap_err();
    assert!(matches!(err, EditorError::UploadFailure(_)));

    assert_eq!(s.text(), "x");
    assert_eq!(s.version(), 0);
}

#[test]
fn test_superseded_upload_discarded() {
    let mut s = session("");
    let first = s.begin_upload();
    let second = s.begin_upload();

    assert_eq!(
        s.finish_upload(first, Ok(UploadResult::ok("old.png"))).unwrap(),
        UploadOutcome::Discarded
    );
    assert_eq!(s.text(), "");

    assert_eq!(
        s.finish_upload(second, Ok(UploadResult::ok("new.png"))).unwrap(),
        UploadOutcome::Inserted
    );
    assert_eq!(s.text(), "![](new.png)");

    // Completing the same request twice is a no-op.
    assert_eq!(
        s.finish_upload(second, Ok(UploadResult::ok("again.png"))).unwrap(),
        UploadOutcome::Discarded
    );
}

struct FakeUploader {
    calls: usize,
}

impl Uploader for FakeUploader {
    fn upload(&mut self, file: &UploadFile) -> Result<UploadResult, String> {
        self.calls += 1;
        Ok(UploadResult::ok(format!("/img/{}", file.name)))
    }
}

#[test]
fn test_upload_with_sync_uploader() {
    let mut s = session("");
    let mut uploader = FakeUploader { calls: 0 };
    let file = UploadFile {
        name: "dog.png".to_string(),
        mime: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    assert_eq!(s.upload_with(&mut uploader, &file).unwrap(), UploadOutcome::Inserted);
    assert_eq!(uploader.calls, 1);
    assert_eq!(s.text(), "![](/img/dog.png)");
}

#[test]
fn test_suggestions_flow() {
    let mut s = session("see [[Ara");
    s.set_selection(9, None).unwrap();

    let (first, _) = s.begin_suggestions().unwrap();
    let (second, query) = s.begin_suggestions().unwrap();
    assert_eq!(query.start, 4);
    assert_eq!(query.text, "Ara");

    assert!(!s.finish_suggestions(first, Ok(vec![AutocompleteItem::new("Arathorn")])));
    assert!(s.suggestions().is_empty());

    assert!(s.finish_suggestions(second, Ok(vec![AutocompleteItem::new("Aragorn")])));
    assert_eq!(s.suggestions().len(), 1);

    assert!(s.accept_suggestion(0).unwrap());
    assert_eq!(s.text(), "see [[Aragorn]]");
    assert_eq!(s.selection(), Selection::caret(15));
    assert!(s.suggestions().is_empty());
}

#[test]
fn test_suggestion_errors_become_empty_list() {
    let mut s = session("[[x");
    s.set_selection(3, None).unwrap();
    let (id, _) = s.begin_suggestions().unwrap();
    assert!(s.finish_suggestions(id, Err("offline".to_string())));
    assert!(s.suggestions().is_empty());
    assert!(!s.accept_suggestion(0).unwrap());
    assert_eq!(s.text(), "[[x");
}

#[test]
fn test_accept_after_caret_left_query() {
    let mut s = session("[[Ar\nnext");
    s.set_selection(4, None).unwrap();
    let (id, _) = s.begin_suggestions().unwrap();
    s.finish_suggestions(id, Ok(vec![AutocompleteItem::new("Aragorn")]));

    s.set_selection(9, None).unwrap();
    assert!(!s.accept_suggestion(0).unwrap());
    assert_eq!(s.text(), "[[Ar\nnext");
}

#[test]
fn test_no_query_clears_suggestions() {
    let mut s = session("plain [[x");
    s.set_selection(9, None).unwrap();
    let (id, _) = s.begin_suggestions().unwrap();
    s.finish_suggestions(id, Ok(vec![AutocompleteItem::new("x")]));

    s.set_selection(2, None).unwrap();
    assert!(s.begin_suggestions().is_none());
    assert!(s.suggestions().is_empty());
}

struct Pages(Vec<&'static str>);

impl SuggestionSource for Pages {
    fn suggestions(&self, query: &str) -> Result<Vec<AutocompleteItem>, String> {
        Ok(self
            .0
            .iter()
            .filter(|page| page.to_lowercase().starts_with(&query.to_lowercase()))
            .map(|page| AutocompleteItem::new(*page))
            .collect())
    }
}

#[test]
fn test_suggest_with_source_consumes_existing_close() {
    let mut s = session("[[go]]");
    s.set_selection(4, None).unwrap();
    let items = s.suggest_with(&Pages(vec!["Gondor", "Gollum", "Rohan"]));
    assert_eq!(items.len(), 2);

    assert!(s.accept_suggestion(1).unwrap());
    assert_eq!(s.text(), "[[Gollum]]");
    assert_eq!(s.selection(), Selection::caret(10));
}
