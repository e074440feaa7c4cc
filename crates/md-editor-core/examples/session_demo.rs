//! Edit session example
//!
//! Drives an `EditorSession` the way a host widget would: selection changes, toolbar actions,
//! an image upload and a wiki-link suggestion round trip.

use md_editor_core::{
    AutocompleteItem, EditorConfig, EditorSession, RenderError, UploadResult,
};
use std::sync::{Arc, Mutex};

fn preview(markdown: &str) -> Result<String, RenderError> {
    Ok(format!("<pre>{}</pre>", markdown.replace('<', "&lt;")))
}

fn main() {
    println!("=== Markdown edit session ===\n");

    let mut session = EditorSession::new("Hello World\nsecond line", EditorConfig::default())
        .expect("default config is valid")
        .with_renderer(preview);

    let commits = Arc::new(Mutex::new(0));
    let commits_cb = commits.clone();
    session.subscribe(move |delta| {
        *commits_cb.lock().unwrap() += 1;
        println!(
            "  v{}: {} chars -> {} chars, selection {:?}",
            delta.version, delta.before_char_count, delta.after_char_count, delta.selection
        );
    });

    println!("1. Toolbar:");
    for button in session.toolbar().buttons.iter().take(4) {
        let shortcut = button
            .meta
            .shortcut
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        println!("  {:<14} {shortcut}", button.name);
    }

    println!("\n2. Bold \"World\":");
    session.set_selection(6, Some(11)).unwrap();
    session.execute("bold").unwrap();
    println!("  {:?}", session.text());

    println!("\n3. Bullet list over both lines:");
    session.set_selection(0, Some(session.text().chars().count())).unwrap();
    session.execute("bullet-list").unwrap();
    println!("  {:?}", session.text());

    println!("\n4. Upload an image at the end:");
    let end = session.text().chars().count();
    session.set_selection(end, None).unwrap();
    let upload = session.begin_upload();
    session
        .finish_upload(upload, Ok(UploadResult::ok("https://example.com/cat.png")))
        .unwrap();
    println!("  {:?}", session.text());

    println!("\n5. Wiki-link autocomplete:");
    session.insert_text(" [[Gon", 6).unwrap();
    if let Some((id, query)) = session.begin_suggestions() {
        println!("  query {:?} at {}", query.text, query.start);
        session.finish_suggestions(id, Ok(vec![AutocompleteItem::new("Gondor")]));
        session.accept_suggestion(0).unwrap();
    }
    println!("  {:?}", session.text());

    println!("\n6. Preview:\n{}", session.preview_html());
    println!("\nTotal commits: {}", commits.lock().unwrap());
}
