//! Image upload boundary.
//!
//! The host performs the upload (usually asynchronously) and hands the outcome back as an
//! [`UploadResult`]. A successful result becomes `![alt](url "title")` at the caret; a result
//! carrying `error` inserts nothing.

use crate::error::EditorError;
use crate::selection::Selection;
use crate::transform::{self, TransformResult};
use serde::{Deserialize, Serialize};

/// A file handed to an [`Uploader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name.
    pub name: String,
    /// MIME type, if known.
    pub mime: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Outcome reported by the upload collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResult {
    /// Public URL of the uploaded file.
    pub url: String,
    /// Alt text. Falls back to the selected text.
    pub alt: Option<String>,
    /// Optional title attribute.
    pub title: Option<String>,
    /// Error message; when present nothing is inserted.
    pub error: Option<String>,
}

impl UploadResult {
    /// A successful upload.
    pub fn ok(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// A failed upload.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Host-side upload collaborator for synchronous hosts.
///
/// Asynchronous hosts use [`crate::EditorSession::begin_upload`] and
/// [`crate::EditorSession::finish_upload`] instead.
pub trait Uploader {
    /// Upload `file`. `Err` means the upload was rejected outright.
    fn upload(&mut self, file: &UploadFile) -> Result<UploadResult, String>;
}

fn escape_brackets(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Markdown image notation for a successful upload.
pub fn image_markdown(url: &str, alt: &str, title: Option<&str>) -> String {
    let url = url.replace(' ', "%20");
    match title {
        Some(title) if !title.is_empty() => {
            format!("![{}]({url} \"{}\")", escape_brackets(alt), title.replace('"', "\\\""))
        }
        _ => format!("![{}]({url})", escape_brackets(alt)),
    }
}

/// Insert the image notation for `result` in place of the selection, caret after it.
///
/// Fails with [`EditorError::UploadFailure`] if the result carries an error or no URL.
pub fn insert_uploaded_image(
    buffer: &str,
    selection: Selection,
    result: &UploadResult,
) -> Result<TransformResult, EditorError> {
    if let Some(error) = &result.error {
        return Err(EditorError::UploadFailure(error.clone()));
    }
    if result.url.is_empty() {
        return Err(EditorError::UploadFailure("upload returned no url".to_string()));
    }

    selection.validate(buffer)?;
    let alt = result
        .alt
        .as_deref()
        .unwrap_or_else(|| selection.text(buffer));
    let markdown = image_markdown(&result.url, alt, result.title.as_deref());
    let len = markdown.chars().count() as isize;
    Ok(transform::insert_at_cursor(buffer, selection, &markdown, len)?)
}
