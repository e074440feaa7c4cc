//! Preview renderer interface.
//!
//! The session calls a [`Renderer`] after every committed change. Rendering must be pure and
//! must return HTML that is safe to inject; a failure is recorded by the session and never
//! reverts the edit. `md-editor-core-render` provides the default implementation.

pub use crate::error::RenderError;

/// Markdown → safe HTML.
pub trait Renderer {
    /// Render `markdown` into sanitized HTML.
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<String, RenderError>,
{
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        self(markdown)
    }
}
