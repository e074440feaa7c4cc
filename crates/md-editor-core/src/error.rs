//! Error types.

use thiserror::Error;

/// Errors from the selection model and the transform engine.
///
/// These fail fast: a transform either returns a complete result or this error, never a
/// partially modified buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid argument: '{0}' is required")]
    /// A required parameter was missing.
    InvalidArgument(&'static str),

    #[error("invalid range {start}..{end} for buffer of {len} characters")]
    /// Offsets out of bounds or inverted.
    InvalidRange {
        /// Requested start offset.
        start: i64,
        /// Requested end offset.
        end: i64,
        /// Character length of the buffer.
        len: usize,
    },
}

/// Errors raised while registering plugins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("shortcut '{shortcut}' of '{incoming}' is already bound to '{existing}'")]
    /// A custom plugin reused a bound shortcut without declaring an override.
    ShortcutConflict {
        /// The contested shortcut, normalized.
        shortcut: String,
        /// Plugin currently owning the shortcut.
        existing: String,
        /// Plugin being registered.
        incoming: String,
    },

    #[error("invalid shortcut '{0}'")]
    /// A shortcut string could not be parsed.
    InvalidShortcut(String),

    #[error("unknown built-in plugin '{0}'")]
    /// `PluginRef::Builtin` named a plugin that does not exist.
    UnknownBuiltin(String),
}

/// Errors surfaced by [`crate::EditorSession`] and plugins.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    /// The transform engine rejected the call.
    Transform(#[from] TransformError),

    #[error(transparent)]
    /// Plugin registration failed.
    Registry(#[from] RegistryError),

    #[error("render failed: {0}")]
    /// The preview renderer failed. The buffer edit is kept.
    RenderFailure(String),

    #[error("upload failed: {0}")]
    /// The upload collaborator reported an error; nothing was inserted.
    UploadFailure(String),

    #[error("unknown plugin '{0}'")]
    /// No plugin is registered under this name.
    UnknownPlugin(String),

    #[error("transform was computed against a stale buffer")]
    /// A transform result did not match the current buffer.
    StaleTransform,

    #[error("config error: {0}")]
    /// The configuration could not be parsed.
    Config(#[from] serde_json::Error),
}

/// Error returned by a [`crate::Renderer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    /// Human-readable description.
    pub message: String,
}

impl RenderError {
    /// Create a render error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RenderError> for EditorError {
    fn from(err: RenderError) -> Self {
        EditorError::RenderFailure(err.message)
    }
}
