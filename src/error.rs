use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for view, enricher and loading operations.
pub type IteratorResult<T> = Result<T, IteratorError>;

/// Error type returned across the crate.
///
/// A single enum is shared by the view family, the example enrichers and the database loader.
#[derive(Debug, Error)]
pub enum IteratorError {
    /// A string key is not reachable through the view.
    #[error("key not found: '{key}'")]
    KeyNotFound { key: String },

    /// A position lies outside `[0, len)`.
    #[error("position {position} out of range for view of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    /// The operation is not defined for this view variant (e.g. `len` on a filter).
    #[error("{operation} is not supported by {view}")]
    Unsupported {
        view: &'static str,
        operation: &'static str,
    },

    /// Concatenated views share example ids.
    #[error("example ids are not unique across concatenated views: {keys:?}")]
    DuplicateKey { keys: Vec<String> },

    /// A component was constructed with an invalid or incomplete configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A field required by an enricher is absent from the example.
    #[error("example '{example_id}' is missing required field '{field}'")]
    MissingField { example_id: String, field: String },

    /// A field holds a value of the wrong kind.
    #[error("field '{field}' has unexpected type: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A nested structure is deeper than the traversal limit.
    #[error("nested structure exceeds depth limit of {limit}")]
    RecursionLimit { limit: usize },

    /// A list could not be stacked into an array.
    #[error("cannot stack list into an array: {message}")]
    Stack { message: String },

    /// A text input (e.g. an alignment file) is malformed.
    #[error("failed to parse '{}' at line {line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The database description has no dataset with this name.
    #[error("dataset not found: '{name}' (available: {available:?})")]
    DatasetNotFound {
        name: String,
        available: Vec<String>,
    },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The database description is not valid JSON or does not match the expected layout.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrays could not be combined.
    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Invalid glob pattern for description files.
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by a glob pattern could not be read.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[cfg(feature = "wav")]
    /// WAV decoding error (feature-gated behind `wav`).
    #[error("audio error: {0}")]
    Audio(#[from] hound::Error),
}

impl IteratorError {
    pub(crate) fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    pub(crate) fn unsupported(view: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { view, operation }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
