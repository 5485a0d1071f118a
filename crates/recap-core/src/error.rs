use std::path::PathBuf;
use thiserror::Error;

/// All errors that halt a chat-recap run.
#[derive(Error, Debug)]
pub enum RecapError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a conversation export (wrong top-level shape).
    #[error("Invalid export file: {0}")]
    Format(String),

    /// The input is not valid JSON at all.
    #[error("Invalid export file: failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// No `conversations.json` could be located at or under the given path.
    #[error("No conversations.json found in {0}")]
    ExportNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecapError {
    /// `true` for errors caused by the content of the input rather than the
    /// environment; these are reported to the user as "invalid file".
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RecapError::Format(_) | RecapError::JsonParse(_))
    }
}

/// Convenience alias used throughout the recap crates.
pub type Result<T> = std::result::Result<T, RecapError>;

/// Why a single conversation entry could not be turned into a record.
///
/// Field errors never abort a run: the entry is skipped and counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The entry is not a JSON object.
    #[error("entry is not an object")]
    NotAnObject,

    /// A required field is absent or null.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A required field is present but unusable.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}
