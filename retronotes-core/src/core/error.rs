//! Error types for the RetroNotes core library.

use thiserror::Error;

/// All errors that can occur within the RetroNotes core library.
///
/// Missing notes on update or delete and dangling links are not errors; those
/// operations are no-ops or return data describing the condition.
#[derive(Debug, Error)]
pub enum RetroNotesError {
    /// A SQLite operation in the key-value backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A note ID was requested that does not exist in the store.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// A note was to be attached under a parent that does not exist.
    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    /// The opened database is not a RetroNotes key-value store.
    #[error("Invalid storage: {0}")]
    InvalidStorage(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The id generator kept returning ids that are already in use.
    #[error("No unused note id after {0} attempts")]
    IdExhausted(usize),
}

/// Convenience alias that pins the error type to [`RetroNotesError`].
pub type Result<T> = std::result::Result<T, RetroNotesError>;

impl RetroNotesError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(e) => format!("Failed to save: {e}"),
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::InvalidParent(_) => "The parent note no longer exists".to_string(),
            Self::InvalidStorage(_) => "Could not open note storage".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::IdExhausted(_) => "Could not allocate a new note id".to_string(),
        }
    }
}
