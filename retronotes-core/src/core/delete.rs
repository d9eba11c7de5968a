//! Result type for cascading note removal.
//!
//! Deleting a note always removes its whole subtree. [`DeleteResult`] reports
//! what went, so the UI can drop stale references (open tabs, favorites,
//! expanded folders) in one pass.
//!
//! `DeleteResult` fields serialize in camelCase (`deletedCount`,
//! `affectedIds`), consistent with all other return types in this project.
//!
//! ## Examples
//!
//! ```rust
//! use retronotes_core::DeleteResult;
//!
//! let result = DeleteResult {
//!     deleted_count: 3,
//!     affected_ids: vec!["a".to_string(), "b".to_string(), "c".to_string()],
//! };
//! let json = serde_json::to_string(&result).unwrap();
//! assert!(json.contains("deletedCount"));
//! assert!(json.contains("affectedIds"));
//! ```

use serde::{Deserialize, Serialize};

/// The outcome of a delete on the [`NoteStore`](crate::NoteStore).
///
/// A delete of an unknown id is a no-op and yields the default
/// (empty) result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// The total number of notes that were permanently removed.
    pub deleted_count: usize,

    /// IDs of every removed note: the target first, then its descendants.
    pub affected_ids: Vec<String>,
}

impl DeleteResult {
    /// Returns `true` if nothing was removed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.deleted_count == 0
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.affected_ids.iter().any(|affected| affected == id)
    }
}
