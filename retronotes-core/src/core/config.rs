//! Store configuration.

use serde::{Deserialize, Serialize};

/// Options fixed when a [`NoteStore`](crate::NoteStore) is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Editor name added to a note's contributors on every title or content change.
    pub contributor: String,
    /// Materialize the welcome note when storage holds no notes key at all.
    pub seed_welcome_note: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            contributor: "User".to_string(),
            seed_welcome_note: true,
        }
    }
}
