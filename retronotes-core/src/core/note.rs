//! The note entity and the partial-update patch applied to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::revision::HistoryEntry;

/// Title given to a freshly created note.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Title given to a freshly created folder.
pub const DEFAULT_FOLDER_TITLE: &str = "New Folder";

/// Editorial maturity marker, independent of content length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WikiStatus {
    /// Just started, minimal content.
    #[default]
    Stub,
    /// Work in progress.
    Draft,
    /// Finished and reviewed.
    Complete,
}

/// A single note or folder in the store.
///
/// Serialized in camelCase so the persisted array matches the layout the
/// front-end writes to browser storage. Optional fields default when absent,
/// which lets older payloads without `history` or `isFolder` load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub wiki_status: WikiStatus,
    #[serde(default)]
    pub contributors: BTreeSet<String>,
    #[serde(default = "initial_version")]
    pub version: u32,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub is_folder: bool,
}

fn initial_version() -> u32 {
    1
}

impl Note {
    /// Returns `true` if this note has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Title used for display, falling back to the default for blank titles.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_NOTE_TITLE
        } else {
            &self.title
        }
    }
}

/// A partial update merged into an existing note by
/// [`NoteStore::update`](crate::NoteStore::update).
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub wiki_status: Option<WikiStatus>,
    pub contributors: Option<Vec<String>>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn status(status: WikiStatus) -> Self {
        Self {
            wiki_status: Some(status),
            ..Self::default()
        }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Some(tags.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch touches neither title nor content.
    #[must_use]
    pub fn is_metadata_only(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Note {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Note {
            id: "test-id".to_string(),
            title: "Test Note".to_string(),
            content: "body".to_string(),
            parent_id: None,
            created_at: at,
            updated_at: at,
            tags: BTreeSet::new(),
            wiki_status: WikiStatus::Draft,
            contributors: BTreeSet::new(),
            version: 1,
            history: vec![],
            is_folder: false,
        }
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"parentId\":null"));
        assert!(json.contains("\"wikiStatus\":\"draft\""));
        assert!(json.contains("\"isFolder\":false"));
        assert!(json.contains("\"createdAt\""));
    }

    #[test]
    fn test_missing_optional_fields_take_defaults() {
        let json = r#"{
            "id": "a",
            "title": "Legacy",
            "content": "",
            "parentId": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.version, 1);
        assert!(note.history.is_empty());
        assert!(!note.is_folder);
        assert_eq!(note.wiki_status, WikiStatus::Stub);
    }

    #[test]
    fn test_display_title_falls_back_for_blank() {
        let mut note = sample();
        note.title = "   ".to_string();
        assert_eq!(note.display_title(), DEFAULT_NOTE_TITLE);
    }

    #[test]
    fn test_patch_metadata_only() {
        assert!(NotePatch::status(WikiStatus::Complete).is_metadata_only());
        assert!(NotePatch::tags(["a"]).is_metadata_only());
        assert!(!NotePatch::title("x").is_metadata_only());
    }
}
