//! Per-note revision history and version bookkeeping.
//!
//! Every change to a note's title or content appends one [`HistoryEntry`]
//! holding the *new* values and bumps `version` by exactly one. Entries are
//! never edited or removed; restoring an old revision goes through a normal
//! update and therefore appends a fresh entry.
//!
//! Folders start with `version == 1` and no history, so for folders
//! `version == history.len() + 1` once they have been renamed. Notes start
//! with one entry and keep `version == history.len()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Note;

/// A point-in-time snapshot of a note's title and content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

/// A history entry with its display number, as shown in the history panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// One-based position in the history (`v1`, `v2`, ...).
    pub number: usize,
    pub date: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

/// Applies a title and/or content change to `note`, recording a revision if
/// either value actually differs from what is stored.
///
/// Returns `true` if a revision was recorded. The note's other fields,
/// including `updated_at`, are left to the caller.
pub fn record_change(
    note: &mut Note,
    title: Option<&str>,
    content: Option<&str>,
    at: DateTime<Utc>,
) -> bool {
    let title_changed = title.is_some_and(|t| t != note.title);
    let content_changed = content.is_some_and(|c| c != note.content);
    if !title_changed && !content_changed {
        return false;
    }

    if let Some(t) = title {
        note.title = t.to_string();
    }
    if let Some(c) = content {
        note.content = c.to_string();
    }
    note.history.push(HistoryEntry {
        date: at,
        title: note.title.clone(),
        content: note.content.clone(),
    });
    note.version += 1;
    true
}

/// Returns the numbered revision log of `note`, oldest first.
#[must_use]
pub fn revision_log(note: &Note) -> Vec<Revision> {
    note.history
        .iter()
        .enumerate()
        .map(|(index, entry)| Revision {
            number: index + 1,
            date: entry.date,
            title: entry.title.clone(),
            content: entry.content.clone(),
        })
        .collect()
}

/// Returns the history entry at `index`, if any.
#[must_use]
pub fn entry_at(note: &Note, index: usize) -> Option<&HistoryEntry> {
    note.history.get(index)
}

/// Checks the version counter against the history length.
#[must_use]
pub fn version_is_consistent(note: &Note) -> bool {
    let expected = if note.is_folder {
        note.history.len() as u32 + 1
    } else {
        (note.history.len() as u32).max(1)
    };
    note.version == expected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WikiStatus;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap()
    }

    fn fresh_note() -> Note {
        Note {
            id: "n1".to_string(),
            title: "Untitled Note".to_string(),
            content: String::new(),
            parent_id: None,
            created_at: at(0),
            updated_at: at(0),
            tags: BTreeSet::new(),
            wiki_status: WikiStatus::Stub,
            contributors: BTreeSet::new(),
            version: 1,
            history: vec![HistoryEntry {
                date: at(0),
                title: "Untitled Note".to_string(),
                content: String::new(),
            }],
            is_folder: false,
        }
    }

    #[test]
    fn test_content_change_records_new_values() {
        let mut note = fresh_note();
        assert!(record_change(&mut note, None, Some("hello"), at(1)));
        assert_eq!(note.version, 2);
        let last = note.history.last().unwrap();
        assert_eq!(last.content, "hello");
        assert_eq!(last.title, "Untitled Note");
        assert_eq!(last.date, at(1));
    }

    #[test]
    fn test_unchanged_values_record_nothing() {
        let mut note = fresh_note();
        assert!(!record_change(&mut note, Some("Untitled Note"), Some(""), at(1)));
        assert_eq!(note.version, 1);
        assert_eq!(note.history.len(), 1);
    }

    #[test]
    fn test_title_and_content_together_bump_once() {
        let mut note = fresh_note();
        assert!(record_change(&mut note, Some("A"), Some("B"), at(2)));
        assert_eq!(note.version, 2);
        assert_eq!(note.history.len(), 2);
        assert!(version_is_consistent(&note));
    }

    #[test]
    fn test_clearing_content_is_a_change() {
        let mut note = fresh_note();
        record_change(&mut note, None, Some("text"), at(1));
        assert!(record_change(&mut note, None, Some(""), at(2)));
        assert_eq!(note.version, 3);
    }

    #[test]
    fn test_folder_version_runs_one_ahead_of_history() {
        let mut folder = fresh_note();
        folder.is_folder = true;
        folder.history.clear();
        assert!(version_is_consistent(&folder));
        record_change(&mut folder, Some("Projects"), None, at(1));
        assert_eq!(folder.version, 2);
        assert_eq!(folder.history.len(), 1);
        assert!(version_is_consistent(&folder));
    }

    #[test]
    fn test_revision_log_numbers_from_one() {
        let mut note = fresh_note();
        record_change(&mut note, None, Some("a"), at(1));
        let log = revision_log(&note);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].number, 1);
        assert_eq!(log[1].number, 2);
        assert_eq!(log[1].content, "a");
    }
}
