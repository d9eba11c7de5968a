//! Listing queries for the note explorer: view filters, date windows, text
//! search and sorting.
//!
//! Queries are pure functions over a note slice. Filters run in this order:
//! folders, view, date window, search; the survivors are then sorted. Sorting
//! is stable, so ties keep storage order.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::tags::normalize_tags;
use crate::Note;

/// How many notes the [`ViewOption::Recent`] view keeps.
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Case-insensitive title, A to Z.
    Title,
    /// Most recently updated first.
    #[default]
    Updated,
    /// Most recently created first.
    Created,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewOption {
    #[default]
    All,
    Favorites,
    /// The [`RECENT_LIMIT`] most recently updated notes.
    Recent,
    /// Notes carrying any of the query's tags, or any tag at all when none are given.
    Tags,
    Untagged,
}

/// Window on `updated_at`, relative to the query's `now`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    None,
    /// Same UTC calendar day as `now`.
    Today,
    /// The UTC calendar day before `now`.
    Yesterday,
    /// The last 7 days.
    Week,
    /// The last 30 days.
    Month,
}

impl DateFilter {
    #[must_use]
    pub fn matches(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        match self {
            Self::None => true,
            Self::Today => at.date_naive() == today,
            Self::Yesterday => today
                .pred_opt()
                .is_some_and(|yesterday| at.date_naive() == yesterday),
            Self::Week => at >= now - Duration::days(7),
            Self::Month => at >= now - Duration::days(30),
        }
    }
}

/// A complete listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteQuery {
    pub view: ViewOption,
    pub date: DateFilter,
    pub sort: SortOption,
    /// Case-insensitive substring matched against title and content.
    pub search: String,
    /// Tags for [`ViewOption::Tags`].
    pub tags: Vec<String>,
    pub include_folders: bool,
}

impl NoteQuery {
    /// Runs the query over `notes`.
    ///
    /// `favorites` is only consulted by [`ViewOption::Favorites`]; `now`
    /// anchors the date window.
    #[must_use]
    pub fn run<'a>(
        &self,
        notes: &'a [Note],
        favorites: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<&'a Note> {
        let candidates: Vec<&Note> = notes
            .iter()
            .filter(|note| self.include_folders || !note.is_folder)
            .collect();

        let mut listed = self.apply_view(candidates, favorites);
        let needle = self.search.trim().to_lowercase();
        listed.retain(|note| self.date.matches(note.updated_at, now) && matches_search(note, &needle));
        sort_notes(&mut listed, self.sort);
        listed
    }

    fn apply_view<'a>(&self, mut notes: Vec<&'a Note>, favorites: &HashSet<String>) -> Vec<&'a Note> {
        match self.view {
            ViewOption::All => notes,
            ViewOption::Favorites => {
                notes.retain(|note| favorites.contains(&note.id));
                notes
            }
            ViewOption::Recent => {
                sort_notes(&mut notes, SortOption::Updated);
                notes.truncate(RECENT_LIMIT);
                notes
            }
            ViewOption::Tags => {
                let wanted: BTreeSet<String> = normalize_tags(&self.tags);
                notes.retain(|note| {
                    if wanted.is_empty() {
                        !note.tags.is_empty()
                    } else {
                        note.tags.iter().any(|tag| wanted.contains(tag))
                    }
                });
                notes
            }
            ViewOption::Untagged => {
                notes.retain(|note| note.tags.is_empty());
                notes
            }
        }
    }
}

fn matches_search(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.title.to_lowercase().contains(needle)
        || note.content.to_lowercase().contains(needle)
}

/// Sorts `notes` in place; ties keep their relative order.
pub fn sort_notes(notes: &mut [&Note], sort: SortOption) {
    match sort {
        SortOption::Title => notes.sort_by_cached_key(|note| note.display_title().to_lowercase()),
        SortOption::Updated => notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortOption::Created => notes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn note(id: &str, title: &str, updated_hours_ago: i64) -> Note {
        let updated = now() - Duration::hours(updated_hours_ago);
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            parent_id: None,
            created_at: updated - Duration::days(1),
            updated_at: updated,
            tags: BTreeSet::new(),
            wiki_status: Default::default(),
            contributors: BTreeSet::new(),
            version: 1,
            history: vec![],
            is_folder: false,
        }
    }

    fn ids<'a>(notes: &[&'a Note]) -> Vec<&'a str> {
        notes.iter().map(|note| note.id.as_str()).collect()
    }

    #[test]
    fn test_default_query_sorts_by_updated() {
        let notes = vec![note("a", "A", 5), note("b", "B", 1), note("c", "C", 3)];
        let listed = NoteQuery::default().run(&notes, &HashSet::new(), now());
        assert_eq!(ids(&listed), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let notes = vec![note("1", "banana", 0), note("2", "Apple", 0), note("3", "cherry", 0)];
        let query = NoteQuery {
            sort: SortOption::Title,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&query.run(&notes, &HashSet::new(), now())), vec!["2", "1", "3"]);
    }

    #[test]
    fn test_folders_excluded_unless_requested() {
        let mut folder = note("f", "Folder", 0);
        folder.is_folder = true;
        let notes = vec![folder, note("a", "A", 1)];

        assert_eq!(ids(&NoteQuery::default().run(&notes, &HashSet::new(), now())), vec!["a"]);
        let query = NoteQuery {
            include_folders: true,
            ..NoteQuery::default()
        };
        assert_eq!(query.run(&notes, &HashSet::new(), now()).len(), 2);
    }

    #[test]
    fn test_favorites_view() {
        let notes = vec![note("a", "A", 1), note("b", "B", 2)];
        let favorites = HashSet::from(["b".to_string(), "gone".to_string()]);
        let query = NoteQuery {
            view: ViewOption::Favorites,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&query.run(&notes, &favorites, now())), vec!["b"]);
    }

    #[test]
    fn test_recent_view_keeps_ten_newest() {
        let notes: Vec<Note> = (0..12).map(|i| note(&format!("n{i}"), "N", i)).collect();
        let query = NoteQuery {
            view: ViewOption::Recent,
            sort: SortOption::Created,
            ..NoteQuery::default()
        };
        let listed = query.run(&notes, &HashSet::new(), now());
        assert_eq!(listed.len(), RECENT_LIMIT);
        assert!(!ids(&listed).contains(&"n10"));
        assert!(!ids(&listed).contains(&"n11"));
    }

    #[test]
    fn test_tag_views() {
        let mut tagged = note("t", "Tagged", 1);
        tagged.tags.insert("work".to_string());
        let mut other = note("o", "Other", 2);
        other.tags.insert("home".to_string());
        let notes = vec![tagged, other, note("u", "Untagged", 3)];

        let any_tag = NoteQuery {
            view: ViewOption::Tags,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&any_tag.run(&notes, &HashSet::new(), now())), vec!["t", "o"]);

        let work = NoteQuery {
            view: ViewOption::Tags,
            tags: vec!["#Work".to_string()],
            ..NoteQuery::default()
        };
        assert_eq!(ids(&work.run(&notes, &HashSet::new(), now())), vec!["t"]);

        let untagged = NoteQuery {
            view: ViewOption::Untagged,
            ..NoteQuery::default()
        };
        assert_eq!(ids(&untagged.run(&notes, &HashSet::new(), now())), vec!["u"]);
    }

    #[test]
    fn test_date_filters() {
        // now is 12:00, so 6 hours ago is today and 20 hours ago is yesterday.
        let notes = vec![
            note("today", "T", 6),
            note("yesterday", "Y", 20),
            note("week", "W", 24 * 5),
            note("month", "M", 24 * 20),
            note("old", "O", 24 * 60),
        ];
        let run = |date| {
            let query = NoteQuery {
                date,
                ..NoteQuery::default()
            };
            query
                .run(&notes, &HashSet::new(), now())
                .iter()
                .map(|n| n.id.clone())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(DateFilter::Today), vec!["today"]);
        assert_eq!(run(DateFilter::Yesterday), vec!["yesterday"]);
        assert_eq!(run(DateFilter::Week), vec!["today", "yesterday", "week"]);
        assert_eq!(run(DateFilter::Month).len(), 4);
        assert_eq!(run(DateFilter::None).len(), 5);
    }

    #[test]
    fn test_search_title_and_content() {
        let mut with_body = note("body", "Plain", 1);
        with_body.content = "Contains the Needle here".to_string();
        let notes = vec![with_body, note("title", "NEEDLE in title", 2), note("none", "Nope", 3)];
        let query = NoteQuery {
            search: "  needle ".to_string(),
            ..NoteQuery::default()
        };
        assert_eq!(ids(&query.run(&notes, &HashSet::new(), now())), vec!["body", "title"]);
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: NoteQuery = serde_json::from_str(r#"{"view":"untagged","date":"week"}"#).unwrap();
        assert_eq!(query.view, ViewOption::Untagged);
        assert_eq!(query.date, DateFilter::Week);
        assert_eq!(query.sort, SortOption::Updated);
    }
}
