//! The note store: the canonical, persisted collection of notes and folders.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::links::{self, BacklinkSummary, LinkIndex, LinkKind, Reference, ResolvedReference};
use crate::core::note::{DEFAULT_FOLDER_TITLE, DEFAULT_NOTE_TITLE};
use crate::core::revision::{self, HistoryEntry, Revision};
use crate::core::storage::NOTES_KEY;
use crate::core::tags::{extract_hashtags, normalize_tags};
use crate::core::tree;
use crate::{
    Clock, DeleteResult, IdGenerator, KeyValueStore, Note, NotePatch, Result, RetroNotesError,
    StoreConfig, SystemClock, UuidGenerator, WikiStatus,
};

/// Fresh ids requested from the generator before `create` gives up.
const MAX_ID_ATTEMPTS: usize = 64;

const WELCOME_TITLE: &str = "Welcome to RetroNotes";

const WELCOME_CONTENT: &str = "# Welcome to RetroNotes\n\n*Wiki Status: complete*\n\nThis is your first note. You can edit it or create a new one.\n\n## Features\n\n- Markdown support\n- Hierarchical organization\n- Retro Windows 98 style\n- Wiki-like features\n\nEnjoy taking notes!";

const WELCOME_FIRST_DRAFT: &str =
    "# Welcome to RetroNotes\n\nThis is your first note. You can edit it or create a new one.";

/// Owns every note, the current selection, and the persistence side effects.
///
/// All mutations go through `NoteStore` methods. After each mutation the full
/// collection is written to the injected [`KeyValueStore`]; a failed write is
/// logged and the in-memory change stands.
///
/// The write happens synchronously at the end of the mutating call, on the
/// caller's thread. There is no background writer; a slow backend therefore
/// delays the call that triggered it.
///
/// The "current" note is held only as an id and always read back from the
/// collection, so there is exactly one copy of each note.
pub struct NoteStore {
    notes: Vec<Note>,
    positions: HashMap<String, usize>,
    current: Option<String>,
    storage: Box<dyn KeyValueStore>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    config: StoreConfig,
}

impl NoteStore {
    /// Opens a store over `storage` with random ids, the system clock and
    /// default configuration.
    pub fn open(storage: Box<dyn KeyValueStore>) -> Self {
        Self::open_with(
            storage,
            Box::new(UuidGenerator),
            Box::new(SystemClock),
            StoreConfig::default(),
        )
    }

    /// Opens a store with explicit collaborators.
    ///
    /// Never fails: unreadable or corrupt persisted notes are logged and the
    /// store starts from the seed state without overwriting what is stored.
    /// An absent notes key is a first launch; the welcome note is seeded and
    /// written out.
    pub fn open_with(
        storage: Box<dyn KeyValueStore>,
        ids: Box<dyn IdGenerator>,
        clock: Box<dyn Clock>,
        config: StoreConfig,
    ) -> Self {
        let mut store = Self {
            notes: Vec::new(),
            positions: HashMap::new(),
            current: None,
            storage,
            ids,
            clock,
            config,
        };

        match store.storage.get(NOTES_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Note>>(&json) {
                Ok(notes) => {
                    let (notes, issues) = tree::repair_forest(notes);
                    for issue in &issues {
                        log::warn!("Repaired stored note tree: {issue:?}");
                    }
                    store.notes = notes;
                    store.reindex();
                    store.current = fallback_selection(&store.notes);
                    log::info!("Loaded {} notes", store.notes.len());
                    if !issues.is_empty() {
                        store.persist();
                    }
                }
                Err(e) => {
                    log::error!("Failed to parse saved notes: {e}");
                    store.seed();
                }
            },
            Ok(None) => {
                store.seed();
                store.persist();
            }
            Err(e) => {
                log::error!("Failed to read saved notes: {e}");
                store.seed();
            }
        }

        store
    }

    fn seed(&mut self) {
        if !self.config.seed_welcome_note {
            return;
        }
        let now = self.clock.now();
        let note = Note {
            id: self.ids.next_id(),
            title: WELCOME_TITLE.to_string(),
            content: WELCOME_CONTENT.to_string(),
            parent_id: None,
            created_at: now,
            updated_at: now,
            tags: BTreeSet::from(["welcome".to_string()]),
            wiki_status: WikiStatus::Complete,
            contributors: BTreeSet::from(["System".to_string()]),
            version: 1,
            history: vec![HistoryEntry {
                date: now,
                title: WELCOME_TITLE.to_string(),
                content: WELCOME_FIRST_DRAFT.to_string(),
            }],
            is_folder: false,
        };
        log::info!("Seeding welcome note {}", note.id);
        self.current = Some(note.id.clone());
        self.notes = vec![note];
        self.reindex();
    }

    fn reindex(&mut self) {
        self.positions = self
            .notes
            .iter()
            .enumerate()
            .map(|(pos, note)| (note.id.clone(), pos))
            .collect();
    }

    /// Writes the whole collection under [`NOTES_KEY`]. Failures are logged only.
    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.notes) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize notes: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.set(NOTES_KEY, &json) {
            log::warn!("Failed to persist notes: {e}");
        }
    }

    fn allocate_id(&mut self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !self.positions.contains_key(&id) {
                return Ok(id);
            }
            log::debug!("Generated id {id} is already in use");
        }
        log::warn!("Id generator produced {MAX_ID_ATTEMPTS} colliding ids in a row");
        Err(RetroNotesError::IdExhausted(MAX_ID_ATTEMPTS))
    }

    // ── Reads ─────────────────────────────────────────────────────

    /// Every note in storage (insertion) order.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Note> {
        self.positions.get(id).map(|&pos| &self.notes[pos])
    }

    /// Direct children of `parent_id` (roots when `None`), in storage order.
    #[must_use]
    pub fn children_of(&self, parent_id: Option<&str>) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| note.parent_id.as_deref() == parent_id)
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Selection ─────────────────────────────────────────────────

    /// The note currently focused for editing.
    #[must_use]
    pub fn current(&self) -> Option<&Note> {
        self.current.as_deref().and_then(|id| self.by_id(id))
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Focuses `id`, or clears the selection with `None`.
    ///
    /// Selecting an unknown id leaves the selection unchanged and returns `false`.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.current = None;
                true
            }
            Some(id) if self.positions.contains_key(id) => {
                self.current = Some(id.to_string());
                true
            }
            Some(id) => {
                log::debug!("Ignoring selection of unknown note {id}");
                false
            }
        }
    }

    // ── Mutations ─────────────────────────────────────────────────

    /// Creates an empty note or folder under `parent_id` (a root when `None`).
    ///
    /// Notes start with one history entry and become the current note.
    /// Folders start with no history and never take the selection.
    ///
    /// # Errors
    ///
    /// Returns [`RetroNotesError::InvalidParent`] if `parent_id` names no note,
    /// and [`RetroNotesError::IdExhausted`] if the id generator keeps producing
    /// ids that are already taken.
    pub fn create(&mut self, parent_id: Option<&str>, is_folder: bool) -> Result<Note> {
        if let Some(parent_id) = parent_id {
            if !self.positions.contains_key(parent_id) {
                return Err(RetroNotesError::InvalidParent(parent_id.to_string()));
            }
        }

        let now = self.clock.now();
        let title = if is_folder {
            DEFAULT_FOLDER_TITLE
        } else {
            DEFAULT_NOTE_TITLE
        };
        let history = if is_folder {
            vec![]
        } else {
            vec![HistoryEntry {
                date: now,
                title: title.to_string(),
                content: String::new(),
            }]
        };
        let contributors = if self.config.contributor.is_empty() {
            BTreeSet::new()
        } else {
            BTreeSet::from([self.config.contributor.clone()])
        };

        let note = Note {
            id: self.allocate_id()?,
            title: title.to_string(),
            content: String::new(),
            parent_id: parent_id.map(str::to_string),
            created_at: now,
            updated_at: now,
            tags: BTreeSet::new(),
            wiki_status: if is_folder {
                WikiStatus::Complete
            } else {
                WikiStatus::Stub
            },
            contributors,
            version: 1,
            history,
            is_folder,
        };

        self.positions.insert(note.id.clone(), self.notes.len());
        self.notes.push(note.clone());
        if !is_folder {
            self.current = Some(note.id.clone());
        }
        self.persist();
        Ok(note)
    }

    /// Shorthand for `create(parent_id, false)`.
    pub fn create_note(&mut self, parent_id: Option<&str>) -> Result<Note> {
        self.create(parent_id, false)
    }

    /// Shorthand for `create(parent_id, true)`.
    pub fn create_folder(&mut self, parent_id: Option<&str>) -> Result<Note> {
        self.create(parent_id, true)
    }

    /// Merges `patch` into note `id` and returns the updated note.
    ///
    /// A title or content that differs from the stored value records one
    /// revision and bumps the version once, however many of the two changed.
    /// Tag, status and contributor changes alone do not. New content also
    /// adds its `#hashtags` to the note's tags. `updated_at` is always
    /// refreshed.
    ///
    /// An unknown `id` is a no-op returning `None`.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> Option<&Note> {
        let Some(&pos) = self.positions.get(id) else {
            log::debug!("Ignoring update of unknown note {id}");
            return None;
        };
        let now = self.clock.now();
        let contributor = self.config.contributor.clone();

        let note = &mut self.notes[pos];
        let content_changed = patch
            .content
            .as_deref()
            .is_some_and(|content| content != note.content);
        let revised = revision::record_change(
            note,
            patch.title.as_deref(),
            patch.content.as_deref(),
            now,
        );

        if let Some(tags) = patch.tags {
            note.tags = normalize_tags(tags);
        }
        if content_changed {
            note.tags.extend(extract_hashtags(&note.content));
        }
        if let Some(status) = patch.wiki_status {
            note.wiki_status = status;
        }
        if let Some(contributors) = patch.contributors {
            note.contributors = contributors
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if revised && !contributor.is_empty() {
            note.contributors.insert(contributor);
        }
        note.updated_at = now;

        self.persist();
        self.notes.get(pos)
    }

    /// Deletes `id` and its entire subtree.
    ///
    /// If the current note is among the removed ones, the selection falls back
    /// to the first remaining non-folder root note, or to none. An unknown
    /// `id` is a no-op.
    pub fn delete(&mut self, id: &str) -> DeleteResult {
        if !self.positions.contains_key(id) {
            log::debug!("Ignoring delete of unknown note {id}");
            return DeleteResult::default();
        }

        let mut doomed = vec![id.to_string()];
        doomed.extend(tree::descendant_ids(&self.notes, id));
        let doomed_set: HashSet<&str> = doomed.iter().map(String::as_str).collect();

        self.notes.retain(|note| !doomed_set.contains(note.id.as_str()));
        self.reindex();

        let current_removed = self
            .current
            .as_deref()
            .is_some_and(|current| doomed_set.contains(current));
        if current_removed {
            self.current = fallback_selection(&self.notes);
        }

        self.persist();
        log::debug!("Deleted {} notes under {id}", doomed.len());
        DeleteResult {
            deleted_count: doomed.len(),
            affected_ids: doomed,
        }
    }

    /// Re-applies history entry `index` of note `id` as a normal update.
    ///
    /// The restoration is itself recorded as a new revision; history is only
    /// ever extended.
    pub fn restore_revision(&mut self, id: &str, index: usize) -> Option<&Note> {
        let entry = revision::entry_at(self.by_id(id)?, index)?.clone();
        self.update(
            id,
            NotePatch {
                title: Some(entry.title),
                content: Some(entry.content),
                ..NotePatch::default()
            },
        )
    }

    /// Creates a sibling copy of `id` titled `"<title> (Copy)"` with the same
    /// content and tags.
    pub fn duplicate(&mut self, id: &str) -> Option<Note> {
        let source = self.by_id(id)?.clone();
        let copy = match self.create(source.parent_id.as_deref(), source.is_folder) {
            Ok(copy) => copy,
            Err(e) => {
                log::warn!("Failed to duplicate note {id}: {e}");
                return None;
            }
        };
        self.update(
            &copy.id,
            NotePatch {
                title: Some(format!("{} (Copy)", source.title)),
                content: Some(source.content),
                tags: Some(source.tags.into_iter().collect()),
                ..NotePatch::default()
            },
        )
        .cloned()
    }

    /// Replaces the whole collection, e.g. after importing an archive.
    ///
    /// The forest is repaired first and the selection reset. Returns the
    /// number of notes kept.
    pub fn import_notes(&mut self, notes: Vec<Note>) -> usize {
        let (notes, issues) = tree::repair_forest(notes);
        for issue in &issues {
            log::warn!("Repaired imported note tree: {issue:?}");
        }
        self.notes = notes;
        self.reindex();
        self.current = fallback_selection(&self.notes);
        self.persist();
        self.notes.len()
    }

    // ── History ───────────────────────────────────────────────────

    /// Numbered revisions of `id`, oldest first; empty for unknown ids.
    #[must_use]
    pub fn revision_log(&self, id: &str) -> Vec<Revision> {
        self.by_id(id).map(revision::revision_log).unwrap_or_default()
    }

    // ── Links ─────────────────────────────────────────────────────

    /// Resolves a link target of the given kind against the live collection.
    #[must_use]
    pub fn resolve(&self, target: &str, kind: LinkKind) -> Option<&Note> {
        links::resolve(target, kind, &self.notes)
    }

    /// Every outgoing reference of `id`, resolved or dangling.
    #[must_use]
    pub fn references_of(&self, id: &str) -> Vec<ResolvedReference> {
        match self.by_id(id) {
            Some(note) => LinkIndex::new(&self.notes).resolve_all(&note.content),
            None => Vec::new(),
        }
    }

    /// Notes whose content links to `id`.
    #[must_use]
    pub fn backlinks_of(&self, id: &str) -> Vec<&Note> {
        links::backlinks_of(id, &self.notes)
    }

    #[must_use]
    pub fn backlink_summaries(&self, id: &str) -> Vec<BacklinkSummary> {
        links::backlink_summaries(id, &self.notes)
    }

    /// References in `id`'s content that point at no existing note.
    #[must_use]
    pub fn dangling_references(&self, id: &str) -> Vec<Reference> {
        match self.by_id(id) {
            Some(note) => links::dangling_references(&note.content, &self.notes),
            None => Vec::new(),
        }
    }

    // ── Tags ──────────────────────────────────────────────────────

    /// Every tag in use, sorted and distinct.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        self.notes
            .iter()
            .flat_map(|note| note.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Notes carrying any of `tags` (OR semantics), in storage order.
    #[must_use]
    pub fn notes_for_tags(&self, tags: &[String]) -> Vec<&Note> {
        let wanted = normalize_tags(tags);
        self.notes
            .iter()
            .filter(|note| note.tags.iter().any(|tag| wanted.contains(tag)))
            .collect()
    }

    // ── Storage access ────────────────────────────────────────────

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    /// Mutable access for sibling state kept in the same storage, such as preferences.
    pub fn storage_mut(&mut self) -> &mut dyn KeyValueStore {
        self.storage.as_mut()
    }

    /// Consumes the store, handing back its storage backend.
    pub fn into_storage(self) -> Box<dyn KeyValueStore> {
        self.storage
    }
}

/// First non-folder root note in storage order.
fn fallback_selection(notes: &[Note]) -> Option<String> {
    notes
        .iter()
        .find(|note| note.is_root() && !note.is_folder)
        .map(|note| note.id.clone())
}
