//! Core library for RetroNotes, a retro-styled hierarchical wiki notebook.
//!
//! The primary entry point is [`NoteStore`], which owns every note and folder,
//! tracks the current selection and persists through a [`KeyValueStore`].
//! All note mutations go through `NoteStore` methods; links, backlinks and the
//! [`NoteGraph`] are recomputed from note content on every query.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    clock::{Clock, ManualClock, SystemClock},
    config::StoreConfig,
    delete::DeleteResult,
    error::{Result, RetroNotesError},
    export::{
        export_workspace, import_workspace, peek_import, ExportError, ExportNotes, ImportResult,
        ImportedWorkspace, APP_VERSION, EXPORT_FORMAT_VERSION,
    },
    graph::{build_graph, EdgeKind, GraphEdge, GraphNode, GraphOptions, NoteGraph},
    ids::{IdGenerator, SequentialIds, UuidGenerator},
    links::{
        extract_references, inline_segments, rewrite_references, BacklinkSummary, InlineSegment,
        LinkIndex, LinkKind, Reference, ResolvedReference,
    },
    note::{Note, NotePatch, WikiStatus},
    preferences::{Preferences, ThemeVariant, UnknownTheme},
    query::{DateFilter, NoteQuery, SortOption, ViewOption},
    revision::{HistoryEntry, Revision},
    storage::{KeyValueStore, MemoryStorage, SqliteStorage},
    store::NoteStore,
    tags::extract_hashtags,
    tree::{flatten, ForestIssue, TreeRow},
};
