//! Nodes-and-edges snapshot of the note collection for an external layout engine.
//!
//! The projection is rebuilt from scratch on every call and holds no state.
//! Node order follows storage order; edges list every parent-child pair first,
//! then content references in the order their sources appear.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::links::LinkIndex;
use crate::{Note, NoteStore};

/// Radius hint for the current note.
pub const CURRENT_NODE_RADIUS: u32 = 10;

/// Radius hint for every other note.
pub const NODE_RADIUS: u32 = 6;

/// Caller policy for what the projection includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphOptions {
    /// When `false`, folders and every edge touching a folder are left out.
    pub include_folders: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            include_folders: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub radius: u32,
    pub is_current: bool,
    pub is_folder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    ParentChild,
    Reference,
}

/// A directed edge: parent to child, or referencing note to referenced note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl NoteGraph {
    #[must_use]
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}

/// Builds the graph for the store's current snapshot and selection.
#[must_use]
pub fn build_graph(store: &NoteStore, options: GraphOptions) -> NoteGraph {
    project(store.notes(), store.current_id(), options)
}

/// Builds the graph for an arbitrary slice of notes.
///
/// Dangling references produce no edge. A note that links to itself yields a
/// self-loop, and repeated links yield repeated edges.
#[must_use]
pub fn project(notes: &[Note], current_id: Option<&str>, options: GraphOptions) -> NoteGraph {
    let included: Vec<&Note> = notes
        .iter()
        .filter(|note| options.include_folders || !note.is_folder)
        .collect();
    let ids: HashSet<&str> = included.iter().map(|note| note.id.as_str()).collect();

    let nodes = included
        .iter()
        .map(|note| {
            let is_current = current_id == Some(note.id.as_str());
            GraphNode {
                id: note.id.clone(),
                title: note.display_title().to_string(),
                radius: if is_current {
                    CURRENT_NODE_RADIUS
                } else {
                    NODE_RADIUS
                },
                is_current,
                is_folder: note.is_folder,
            }
        })
        .collect();

    let mut edges: Vec<GraphEdge> = included
        .iter()
        .filter_map(|note| {
            let parent_id = note.parent_id.as_deref()?;
            ids.contains(parent_id).then(|| GraphEdge {
                source: parent_id.to_string(),
                target: note.id.clone(),
                kind: EdgeKind::ParentChild,
            })
        })
        .collect();

    let index = LinkIndex::new(notes);
    for note in &included {
        for resolved in index.resolve_all(&note.content) {
            let Some(target) = resolved.note_id else {
                continue;
            };
            if ids.contains(target.as_str()) {
                edges.push(GraphEdge {
                    source: note.id.clone(),
                    target,
                    kind: EdgeKind::Reference,
                });
            }
        }
    }

    NoteGraph { nodes, edges }
}
