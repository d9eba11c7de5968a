//! Iterative walks over the note forest.
//!
//! The forest is stored flat; parent/child adjacency is derived on demand
//! through [`ChildrenIndex`]. Every walk uses an explicit stack or frontier,
//! so depth is bounded only by the number of notes.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::Note;

/// Direct children of every note, in storage order.
pub struct ChildrenIndex<'a> {
    roots: Vec<&'a Note>,
    by_parent: HashMap<&'a str, Vec<&'a Note>>,
}

impl<'a> ChildrenIndex<'a> {
    pub fn new(notes: &'a [Note]) -> Self {
        let mut roots = Vec::new();
        let mut by_parent: HashMap<&'a str, Vec<&'a Note>> = HashMap::new();
        for note in notes {
            match note.parent_id.as_deref() {
                Some(parent_id) => by_parent.entry(parent_id).or_default().push(note),
                None => roots.push(note),
            }
        }
        Self { roots, by_parent }
    }

    /// Children of `parent_id`, or root notes when `None`.
    #[must_use]
    pub fn children(&self, parent_id: Option<&str>) -> &[&'a Note] {
        match parent_id {
            None => &self.roots,
            Some(id) => self
                .by_parent
                .get(id)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn has_children(&self, id: &str) -> bool {
        !self.children(Some(id)).is_empty()
    }
}

/// Ids of every descendant of `id`, parents before their children.
///
/// Expands one generation at a time until no new children appear. `id`
/// itself is not included.
#[must_use]
pub fn descendant_ids(notes: &[Note], id: &str) -> Vec<String> {
    let index = ChildrenIndex::new(notes);
    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut result = Vec::new();
    let mut frontier = vec![id];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for parent in frontier {
            for child in index.children(Some(parent)) {
                if seen.insert(child.id.as_str()) {
                    result.push(child.id.clone());
                    next.push(child.id.as_str());
                }
            }
        }
        frontier = next;
    }
    result
}

/// Ids of the ancestors of `id`, nearest first. Stops early on a cycle.
#[must_use]
pub fn ancestor_ids(notes: &[Note], id: &str) -> Vec<String> {
    let parents: HashMap<&str, Option<&str>> = notes
        .iter()
        .map(|n| (n.id.as_str(), n.parent_id.as_deref()))
        .collect();

    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut result = Vec::new();
    let mut current = parents.get(id).copied().flatten();
    while let Some(parent) = current {
        if !seen.insert(parent) {
            break;
        }
        result.push(parent.to_string());
        current = parents.get(parent).copied().flatten();
    }
    result
}

/// One visible line in the note explorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub is_folder: bool,
    pub has_children: bool,
    pub expanded: bool,
}

/// Flattens the forest into display rows, depth first, in storage order.
///
/// Children are listed only under notes whose id is in `expanded`.
#[must_use]
pub fn flatten(notes: &[Note], expanded: &HashSet<String>) -> Vec<TreeRow> {
    let index = ChildrenIndex::new(notes);
    let mut rows = Vec::new();
    let mut stack: Vec<(&Note, usize)> = index
        .children(None)
        .iter()
        .rev()
        .map(|note| (*note, 0))
        .collect();

    while let Some((note, depth)) = stack.pop() {
        let has_children = index.has_children(&note.id);
        let is_expanded = expanded.contains(&note.id);
        rows.push(TreeRow {
            id: note.id.clone(),
            title: note.display_title().to_string(),
            depth,
            is_folder: note.is_folder,
            has_children,
            expanded: is_expanded,
        });
        if has_children && is_expanded {
            for child in index.children(Some(&note.id)).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }
    rows
}

/// A violation of the forest invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ForestIssue {
    /// A second note carries an id already in use.
    DuplicateId { id: String },
    /// `parent_id` names a note that does not exist.
    DanglingParent { id: String, parent_id: String },
    /// The note is its own ancestor.
    Cycle { id: String },
}

/// Reports every invariant violation without changing anything.
#[must_use]
pub fn check_forest(notes: &[Note]) -> Vec<ForestIssue> {
    let mut issues = Vec::new();
    let mut ids = HashSet::new();
    for note in notes {
        if !ids.insert(note.id.as_str()) {
            issues.push(ForestIssue::DuplicateId {
                id: note.id.clone(),
            });
        }
    }

    for note in notes {
        if let Some(parent_id) = &note.parent_id {
            if !ids.contains(parent_id.as_str()) {
                issues.push(ForestIssue::DanglingParent {
                    id: note.id.clone(),
                    parent_id: parent_id.clone(),
                });
            }
        }
    }

    let parents = parent_map(notes);
    for note in notes {
        if lies_on_cycle(&parents, &note.id) {
            issues.push(ForestIssue::Cycle {
                id: note.id.clone(),
            });
        }
    }
    issues
}

/// Restores the forest invariants, returning the repaired notes and what was fixed.
///
/// Later duplicates of an id are dropped. Notes with a dangling parent become
/// roots. Each cycle is broken by making its first member in storage order a root.
#[must_use]
pub fn repair_forest(notes: Vec<Note>) -> (Vec<Note>, Vec<ForestIssue>) {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(notes.len());
    for note in notes {
        if seen.insert(note.id.clone()) {
            kept.push(note);
        } else {
            issues.push(ForestIssue::DuplicateId { id: note.id });
        }
    }

    for note in &mut kept {
        let dangling = note
            .parent_id
            .as_ref()
            .filter(|parent_id| !seen.contains(parent_id.as_str()))
            .cloned();
        if let Some(parent_id) = dangling {
            issues.push(ForestIssue::DanglingParent {
                id: note.id.clone(),
                parent_id,
            });
            note.parent_id = None;
        }
    }

    let mut parents: HashMap<String, Option<String>> = kept
        .iter()
        .map(|n| (n.id.clone(), n.parent_id.clone()))
        .collect();
    for note in &mut kept {
        if lies_on_cycle_owned(&parents, &note.id) {
            issues.push(ForestIssue::Cycle {
                id: note.id.clone(),
            });
            note.parent_id = None;
            parents.insert(note.id.clone(), None);
        }
    }

    (kept, issues)
}

fn parent_map(notes: &[Note]) -> HashMap<&str, Option<&str>> {
    notes
        .iter()
        .map(|n| (n.id.as_str(), n.parent_id.as_deref()))
        .collect()
}

fn lies_on_cycle(parents: &HashMap<&str, Option<&str>>, id: &str) -> bool {
    let mut visited = HashSet::new();
    let mut current = parents.get(id).copied().flatten();
    while let Some(parent) = current {
        if parent == id {
            return true;
        }
        if !visited.insert(parent) {
            return false;
        }
        current = parents.get(parent).copied().flatten();
    }
    false
}

fn lies_on_cycle_owned(parents: &HashMap<String, Option<String>>, id: &str) -> bool {
    let mut visited = HashSet::new();
    let mut current = parents.get(id).and_then(Option::as_deref);
    while let Some(parent) = current {
        if parent == id {
            return true;
        }
        if !visited.insert(parent) {
            return false;
        }
        current = parents.get(parent).and_then(Option::as_deref);
    }
    false
}
