//! Reference extraction, link resolution and backlinks.
//!
//! Note content can reference other notes through several bracket dialects.
//! Extraction runs one matcher per dialect in [`LinkKind::PRECEDENCE`] order;
//! the first dialect to match a character span claims it and later dialects
//! may not match anything overlapping a claimed span. Text inside markdown
//! code spans and code blocks is never scanned.
//!
//! Nothing here is cached. Every query re-extracts from the live content so a
//! rename takes effect on the very next call.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

use crate::Note;

/// Longest excerpt returned in a [`BacklinkSummary`], in characters.
const EXCERPT_CHARS: usize = 80;

/// The bracket dialect a reference was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    /// `[text](#note-id)`, resolved by id.
    MarkdownRef,
    /// `(-::- Title -::-)`
    Priority,
    /// `[[Title]]`
    Wiki,
    /// `[Title]` not followed by `(`.
    Quick,
    /// `-x- Title -x-`
    Cross,
    /// `+ Title` up to the end of the line.
    Additive,
    /// `= Title` up to the end of the line.
    Equivalent,
    /// `/ Title /`
    Alternate,
    /// `// Title //`
    Commentary,
}

impl LinkKind {
    /// Claiming order: earlier dialects win overlapping spans.
    pub const PRECEDENCE: [LinkKind; 9] = [
        LinkKind::MarkdownRef,
        LinkKind::Priority,
        LinkKind::Wiki,
        LinkKind::Quick,
        LinkKind::Cross,
        LinkKind::Additive,
        LinkKind::Equivalent,
        LinkKind::Alternate,
        LinkKind::Commentary,
    ];

    /// Whether the target text is a note id rather than a title.
    #[must_use]
    pub fn resolves_by_id(self) -> bool {
        matches!(self, LinkKind::MarkdownRef)
    }

    /// CSS class the front-end uses to style resolved links of this kind.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            LinkKind::MarkdownRef => "reference-link",
            LinkKind::Priority => "priority-link",
            LinkKind::Wiki => "wiki-link",
            LinkKind::Quick => "quick-link",
            LinkKind::Cross => "cross-link",
            LinkKind::Additive => "additive-link",
            LinkKind::Equivalent => "equivalent-link",
            LinkKind::Alternate => "alternate-link",
            LinkKind::Commentary => "commentary-link",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            LinkKind::MarkdownRef => &*MARKDOWN_REF,
            LinkKind::Priority => &*PRIORITY,
            LinkKind::Wiki => &*WIKI,
            LinkKind::Quick => &*QUICK,
            LinkKind::Cross => &*CROSS,
            LinkKind::Additive => &*ADDITIVE,
            LinkKind::Equivalent => &*EQUIVALENT,
            LinkKind::Alternate => &*ALTERNATE,
            LinkKind::Commentary => &*COMMENTARY,
        }
    }

    /// Capture group holding the target text.
    fn target_group(self) -> usize {
        match self {
            LinkKind::MarkdownRef => 2,
            _ => 1,
        }
    }
}

static MARKDOWN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]\n]*)\]\(#([^)\s]+)\)").expect("markdown ref pattern"));
static PRIORITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(-::-\s*(.*?)\s*-::-\)").expect("priority pattern"));
static WIKI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("wiki pattern"));
static QUICK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]\n]*)\]").expect("quick pattern"));
static CROSS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-x-\s*(.*?)\s*-x-").expect("cross pattern"));
static ADDITIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+\s+([^\n]+)").expect("additive pattern"));
static EQUIVALENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\s+([^\n]+)").expect("equivalent pattern"));
static ALTERNATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\s*(.*?)\s*/").expect("alternate pattern"));
static COMMENTARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*(.*?)\s*//").expect("commentary pattern"));

/// An outgoing reference found in note content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// The full matched text, delimiters included.
    pub raw: String,
    /// Trimmed title (or id, for [`LinkKind::MarkdownRef`]) the reference points at.
    pub target: String,
    pub kind: LinkKind,
    /// Byte offset of the match start in the content.
    pub start: usize,
    /// Byte offset one past the match end.
    pub end: usize,
}

impl Reference {
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A reference paired with the note it resolves to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReference {
    pub reference: Reference,
    /// `None` for a dangling reference.
    pub note_id: Option<String>,
}

/// A note that links to another, with a short excerpt around the link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklinkSummary {
    pub id: String,
    pub title: String,
    pub excerpt: String,
}

/// A piece of content split for inline rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineSegment {
    Text { text: String },
    Link { reference: Reference, note_id: Option<String> },
}

/// Scans `content` for references in every dialect.
///
/// The result is ordered by start offset, and no two references overlap.
/// Empty targets (`[]`, `[[ ]]`) are ignored.
///
/// A candidate that overlaps code or an already claimed span is dropped and
/// the dialect rescans from the character after its opening position, so a
/// real reference whose delimiter the candidate swallowed is still found.
#[must_use]
pub fn extract_references(content: &str) -> Vec<Reference> {
    let shielded = code_ranges(content);
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut references = Vec::new();

    for kind in LinkKind::PRECEDENCE {
        let pattern = kind.pattern();
        let mut pos = 0;

        while pos <= content.len() {
            let Some(caps) = pattern.captures_at(content, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else { break };
            let span = whole.range();

            if overlaps_any(&span, &shielded) || overlaps_any(&span, &claimed) {
                pos = next_boundary(content, span.start);
                continue;
            }

            if kind == LinkKind::Quick && content[span.end..].starts_with('(') {
                pos = next_boundary(content, span.start);
                continue;
            }

            // An empty pair (`//`, `[]`) is still a whole token; skip past it.
            pos = span.end.max(next_boundary(content, span.start));

            let target = caps
                .get(kind.target_group())
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            if target.is_empty() {
                continue;
            }

            claimed.push(span.clone());
            references.push(Reference {
                raw: whole.as_str().to_string(),
                target: target.to_string(),
                kind,
                start: span.start,
                end: span.end,
            });
        }
    }

    references.sort_by_key(|r| r.start);
    references
}

/// Byte offset of the character after the one starting at `at`.
fn next_boundary(content: &str, at: usize) -> usize {
    at + content[at..].chars().next().map_or(1, char::len_utf8)
}

fn overlaps_any(span: &Range<usize>, others: &[Range<usize>]) -> bool {
    others
        .iter()
        .any(|other| span.start < other.end && other.start < span.end)
}

/// Byte ranges of inline code spans and code blocks.
fn code_ranges(content: &str) -> Vec<Range<usize>> {
    Parser::new(content)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// Lookup tables over one snapshot of the note collection.
///
/// Titles match case-insensitively against non-folder notes; when several
/// notes share a title the first in storage order wins. Ids match exactly
/// against every note.
pub struct LinkIndex<'a> {
    by_title: HashMap<String, &'a Note>,
    by_id: HashMap<&'a str, &'a Note>,
}

impl<'a> LinkIndex<'a> {
    pub fn new(notes: &'a [Note]) -> Self {
        let mut by_title = HashMap::new();
        let mut by_id = HashMap::new();
        for note in notes {
            by_id.entry(note.id.as_str()).or_insert(note);
            if !note.is_folder {
                by_title.entry(note.title.to_lowercase()).or_insert(note);
            }
        }
        Self { by_title, by_id }
    }

    /// Resolves a raw target of the given kind.
    #[must_use]
    pub fn resolve_target(&self, target: &str, kind: LinkKind) -> Option<&'a Note> {
        if kind.resolves_by_id() {
            self.by_id.get(target).copied()
        } else {
            self.by_title.get(&target.trim().to_lowercase()).copied()
        }
    }

    #[must_use]
    pub fn resolve(&self, reference: &Reference) -> Option<&'a Note> {
        self.resolve_target(&reference.target, reference.kind)
    }

    /// Extracts and resolves every reference in `content`.
    #[must_use]
    pub fn resolve_all(&self, content: &str) -> Vec<ResolvedReference> {
        extract_references(content)
            .into_iter()
            .map(|reference| {
                let note_id = self.resolve(&reference).map(|n| n.id.clone());
                ResolvedReference { reference, note_id }
            })
            .collect()
    }
}

/// Resolves a single target against `notes`.
#[must_use]
pub fn resolve<'a>(target: &str, kind: LinkKind, notes: &'a [Note]) -> Option<&'a Note> {
    LinkIndex::new(notes).resolve_target(target, kind)
}

/// Returns every other note whose content references `note_id`, in storage order.
#[must_use]
pub fn backlinks_of<'a>(note_id: &str, notes: &'a [Note]) -> Vec<&'a Note> {
    let index = LinkIndex::new(notes);
    notes
        .iter()
        .filter(|source| source.id != note_id)
        .filter(|source| first_reference_to(&index, &source.content, note_id).is_some())
        .collect()
}

/// Like [`backlinks_of`], with an excerpt of the line holding the first link.
#[must_use]
pub fn backlink_summaries(note_id: &str, notes: &[Note]) -> Vec<BacklinkSummary> {
    let index = LinkIndex::new(notes);
    notes
        .iter()
        .filter(|source| source.id != note_id)
        .filter_map(|source| {
            let reference = first_reference_to(&index, &source.content, note_id)?;
            Some(BacklinkSummary {
                id: source.id.clone(),
                title: source.display_title().to_string(),
                excerpt: excerpt_around(&source.content, reference.start),
            })
        })
        .collect()
}

fn first_reference_to(index: &LinkIndex<'_>, content: &str, note_id: &str) -> Option<Reference> {
    extract_references(content)
        .into_iter()
        .find(|r| index.resolve(r).is_some_and(|n| n.id == note_id))
}

fn excerpt_around(content: &str, offset: usize) -> String {
    let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = content[offset..]
        .find('\n')
        .map_or(content.len(), |i| offset + i);
    let line = content[line_start..line_end].trim();

    if line.chars().count() <= EXCERPT_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

/// References in `content` that resolve to no note.
///
/// The UI offers to create a note from each one's `target`.
#[must_use]
pub fn dangling_references(content: &str, notes: &[Note]) -> Vec<Reference> {
    let index = LinkIndex::new(notes);
    extract_references(content)
        .into_iter()
        .filter(|r| index.resolve(r).is_none())
        .collect()
}

/// Splits `content` into plain text and link segments for inline rendering.
#[must_use]
pub fn inline_segments(content: &str, notes: &[Note]) -> Vec<InlineSegment> {
    let index = LinkIndex::new(notes);
    let mut segments = Vec::new();
    let mut cursor = 0;

    for reference in extract_references(content) {
        if reference.start > cursor {
            segments.push(InlineSegment::Text {
                text: content[cursor..reference.start].to_string(),
            });
        }
        cursor = reference.end;
        let note_id = index.resolve(&reference).map(|n| n.id.clone());
        segments.push(InlineSegment::Link { reference, note_id });
    }

    if cursor < content.len() {
        segments.push(InlineSegment::Text {
            text: content[cursor..].to_string(),
        });
    }
    segments
}

/// Rewrites each reference span with the string returned by `replace`.
///
/// Spans are spliced from the highest offset down, so pending offsets stay
/// valid. Returning `None` leaves that span untouched.
pub fn rewrite_references<F>(content: &str, notes: &[Note], mut replace: F) -> String
where
    F: FnMut(&Reference, Option<&Note>) -> Option<String>,
{
    let index = LinkIndex::new(notes);
    let mut output = content.to_string();

    for reference in extract_references(content).iter().rev() {
        if let Some(replacement) = replace(reference, index.resolve(reference)) {
            output.replace_range(reference.span(), &replacement);
        }
    }
    output
}
