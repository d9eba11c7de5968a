//! Tag normalisation and `#hashtag` discovery in note content.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;
use std::collections::BTreeSet;

static HASHTAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w&#/])#([A-Za-z0-9][A-Za-z0-9_\-]*)").expect("hashtag pattern")
});

/// Normalises a single tag: trims, strips a leading `#`, lower-cases.
///
/// Returns `None` for tags that are empty after normalisation.
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Normalises and deduplicates a list of tags.
pub fn normalize_tags<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|t| normalize_tag(t.as_ref()))
        .collect()
}

/// Collects `#hashtag` tokens from markdown `content`.
///
/// Headings, code spans and code blocks are skipped, so `# Title` or
/// `` `#include` `` never produce tags.
#[must_use]
pub fn extract_hashtags(content: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    let mut code_depth = 0usize;

    for event in TextMergeStream::new(Parser::new(content)) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => code_depth += 1,
            Event::End(TagEnd::CodeBlock) => code_depth = code_depth.saturating_sub(1),
            Event::Text(text) if code_depth == 0 => {
                for caps in HASHTAG.captures_iter(&text) {
                    if let Some(tag) = normalize_tag(&caps[1]) {
                        tags.insert(tag);
                    }
                }
            }
            _ => {}
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags_dedupes_and_lowercases() {
        let tags = normalize_tags(["  Rust  ", "RUST", "#rust", "", "design"]);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["design", "rust"]);
    }

    #[test]
    fn test_extract_hashtags_from_text() {
        let tags = extract_hashtags("Some #Ideas and #todo-list here.\n\n#next line");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["ideas", "next", "todo-list"]
        );
    }

    #[test]
    fn test_headings_are_not_hashtags() {
        let tags = extract_hashtags("# Welcome\n\n## Features\n\nplain text");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_code_is_skipped() {
        let content = "Use `#include` here\n\n```\n#define X\n```\n\nbut #real";
        let tags = extract_hashtags(content);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["real"]);
    }

    #[test]
    fn test_mid_word_hash_is_ignored() {
        let tags = extract_hashtags("C# and a&#39;b are not tags");
        assert!(tags.is_empty());
    }
}
