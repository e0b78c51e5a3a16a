//! Search over note titles and text.

use serde::Serialize;

use crate::codec::{plain_text, preview_from_text};
use crate::entity::{NoteId, NoteRecord};

/// Parsed search filter from query string.
///
/// Filters are written in the query with a prefix:
/// - `pinned:true` / `pinned:false` - only pinned or unpinned notes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchFilter {
    pub pinned: Option<bool>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_none()
    }

    fn matches(&self, note: &NoteRecord) -> bool {
        self.pinned.map_or(true, |pinned| note.is_pinned == pinned)
    }
}

/// A note matching a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Id of the matching note.
    pub id: NoteId,
    /// The note's title.
    pub title: String,
    /// Text after the first line, shortened.
    pub preview: String,
}

/// Parse a raw query string into (remaining query text, filters).
///
/// # Examples
///
/// ```ignore
/// let (query, filter) = parse_query("pinned:true groceries");
/// assert_eq!(query, "groceries");
/// assert_eq!(filter.pinned, Some(true));
/// ```
pub fn parse_query(raw: &str) -> (String, SearchFilter) {
    let mut filter = SearchFilter::default();
    let mut remaining = Vec::new();

    for token in raw.split_whitespace() {
        match token.strip_prefix("pinned:").map(parse_bool) {
            Some(Some(value)) => filter.pinned = Some(value),
            _ => remaining.push(token),
        }
    }

    (remaining.join(" "), filter)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Case-insensitive substring search over each note's title and full text.
///
/// An empty query matches every note. Results keep collection order.
pub fn search(notes: &[NoteRecord], raw_query: &str) -> Vec<SearchHit> {
    let (query, filter) = parse_query(raw_query);
    let needle = query.to_lowercase();

    notes
        .iter()
        .filter(|note| filter.matches(note))
        .filter_map(|note| {
            let text = plain_text(&note.content);
            let hit = needle.is_empty()
                || note.title.to_lowercase().contains(&needle)
                || text.to_lowercase().contains(&needle);
            hit.then(|| SearchHit {
                id: note.id.clone(),
                title: note.title.clone(),
                preview: preview_from_text(&text),
            })
        })
        .collect()
}
