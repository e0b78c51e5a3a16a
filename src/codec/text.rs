//! Title and preview derivation for list and search views.

use super::decode;

/// Title used when a note has no text.
pub const UNTITLED: &str = "Note";
pub const TITLE_MAX_CHARS: usize = 15;
pub const PREVIEW_MAX_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Plain text of stored content, whatever its encoding.
pub fn plain_text(content: &str) -> String {
    decode(content).plain_text()
}

/// First non-empty line of the note, cut to [`TITLE_MAX_CHARS`].
pub fn derive_title(content: &str) -> String {
    title_from_text(&plain_text(content))
}

/// Everything after the title line, flattened to one line and cut to
/// [`PREVIEW_MAX_CHARS`].
pub fn derive_preview(content: &str) -> String {
    preview_from_text(&plain_text(content))
}

pub fn title_from_text(text: &str) -> String {
    match non_empty_lines(text).next() {
        Some(line) => truncate(line, TITLE_MAX_CHARS),
        None => UNTITLED.to_string(),
    }
}

pub fn preview_from_text(text: &str) -> String {
    let rest: Vec<&str> = non_empty_lines(text).skip(1).collect();
    if rest.is_empty() {
        return String::new();
    }
    truncate(&rest.join(" "), PREVIEW_MAX_CHARS)
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}{}", &s[..idx], ELLIPSIS),
        None => s.to_string(),
    }
}
