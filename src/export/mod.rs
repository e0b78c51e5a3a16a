//! Plain-text export of one note or the whole collection.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::codec::plain_text;
use crate::entity::{NoteId, NoteRecord};
use crate::error::Result;

/// File name used when exporting every note.
pub const ALL_NOTES_FILE: &str = "StickyNotes_All.txt";

/// `(id, content)` pairs in collection order. Content is the stored string.
pub fn export_all(notes: &[NoteRecord]) -> Vec<(NoteId, String)> {
    notes
        .iter()
        .map(|note| (note.id.clone(), note.content.clone()))
        .collect()
}

/// One `[id]` header block per note, separated by blank lines.
pub fn render_export_all(notes: &[NoteRecord]) -> String {
    notes
        .iter()
        .map(|note| format!("[{}]\n{}\n", note.id, plain_text(&note.content)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The plain text of a single note.
pub fn render_note_export(note: &NoteRecord) -> String {
    plain_text(&note.content)
}

pub fn note_file_name(id: &NoteId) -> String {
    format!("StickyNote_{}.txt", id)
}

/// Directory exports go to when no path is given: the desktop, else the
/// current directory.
pub fn default_export_dir() -> PathBuf {
    dirs::desktop_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn write_export(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    info!(path = %path.display(), bytes = text.len(), "Exported notes");
    Ok(())
}
