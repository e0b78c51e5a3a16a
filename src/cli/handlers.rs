use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::codec::{plain_text, preview_from_text, RichDocument};
use crate::config::NoteConfig;
use crate::entity::{is_hex_color, NoteId, NoteRecord, PALETTE};
use crate::error::{Result, StickyNoteError};
use crate::export::{
    default_export_dir, note_file_name, render_export_all, render_note_export, write_export,
    ALL_NOTES_FILE,
};
use crate::search;
use crate::session::{DeleteOutcome, HeadlessSurface, Session, SurfaceChange};
use crate::storage::NoteStore;

/// Resolve a user-supplied note reference: a 1-based list index, or an id
/// prefix that matches exactly one note.
pub fn resolve_id(store: &NoteStore, id: &str) -> Result<NoteId> {
    let notes = store.get_all();

    if let Ok(index) = id.parse::<usize>() {
        if let Some(note) = index.checked_sub(1).and_then(|i| notes.get(i)) {
            return Ok(note.id.clone());
        }
    }

    let mut matches = notes.iter().filter(|n| n.id.as_str().starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(note), None) if !id.is_empty() => Ok(note.id.clone()),
        (Some(_), Some(_)) => Err(StickyNoteError::AmbiguousId(id.to_string())),
        _ => Err(StickyNoteError::NoteNotFound(id.to_string())),
    }
}

/// Accept `#RRGGBB` or a palette name.
pub fn resolve_color(value: &str) -> Result<String> {
    let value = value.trim();
    if let Some((_, hex)) = PALETTE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
    {
        return Ok(hex.to_string());
    }
    if is_hex_color(value) {
        return Ok(value.to_uppercase());
    }
    let names: Vec<&str> = PALETTE.iter().map(|(name, _)| *name).collect();
    Err(StickyNoteError::InvalidValue(format!(
        "colour '{}' (use #RRGGBB or one of: {})",
        value,
        names.join(", ")
    )))
}

fn open_session(config: &NoteConfig) -> Result<(NoteStore, Session<HeadlessSurface>)> {
    let mut store = NoteStore::open(config.data_file());
    let mut session = Session::new(HeadlessSurface::new(), config);
    session.start(&mut store, Instant::now())?;
    Ok((store, session))
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

fn pin_marker(note: &NoteRecord) -> &'static str {
    if note.is_pinned {
        "*"
    } else {
        " "
    }
}

pub fn handle_new(
    config: &NoteConfig,
    text: Option<String>,
    stdin: bool,
    color: Option<String>,
    json: bool,
) -> Result<()> {
    let color = color.as_deref().map(resolve_color).transpose()?;
    let text = if stdin { Some(read_stdin()?) } else { text };

    let (mut store, mut session) = open_session(config)?;
    let now = Instant::now();
    let id = session.create_record(&mut store, now)?;

    if let Some(text) = text.filter(|t| !t.is_empty()) {
        let change = SurfaceChange::Content(RichDocument::from_lines(&text));
        session.apply_edit(&mut store, change, now)?;
    }
    if let Some(color) = color {
        session.apply_edit(&mut store, SurfaceChange::Color(color), now)?;
    }
    session.close(&mut store);

    let note = store
        .get(&id)
        .ok_or_else(|| StickyNoteError::NoteNotFound(id.to_string()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("Created note {} ({}) - {}", store.len(), id.short(), note.title);
    }

    Ok(())
}

pub fn handle_list(config: &NoteConfig, json: bool) -> Result<()> {
    let store = NoteStore::open(config.data_file());
    let notes = store.get_all();

    if json {
        println!("{}", serde_json::to_string_pretty(notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes:\n");
        for (i, note) in notes.iter().enumerate() {
            println!("  {:3} ({}) {}{}", i + 1, note.id.short(), pin_marker(note), note.title);
            let preview = preview_from_text(&plain_text(&note.content));
            if !preview.is_empty() {
                println!("        {}", preview);
            }
        }
    }

    Ok(())
}

pub fn handle_show(config: &NoteConfig, id: String, json: bool) -> Result<()> {
    let store = NoteStore::open(config.data_file());
    let id = resolve_id(&store, &id)?;
    let note = store
        .get(&id)
        .ok_or_else(|| StickyNoteError::NoteNotFound(id.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
    } else {
        println!("Note ({})", note.id);
        println!("Title: {}", note.title);
        println!(
            "Window: {}x{} at ({}, {}){}",
            note.size.width,
            note.size.height,
            note.position.x,
            note.position.y,
            if note.is_pinned { ", pinned" } else { "" }
        );
        println!(
            "Style: {} opacity {} font {}pt {}",
            note.background_color, note.opacity, note.font_size, note.text_alignment
        );
        let text = plain_text(&note.content);
        if !text.is_empty() {
            println!("\n{}", text);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    config: &NoteConfig,
    id: String,
    text: Option<String>,
    stdin: bool,
    title: Option<String>,
    color: Option<String>,
    opacity: Option<f64>,
    font_size: Option<f64>,
    pin: bool,
    unpin: bool,
) -> Result<()> {
    let mut changes = Vec::new();
    if stdin {
        changes.push(SurfaceChange::Content(RichDocument::from_lines(&read_stdin()?)));
    } else if let Some(text) = text {
        changes.push(SurfaceChange::Content(RichDocument::from_lines(&text)));
    }
    if let Some(title) = title {
        changes.push(SurfaceChange::Renamed(title));
    }
    if let Some(color) = color {
        changes.push(SurfaceChange::Color(resolve_color(&color)?));
    }
    if let Some(opacity) = opacity {
        changes.push(SurfaceChange::Opacity(opacity));
    }
    if let Some(font_size) = font_size {
        changes.push(SurfaceChange::FontSize(font_size));
    }
    if pin || unpin {
        changes.push(SurfaceChange::Pinned(pin));
    }

    if changes.is_empty() {
        return Err(StickyNoteError::InvalidValue(
            "nothing to change; pass --text, --title, --color, ...".to_string(),
        ));
    }

    let (mut store, mut session) = open_session(config)?;
    let id = resolve_id(&store, &id)?;
    let now = Instant::now();
    session.switch_active(&mut store, &id, now)?;

    // All changes are checked before any is applied, so a bad value leaves the note untouched.
    if let Some(buffer) = session.buffer() {
        let mut trial = buffer.clone();
        for change in &changes {
            if let Err(e) = trial.apply(change.clone()) {
                session.close(&mut store);
                return Err(e);
            }
        }
    }
    let applied = changes
        .into_iter()
        .try_for_each(|change| session.apply_edit(&mut store, change, now).map(|_| ()));
    session.close(&mut store);
    applied?;

    let title = store.get(&id).map(|n| n.title.as_str()).unwrap_or_default();
    println!("Updated note ({}) - {}", id.short(), title);

    Ok(())
}

pub fn handle_delete(config: &NoteConfig, id: String, force: bool) -> Result<()> {
    let (mut store, mut session) = open_session(config)?;
    let id = resolve_id(&store, &id)?;

    // Non-interactive mode without --force, abort
    if !force && !atty::is(atty::Stream::Stdin) {
        return Err(StickyNoteError::Aborted(
            "Use --force to delete in non-interactive mode".to_string(),
        ));
    }

    let now = Instant::now();
    session.switch_active(&mut store, &id, now)?;
    let outcome = session.delete_active(
        &mut store,
        |note| {
            if force {
                return true;
            }
            eprintln!("Delete note ({}) - {}? [y/N] ", note.id.short(), note.title);
            let mut input = String::new();
            io::stdin().read_line(&mut input).is_ok() && input.trim().eq_ignore_ascii_case("y")
        },
        now,
    )?;
    session.close(&mut store);

    match outcome {
        DeleteOutcome::Deleted { deleted, .. } => println!("Deleted note ({})", deleted.short()),
        DeleteOutcome::Declined => println!("Cancelled."),
        DeleteOutcome::NoActiveNote => return Err(StickyNoteError::NoteNotFound(id.to_string())),
    }

    Ok(())
}

pub fn handle_search(config: &NoteConfig, query: String, json: bool) -> Result<()> {
    let store = NoteStore::open(config.data_file());
    let results = search::search(store.get_all(), &query);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        for hit in results {
            println!("  ({}) {}", hit.id.short(), hit.title);
            if !hit.preview.is_empty() {
                println!("      {}", hit.preview);
            }
        }
    }

    Ok(())
}

pub fn handle_export(
    config: &NoteConfig,
    id: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = NoteStore::open(config.data_file());

    let (text, default_name) = match id {
        Some(id) => {
            let id = resolve_id(&store, &id)?;
            let note = store
                .get(&id)
                .ok_or_else(|| StickyNoteError::NoteNotFound(id.to_string()))?;
            (render_note_export(note), note_file_name(&id))
        }
        None => (render_export_all(store.get_all()), ALL_NOTES_FILE.to_string()),
    };

    match output {
        Some(path) if path == Path::new("-") => print!("{}", text),
        Some(path) => {
            write_export(&path, &text)?;
            println!("Exported to: {}", path.display());
        }
        None => {
            let path = default_export_dir().join(default_name);
            write_export(&path, &text)?;
            println!("Exported to: {}", path.display());
        }
    }

    Ok(())
}
