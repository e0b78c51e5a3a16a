use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::derive_title;
use crate::entity::{NoteId, NoteRecord};
use crate::error::Result;

/// The live collection of notes and the single file it is persisted to.
///
/// The in-memory collection is authoritative between saves. Every save
/// rewrites the whole file through a temp file and an atomic rename, keeping
/// the previous version next to it as `<path>.bak`.
pub struct NoteStore {
    notes: Vec<NoteRecord>,
    last_deleted: Option<NoteRecord>,
    path: PathBuf,
}

impl NoteStore {
    /// Create an empty store bound to `path` without reading it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            notes: Vec::new(),
            last_deleted: None,
            path: path.into(),
        }
    }

    /// Create a store and load whatever is persisted at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn temp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".tmp")
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".bak")
    }

    /// Replace the live collection with the persisted one.
    ///
    /// A missing or unreadable file loads as an empty collection. Records
    /// sharing an id collapse to the last one in file order.
    pub fn load(&mut self) -> &[NoteRecord] {
        self.notes = read_notes(&self.path);
        info!(path = %self.path.display(), count = self.notes.len(), "Loaded notes");
        &self.notes
    }

    /// Append a note and save immediately.
    pub fn add(&mut self, record: NoteRecord) {
        debug!(note_id = %record.id, "Adding note");
        self.notes.push(record);
        self.save();
    }

    /// Remove the note with `id`, keeping it as the last-deleted note, and
    /// save immediately.
    ///
    /// Returns false if no note had that id; the save still happens.
    pub fn remove(&mut self, id: &NoteId) -> bool {
        let removed = match self.notes.iter().position(|n| &n.id == id) {
            Some(idx) => {
                let record = self.notes.remove(idx);
                debug!(note_id = %record.id, "Removed note");
                self.last_deleted = Some(record);
                true
            }
            None => {
                debug!(note_id = %id, "Remove requested for unknown note");
                false
            }
        };
        self.save();
        removed
    }

    /// Re-append the last deleted note and save.
    ///
    /// The slot is kept, so calling this again appends the same note again.
    pub fn restore_last_deleted(&mut self) -> bool {
        let record = match &self.last_deleted {
            Some(record) => record.clone(),
            None => return false,
        };
        info!(note_id = %record.id, "Restoring last deleted note");
        self.notes.push(record);
        self.save();
        true
    }

    pub fn last_deleted(&self) -> Option<&NoteRecord> {
        self.last_deleted.as_ref()
    }

    /// Read-only view of the live collection.
    pub fn get_all(&self) -> &[NoteRecord] {
        &self.notes
    }

    pub fn get(&self, id: &NoteId) -> Option<&NoteRecord> {
        self.notes.iter().find(|n| &n.id == id)
    }

    pub fn get_mut(&mut self, id: &NoteId) -> Option<&mut NoteRecord> {
        self.notes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Persist the live collection, logging and swallowing any failure.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to save notes, keeping in-memory state"
            );
        }
    }

    /// Persist the live collection.
    ///
    /// 1. write `<path>.tmp` and flush it to disk
    /// 2. if `<path>` exists, keep it as `<path>.bak` and rename the temp file over it
    /// 3. otherwise rename the temp file into place
    pub fn try_save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.notes)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        write_synced(&temp, json.as_bytes())?;

        let installed = if self.path.exists() {
            replace_with_backup(&temp, &self.path, &self.backup_path())
        } else {
            fs::rename(&temp, &self.path)
        };

        if let Err(e) = installed {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        debug!(
            path = %self.path.display(),
            count = self.notes.len(),
            bytes = json.len(),
            "Saved notes"
        );
        Ok(())
    }
}

fn read_notes(path: &Path) -> Vec<NoteRecord> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No notes file yet");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read notes file");
            return Vec::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&json) {
        Ok(values) => values,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Notes file is not a JSON array, ignoring it"
            );
            return Vec::new();
        }
    };

    let mut notes: Vec<NoteRecord> = Vec::with_capacity(values.len());
    let mut index: HashMap<NoteId, usize> = HashMap::new();

    for (position, value) in values.into_iter().enumerate() {
        let mut note: NoteRecord = match serde_json::from_value(value) {
            Ok(note) => note,
            Err(e) => {
                warn!(position, error = %e, "Skipping unreadable note record");
                continue;
            }
        };

        note.normalize();
        if note.title.trim().is_empty() {
            note.title = derive_title(&note.content);
        }

        match index.get(&note.id) {
            Some(&existing) => {
                debug!(note_id = %note.id, "Duplicate note id, keeping the later record");
                notes[existing] = note;
            }
            None => {
                index.insert(note.id.clone(), notes.len());
                notes.push(note);
            }
        }
    }

    notes
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Install `temp` as `target`, keeping the old target as `backup`.
///
/// The backup is taken as a hard link (or copy) before the rename, so
/// `target` itself always names either the old or the new file.
fn replace_with_backup(temp: &Path, target: &Path, backup: &Path) -> io::Result<()> {
    match fs::remove_file(backup) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Err(e) = fs::hard_link(target, backup) {
        debug!(error = %e, "Hard link for backup failed, copying instead");
        fs::copy(target, backup)?;
    }

    fs::rename(temp, target)
}
