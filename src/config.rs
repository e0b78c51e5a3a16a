use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name of the note collection inside the data directory.
pub const DATA_FILE_NAME: &str = "StickyNotes_Data.json";

/// Environment variable that overrides the data file location.
pub const DATA_FILE_ENV: &str = "STICKYNOTE_DATA_FILE";

/// Runtime settings for the store and session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    /// Where the note collection is persisted.
    pub data_file: PathBuf,
    /// Quiet period after the last edit before a save runs.
    pub save_debounce_ms: u64,
    /// How long a status message such as "Pinned" stays visible.
    pub status_toast_ms: u64,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            save_debounce_ms: 400,
            status_toast_ms: 1200,
        }
    }
}

impl NoteConfig {
    /// Defaults, with the data file taken from the environment if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(DATA_FILE_ENV).filter(|p| !p.is_empty()) {
            config.data_file = PathBuf::from(path);
        }
        config
    }

    /// Replace the data file, e.g. from `--data-file`.
    pub fn with_data_file(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.data_file = path;
        }
        self
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn status_toast(&self) -> Duration {
        Duration::from_millis(self.status_toast_ms)
    }
}

/// `<user data dir>/StickyNotes_Data.json`, or the current directory when the
/// platform has no data dir.
pub fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_FILE_NAME)
}
