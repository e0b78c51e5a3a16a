use thiserror::Error;

#[derive(Error, Debug)]
pub enum StickyNoteError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Ambiguous note id '{0}'. Use more characters.")]
    AmbiguousId(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("{0}")]
    Aborted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StickyNoteError>;
