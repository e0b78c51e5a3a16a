pub mod cli;
pub mod codec;
pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod logging;
pub mod scheduler;
pub mod search;
pub mod session;
pub mod storage;

pub use config::NoteConfig;
pub use entity::{NoteId, NoteRecord};
pub use error::{Result, StickyNoteError};
pub use session::{Session, SessionState};
pub use storage::NoteStore;
