use crate::codec::{self, title_from_text, RichDocument};
use crate::entity::{
    is_hex_color, NoteRecord, Position, Size, TextAlignment, MAX_FONT_SIZE, MIN_FONT_SIZE,
};
use crate::error::{Result, StickyNoteError};

/// The UI collaborator that displays one note at a time.
pub trait EditSurface {
    /// Show `state`.
    ///
    /// Toolkits usually raise change events while fields are assigned
    /// programmatically; return those here so the session can drop them.
    fn present(&mut self, state: &SurfaceState) -> Vec<SurfaceChange>;

    /// Show the "no note" placeholder.
    fn clear(&mut self);
}

/// A surface with no UI. Keeps whatever was last presented.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    shown: Option<SurfaceState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Option<&SurfaceState> {
        self.shown.as_ref()
    }
}

impl EditSurface for HeadlessSurface {
    fn present(&mut self, state: &SurfaceState) -> Vec<SurfaceChange> {
        self.shown = Some(state.clone());
        Vec::new()
    }

    fn clear(&mut self) {
        self.shown = None;
    }
}

/// A change notification from the edit surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceChange {
    Content(RichDocument),
    Moved(Position),
    Resized(Size),
    Pinned(bool),
    Color(String),
    Opacity(f64),
    FontSize(f64),
    Bold(bool),
    Italic(bool),
    Underline(bool),
    Strikethrough(bool),
    Alignment(TextAlignment),
    /// User-chosen title. Blank reverts to the title derived from the text.
    Renamed(String),
}

/// The edit buffer: what the surface currently shows for the active note.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    /// The note's text as it is being edited.
    pub document: RichDocument,
    /// Shown title, either derived from the first line or set by the user.
    pub title: String,
    /// Window top-left corner.
    pub position: Position,
    /// Window width and height.
    pub size: Size,
    /// Keep the window above other windows.
    pub is_pinned: bool,
    /// `#`-prefixed hex colour.
    pub background_color: String,
    /// Window opacity, 0.0 to 1.0.
    pub opacity: f64,
    /// Default font size in points.
    pub font_size: f64,
    /// Bold toggle for newly typed text.
    pub is_bold: bool,
    /// Italic toggle for newly typed text.
    pub is_italic: bool,
    /// Underline toggle for newly typed text.
    pub is_underline: bool,
    /// Strikethrough toggle for newly typed text.
    pub is_strikethrough: bool,
    /// Alignment applied to new paragraphs.
    pub text_alignment: TextAlignment,
}

impl SurfaceState {
    pub fn from_record(record: &NoteRecord) -> Self {
        Self {
            document: codec::decode(&record.content),
            title: record.title.clone(),
            position: record.position,
            size: record.size,
            is_pinned: record.is_pinned,
            background_color: record.background_color.clone(),
            opacity: record.opacity,
            font_size: record.font_size,
            is_bold: record.is_bold,
            is_italic: record.is_italic,
            is_underline: record.is_underline,
            is_strikethrough: record.is_strikethrough,
            text_alignment: record.text_alignment,
        }
    }

    /// Copy the buffer into `record`, encoding the document.
    pub fn write_into(&self, record: &mut NoteRecord) {
        record.content = codec::encode(&self.document);
        record.title = self.title.clone();
        record.position = self.position;
        record.size = self.size;
        record.is_pinned = self.is_pinned;
        record.background_color = self.background_color.clone();
        record.opacity = self.opacity;
        record.font_size = self.font_size;
        record.is_bold = self.is_bold;
        record.is_italic = self.is_italic;
        record.is_underline = self.is_underline;
        record.is_strikethrough = self.is_strikethrough;
        record.text_alignment = self.text_alignment;
    }

    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Apply one change, validating its value.
    ///
    /// A content change re-derives the title unless the user renamed the note.
    pub fn apply(&mut self, change: SurfaceChange) -> Result<()> {
        match change {
            SurfaceChange::Content(document) => {
                let derived_before = title_from_text(&self.document.plain_text());
                let title_is_derived = self.title == derived_before || self.title.trim().is_empty();
                self.document = document;
                if title_is_derived {
                    self.title = title_from_text(&self.document.plain_text());
                }
            }
            SurfaceChange::Moved(position) => {
                if !position.x.is_finite() || !position.y.is_finite() {
                    return Err(StickyNoteError::InvalidValue(format!(
                        "position ({}, {})",
                        position.x, position.y
                    )));
                }
                self.position = position;
            }
            SurfaceChange::Resized(size) => {
                if !(size.width.is_finite() && size.height.is_finite())
                    || size.width <= 0.0
                    || size.height <= 0.0
                {
                    return Err(StickyNoteError::InvalidValue(format!(
                        "size {}x{}",
                        size.width, size.height
                    )));
                }
                self.size = size;
            }
            SurfaceChange::Pinned(pinned) => self.is_pinned = pinned,
            SurfaceChange::Color(color) => {
                if !is_hex_color(&color) {
                    return Err(StickyNoteError::InvalidValue(format!(
                        "colour '{}' (expected #RRGGBB)",
                        color
                    )));
                }
                self.background_color = color;
            }
            SurfaceChange::Opacity(opacity) => {
                if !opacity.is_finite() {
                    return Err(StickyNoteError::InvalidValue(format!("opacity {}", opacity)));
                }
                self.opacity = opacity.clamp(0.0, 1.0);
            }
            SurfaceChange::FontSize(size) => {
                if !size.is_finite() || size <= 0.0 {
                    return Err(StickyNoteError::InvalidValue(format!("font size {}", size)));
                }
                self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            }
            SurfaceChange::Bold(on) => self.is_bold = on,
            SurfaceChange::Italic(on) => self.is_italic = on,
            SurfaceChange::Underline(on) => self.is_underline = on,
            SurfaceChange::Strikethrough(on) => self.is_strikethrough = on,
            SurfaceChange::Alignment(alignment) => self.text_alignment = alignment,
            SurfaceChange::Renamed(title) => {
                let title = title.trim();
                self.title = if title.is_empty() {
                    title_from_text(&self.document.plain_text())
                } else {
                    title.to_string()
                };
            }
        }
        Ok(())
    }
}
