// src/entity/note.rs
use serde::{Deserialize, Serialize};

use super::{NoteId, Position, Size, TextAlignment};
use crate::codec::UNTITLED;

pub const DEFAULT_COLOR: &str = "#E8D096";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_WIDTH: f64 = 300.0;
pub const DEFAULT_HEIGHT: f64 = 300.0;
pub const MIN_FONT_SIZE: f64 = 10.0;
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Named background colours offered by the palette menu.
pub const PALETTE: &[(&str, &str)] = &[
    ("kraft", "#E3C887"),
    ("sakura", "#FFCDD2"),
    ("sky", "#B3E5FC"),
    ("mint", "#DCEDC8"),
    ("paper", "#FFF9C4"),
    ("graphite", "#424242"),
    ("charcoal", "#263238"),
    ("olive", "#3D5B3D"),
];

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

/// One persisted note.
///
/// Every field except `id` has a default so that records written by older
/// builds (or edited by hand) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: NoteId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "default_color")]
    pub background_color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub is_bold: bool,
    #[serde(default)]
    pub is_italic: bool,
    #[serde(default)]
    pub is_underline: bool,
    #[serde(default)]
    pub is_strikethrough: bool,
    #[serde(default)]
    pub text_alignment: TextAlignment,
}

impl NoteRecord {
    /// A fresh, empty note with default geometry and colour.
    pub fn new() -> Self {
        Self {
            id: NoteId::new(),
            title: UNTITLED.to_string(),
            content: String::new(),
            position: Position::default(),
            size: Size::default(),
            is_pinned: false,
            background_color: default_color(),
            opacity: default_opacity(),
            font_size: default_font_size(),
            is_bold: false,
            is_italic: false,
            is_underline: false,
            is_strikethrough: false,
            text_alignment: TextAlignment::default(),
        }
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            title: crate::codec::derive_title(&content),
            content,
            ..Self::new()
        }
    }

    /// Bring opacity and font size back inside their valid ranges.
    ///
    /// The colour is left as stored. Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        if !self.opacity.is_finite() {
            self.opacity = default_opacity();
            changed = true;
        } else if !(0.0..=1.0).contains(&self.opacity) {
            self.opacity = self.opacity.clamp(0.0, 1.0);
            changed = true;
        }

        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            self.font_size = default_font_size();
            changed = true;
        }

        changed
    }
}

impl Default for NoteRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts `#RGB`, `#ARGB`, `#RRGGBB` and `#AARRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_defaults() {
        let note = NoteRecord::new();
        assert_eq!(note.title, "Note");
        assert!(note.content.is_empty());
        assert_eq!(note.size, Size::new(300.0, 300.0));
        assert_eq!(note.background_color, "#E8D096");
        assert_eq!(note.opacity, 1.0);
        assert_eq!(note.font_size, 16.0);
        assert!(!note.is_pinned);
        assert_eq!(note.text_alignment, TextAlignment::Start);
    }

    #[test]
    fn test_with_content_derives_title() {
        let note = NoteRecord::with_content("Groceries\nmilk\neggs");
        assert_eq!(note.title, "Groceries");
    }

    #[test]
    fn test_serialized_field_names() {
        let note = NoteRecord::new();
        let json = serde_json::to_value(&note).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "id",
            "title",
            "content",
            "position",
            "size",
            "isPinned",
            "backgroundColor",
            "opacity",
            "fontSize",
            "isBold",
            "isItalic",
            "isUnderline",
            "isStrikethrough",
            "textAlignment",
        ] {
            assert!(obj.contains_key(key), "missing field {}", key);
        }
        assert_eq!(json["textAlignment"], "start");
        assert_eq!(json["size"]["width"], 300.0);
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let note: NoteRecord = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(note.id.as_str(), "abc");
        assert_eq!(note.title, "");
        assert_eq!(note.opacity, 1.0);
        assert_eq!(note.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(note.background_color, DEFAULT_COLOR);
    }

    #[test]
    fn test_deserialize_requires_id() {
        let result: std::result::Result<NoteRecord, _> = serde_json::from_str(r#"{"title":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_clamps_values() {
        let mut note = NoteRecord::new();
        note.opacity = 1.7;
        note.font_size = -3.0;
        note.background_color = "yellow".to_string();

        assert!(note.normalize());
        assert_eq!(note.opacity, 1.0);
        assert_eq!(note.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(note.background_color, "yellow");
        assert!(!note.normalize());
    }

    #[test]
    fn test_normalize_nan_opacity() {
        let mut note = NoteRecord::new();
        note.opacity = f64::NAN;
        assert!(note.normalize());
        assert_eq!(note.opacity, 1.0);
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#E8D096"));
        assert!(is_hex_color("#80e8d096"));
        assert!(!is_hex_color("E8D096"));
        assert!(is_hex_color("#FFF"));
        assert!(is_hex_color("#8fff"));
        assert!(!is_hex_color("#E8D09"));
        assert!(!is_hex_color("#FF"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_palette_colors_are_valid() {
        for (_, hex) in PALETTE {
            assert!(is_hex_color(hex));
        }
    }
}
