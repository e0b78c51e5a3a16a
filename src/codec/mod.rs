//! Document codec: rich-document model and its storage string form.
//!
//! Note content is stored as an opaque string. New content is written as
//! compact JSON starting with [`DOCUMENT_PREFIX`]; anything else (including
//! content written before rich text existed) is treated as plain text.
//! Decoding never fails: unreadable content is shown as a single plain
//! paragraph so a damaged note can still be opened and fixed.

mod text;

pub use text::{
    derive_preview, derive_title, plain_text, preview_from_text, title_from_text,
    PREVIEW_MAX_CHARS, TITLE_MAX_CHARS, UNTITLED,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::TextAlignment;

/// Structural prefix that marks an encoded rich document.
pub const DOCUMENT_PREFIX: &str = "{\"RichDocument\"";

/// A styled span of text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Run {
    /// Text of the span, without line breaks.
    pub text: String,
    /// Bold weight.
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    /// Italic style.
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    /// Underlined.
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    /// Struck through.
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    /// Size override in points. `None` uses the note's font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One line of a document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Horizontal alignment of the line.
    #[serde(default)]
    pub alignment: TextAlignment,
    /// Spans in display order.
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            alignment: TextAlignment::default(),
            runs: vec![Run::plain(text)],
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// In-memory rich document as edited by the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichDocument {
    #[serde(default)]
    pub blocks: Vec<Paragraph>,
}

impl Default for RichDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl RichDocument {
    /// A document holding one empty paragraph.
    pub fn empty() -> Self {
        Self {
            blocks: vec![Paragraph::plain("")],
        }
    }

    /// Wrap a raw string as a single unformatted paragraph.
    pub fn from_plain(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![Paragraph::plain(text)],
        }
    }

    /// One paragraph per line of `text`.
    pub fn from_lines(text: &str) -> Self {
        let blocks: Vec<Paragraph> = text.lines().map(Paragraph::plain).collect();
        if blocks.is_empty() {
            return Self::empty();
        }
        Self { blocks }
    }

    /// Paragraph texts joined with newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.blocks
            .iter()
            .all(|p| p.runs.iter().all(|r| r.text.trim().is_empty()))
    }
}

#[derive(Serialize, Deserialize)]
enum Envelope {
    RichDocument(RichDocument),
}

#[derive(Serialize)]
enum EnvelopeRef<'a> {
    RichDocument(&'a RichDocument),
}

/// Serialize a document to its storage string.
///
/// Falls back to the extracted plain text if serialization fails.
pub fn encode(document: &RichDocument) -> String {
    match serde_json::to_string(&EnvelopeRef::RichDocument(document)) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!(error = %e, "Failed to encode document, storing plain text");
            document.plain_text()
        }
    }
}

/// True if `content` carries the rich-document prefix.
pub fn is_rich(content: &str) -> bool {
    content.trim_start().starts_with(DOCUMENT_PREFIX)
}

/// Parse a storage string back into a document.
///
/// Empty content gives an empty document, plain text is wrapped as one
/// paragraph, and a rich document that fails to parse is wrapped verbatim.
pub fn decode(content: &str) -> RichDocument {
    if content.is_empty() {
        return RichDocument::empty();
    }

    if !is_rich(content) {
        return RichDocument::from_plain(content);
    }

    match serde_json::from_str::<Envelope>(content.trim()) {
        Ok(Envelope::RichDocument(doc)) if !doc.blocks.is_empty() => doc,
        Ok(Envelope::RichDocument(_)) => RichDocument::empty(),
        Err(e) => {
            warn!(error = %e, "Unreadable rich document, showing raw content");
            RichDocument::from_plain(content)
        }
    }
}
