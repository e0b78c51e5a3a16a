use serde::{Deserialize, Serialize};

/// Paragraph alignment of a note.
///
/// Older data files used `Left`/`Right`/`Justify`; those are accepted on read
/// and written back in the current form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    #[serde(alias = "Start", alias = "Left", alias = "left", alias = "Justify", alias = "justify")]
    Start,
    #[serde(alias = "Center")]
    Center,
    #[serde(alias = "End", alias = "Right", alias = "right")]
    End,
}

impl std::fmt::Display for TextAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextAlignment::Start => write!(f, "start"),
            TextAlignment::Center => write!(f, "center"),
            TextAlignment::End => write!(f, "end"),
        }
    }
}

impl std::str::FromStr for TextAlignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" | "left" | "justify" => Ok(TextAlignment::Start),
            "center" | "centre" => Ok(TextAlignment::Center),
            "end" | "right" => Ok(TextAlignment::End),
            _ => Err(format!("Invalid alignment: {}", s)),
        }
    }
}
