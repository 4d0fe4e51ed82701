//! Block formats, list kinds and the format state shown on the toolbar.

use serde::{Deserialize, Serialize};

/// Block format applied by the heading picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockFormat {
    #[default]
    Paragraph,
    Heading(u8),
}

impl BlockFormat {
    pub const ALL: [BlockFormat; 7] = [
        BlockFormat::Paragraph,
        BlockFormat::Heading(1),
        BlockFormat::Heading(2),
        BlockFormat::Heading(3),
        BlockFormat::Heading(4),
        BlockFormat::Heading(5),
        BlockFormat::Heading(6),
    ];

    pub fn tag(self) -> &'static str {
        match self {
            BlockFormat::Paragraph => "p",
            BlockFormat::Heading(1) => "h1",
            BlockFormat::Heading(2) => "h2",
            BlockFormat::Heading(3) => "h3",
            BlockFormat::Heading(4) => "h4",
            BlockFormat::Heading(5) => "h5",
            BlockFormat::Heading(_) => "h6",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(BlockFormat::Paragraph),
            "h1" => Some(BlockFormat::Heading(1)),
            "h2" => Some(BlockFormat::Heading(2)),
            "h3" => Some(BlockFormat::Heading(3)),
            "h4" => Some(BlockFormat::Heading(4)),
            "h5" => Some(BlockFormat::Heading(5)),
            "h6" => Some(BlockFormat::Heading(6)),
            _ => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            BlockFormat::Paragraph => "Paragraph".to_string(),
            BlockFormat::Heading(level) => format!("Heading {}", level.clamp(1, 6)),
        }
    }
}

pub fn is_heading_tag(tag: &str) -> bool {
    matches!(BlockFormat::from_tag(tag), Some(BlockFormat::Heading(_)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Ordered => "ol",
            ListKind::Unordered => "ul",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ol" => Some(ListKind::Ordered),
            "ul" => Some(ListKind::Unordered),
            _ => None,
        }
    }
}

/// Formatting at the cursor or across the selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub ordered_list: bool,
    pub unordered_list: bool,
    pub block: BlockFormat,
    /// Font family with any quoting removed.
    pub font_family: Option<String>,
    pub link: Option<String>,
}

/// Strip the quotes some environments put around font names.
pub fn unquote_font_family(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}
