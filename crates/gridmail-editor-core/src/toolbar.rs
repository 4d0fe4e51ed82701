//! Toolbar view state: format indicators, popovers and picker options.

use serde::{Deserialize, Serialize};

use crate::format::{BlockFormat, FormatState};

/// URL field default. A link or button confirmed with it is not applied.
pub const DEFAULT_LINK_URL: &str = "https://";

/// Email-safe font families offered by the font picker, as (label, value).
pub const FONT_FAMILIES: [(&str, &str); 8] = [
    ("Arial", "Arial, Helvetica, sans-serif"),
    ("Georgia", "Georgia, serif"),
    ("Helvetica", "Helvetica, Arial, sans-serif"),
    ("Tahoma", "Tahoma, Geneva, sans-serif"),
    ("Times New Roman", "Times New Roman, Times, serif"),
    ("Trebuchet MS", "Trebuchet MS, sans-serif"),
    ("Verdana", "Verdana, Geneva, sans-serif"),
    ("Courier New", "Courier New, Courier, monospace"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Popover {
    Link,
    Button,
    Placeholder,
    Heading,
    Font,
}

impl Popover {
    /// Whether the popover applies a command later and so needs the
    /// selection saved while it is open.
    pub fn needs_snapshot(self) -> bool {
        matches!(self, Popover::Link | Popover::Button | Popover::Placeholder)
    }
}

/// One entry of a dropdown picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

pub fn heading_options() -> Vec<SelectOption> {
    BlockFormat::ALL
        .iter()
        .map(|format| SelectOption::new(format.label(), format.tag()))
        .collect()
}

pub fn font_options() -> Vec<SelectOption> {
    FONT_FAMILIES
        .iter()
        .map(|(label, value)| SelectOption::new(*label, *value))
        .collect()
}

/// Resolve a font picker value to its label, matching on the first family.
pub fn font_label(family: &str) -> Option<&'static str> {
    let first = family.split(',').next()?.trim();
    FONT_FAMILIES
        .iter()
        .find(|(label, value)| label.eq_ignore_ascii_case(first) || *value == family)
        .map(|(label, _)| *label)
}

fn is_real_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && url != DEFAULT_LINK_URL
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkForm {
    pub url: String,
}

impl Default for LinkForm {
    fn default() -> Self {
        Self {
            url: DEFAULT_LINK_URL.to_string(),
        }
    }
}

impl LinkForm {
    pub fn is_submittable(&self) -> bool {
        is_real_url(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonForm {
    pub text: String,
    pub url: String,
}

impl Default for ButtonForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            url: DEFAULT_LINK_URL.to_string(),
        }
    }
}

impl ButtonForm {
    pub fn is_submittable(&self) -> bool {
        !self.text.trim().is_empty() && is_real_url(&self.url)
    }
}

/// Toolbar state. At most one popover is open; opening one replaces any other.
#[derive(Debug, Clone, Default)]
pub struct ToolbarState {
    pub format: FormatState,
    popover: Option<Popover>,
    pub link_form: LinkForm,
    pub button_form: ButtonForm,
}

impl ToolbarState {
    pub fn popover(&self) -> Option<Popover> {
        self.popover
    }

    pub fn is_open(&self, popover: Popover) -> bool {
        self.popover == Some(popover)
    }

    /// Open a popover, returning the one it replaced. Forms start fresh.
    pub fn open(&mut self, popover: Popover) -> Option<Popover> {
        match popover {
            Popover::Link => self.link_form = LinkForm::default(),
            Popover::Button => self.button_form = ButtonForm::default(),
            _ => {}
        }
        self.popover.replace(popover)
    }

    /// Close any open popover. Nothing is applied.
    pub fn close(&mut self) -> Option<Popover> {
        self.popover.take()
    }

    /// A pointer press outside the open popover closes it.
    pub fn pointer_down(&mut self, inside_popover: bool) -> Option<Popover> {
        if inside_popover { None } else { self.close() }
    }

    pub fn refresh(&mut self, format: FormatState) {
        self.format = format;
    }

    /// Current heading picker value.
    pub fn heading_value(&self) -> &'static str {
        self.format.block.tag()
    }

    /// Current font picker value, if it is one of the offered families.
    pub fn font_value(&self) -> Option<&'static str> {
        let family = self.format.font_family.as_deref()?;
        let label = font_label(family)?;
        FONT_FAMILIES
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, value)| *value)
    }
}
