//! Platform abstraction traits for editor operations.
//!
//! These traits define the interface between the editor logic and whatever
//! hosts the editing surface (browser DOM, native UI, tests). The core never
//! touches a real clipboard or measures layout itself.

use std::cell::RefCell;

use crate::types::Rect;

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Clipboard access for paste (and copy, for hosts that want it).
///
/// Paste only ever consumes plain text; `read_html` exists so that a host
/// offering nothing but `text/html` still yields its text content.
pub trait ClipboardPlatform {
    fn write_text(&self, text: &str);

    fn write_html(&self, html: &str, plain_text: &str);

    fn read_text(&self) -> Option<String>;

    fn read_html(&self) -> Option<String>;
}

/// Clipboard held in memory. Used by tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    text: RefCell<Option<String>>,
    html: RefCell<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.write_text(&text.into());
        clipboard
    }

    /// A clipboard offering only `text/html`, as some copy sources do.
    pub fn with_html_only(html: impl Into<String>) -> Self {
        let clipboard = Self::new();
        *clipboard.html.borrow_mut() = Some(html.into());
        clipboard
    }
}

impl ClipboardPlatform for MemoryClipboard {
    fn write_text(&self, text: &str) {
        *self.text.borrow_mut() = Some(text.to_string());
        *self.html.borrow_mut() = None;
    }

    fn write_html(&self, html: &str, plain_text: &str) {
        *self.text.borrow_mut() = Some(plain_text.to_string());
        *self.html.borrow_mut() = Some(html.to_string());
    }

    fn read_text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    fn read_html(&self) -> Option<String> {
        self.html.borrow().clone()
    }
}

/// Screen geometry of the editing surface, used to anchor the placeholder menu.
pub trait SurfaceGeometry {
    /// Caret rectangle at a document offset, if it is laid out.
    fn caret_rect(&self, offset: usize) -> Option<Rect>;

    /// Rectangle of the toolbar's placeholder-picker button.
    fn picker_button_rect(&self) -> Option<Rect>;
}

/// Geometry provider for hosts without layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeometry;

impl SurfaceGeometry for NoGeometry {
    fn caret_rect(&self, _offset: usize) -> Option<Rect> {
        None
    }

    fn picker_button_rect(&self) -> Option<Rect> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::with_text("plain");
        assert_eq!(clipboard.read_text().as_deref(), Some("plain"));
        assert_eq!(clipboard.read_html(), None);

        clipboard.write_html("<b>x</b>", "x");
        assert_eq!(clipboard.read_text().as_deref(), Some("x"));
        assert_eq!(clipboard.read_html().as_deref(), Some("<b>x</b>"));

        let html_only = MemoryClipboard::with_html_only("<i>y</i>");
        assert_eq!(html_only.read_text(), None);
    }
}
