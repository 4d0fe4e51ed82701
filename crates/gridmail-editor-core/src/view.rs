//! WYSIWYG / raw-HTML view switching and the source view buffer.

use serde::{Deserialize, Serialize};

use crate::dom::Fragment;
use crate::sanitize::{format_source, wrap_orphans};
use crate::shell::{unwrap_document, wrap_document};
use crate::text::{EditorRope, TextBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Edit,
    Html,
}

/// Source view text for a stored document: body fragment with orphans
/// wrapped, pretty-printed inside an indented shell.
pub fn source_text(stored: &str) -> String {
    let mut fragment = Fragment::parse(unwrap_document(stored));
    wrap_orphans(&mut fragment.children);
    format_source(&fragment.to_html())
}

/// Line-number gutter for `rows` rows, right-aligned.
pub fn gutter_lines(rows: usize) -> Vec<String> {
    let width = rows.max(1).to_string().len();
    (1..=rows.max(1)).map(|n| format!("{n:>width$}")).collect()
}

#[derive(Clone, Default)]
pub struct ViewController {
    mode: ViewMode,
    fullscreen: bool,
    source: EditorRope,
    /// Whether the source text changed since the view was entered.
    edited: bool,
}

impl ViewController {
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    /// Switch to the source view, deriving its text fresh from `stored`.
    pub fn enter_html(&mut self, stored: &str) {
        self.source = EditorRope::from_str(&source_text(stored));
        self.mode = ViewMode::Html;
        self.edited = false;
    }

    pub fn enter_edit(&mut self) {
        self.mode = ViewMode::Edit;
    }

    pub fn source(&self) -> &EditorRope {
        &self.source
    }

    pub fn source_edited(&self) -> bool {
        self.edited
    }

    pub fn source_string(&self) -> String {
        self.source.to_string()
    }

    /// Edit the source buffer. Returns the document to store: the raw text
    /// in the shell, which is a no-op when the text still has `<html`.
    pub fn edit_source(&mut self, range: std::ops::Range<usize>, text: &str) -> String {
        self.source.replace(range, text);
        self.edited = true;
        wrap_document(&self.source.to_string())
    }

    /// Replace the whole source text, as a textarea `input` event does.
    pub fn set_source(&mut self, text: &str) -> String {
        self.source = EditorRope::from_str(text);
        self.edited = true;
        wrap_document(text)
    }

    pub fn gutter(&self) -> Vec<String> {
        gutter_lines(self.source.len_lines())
    }

    /// Source text with the gutter prefixed to each row.
    pub fn source_with_gutter(&self) -> String {
        let gutter = self.gutter();
        (0..self.source.len_lines())
            .map(|i| {
                let line = self.source.line(i).unwrap_or_default();
                format!("{} | {line}", gutter[i])
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_text() {
        insta::assert_snapshot!(
            source_text("<!DOCTYPE html><html><body>Hi<p>A</p></body></html>"),
            @r"
        <!DOCTYPE html>
        <html>
          <body>
            <p>Hi</p>
            <p>A</p>
          </body>
        </html>
        "
        );
    }

    #[test]
    fn test_source_text_is_stable() {
        let once = source_text("<p>a<br>  b</p><pre>x\n  y</pre><ul><li>c</li></ul>");
        assert!(once.contains("<pre>x\n  y</pre>"), "{once}");
        assert_eq!(source_text(&once), once);
    }

    #[test]
    fn test_enter_html_derives_fresh_text() {
        let mut view = ViewController::default();
        view.enter_html("<p>A</p>");
        assert_eq!(view.mode(), ViewMode::Html);
        assert!(view.source_string().contains("\n    <p>A</p>\n"));
        view.enter_edit();
        view.enter_html("<p>B</p>");
        assert!(view.source_string().contains("\n    <p>B</p>\n"));
        assert!(!view.source_edited());
        view.edit_source(0..0, " ");
        assert!(view.source_edited());
        view.enter_html("<p>B</p>");
        assert!(!view.source_edited());
    }

    #[test]
    fn test_source_edits_commit_verbatim() {
        let mut view = ViewController::default();
        view.enter_html("<p>A</p>");
        let text = view.source_string().replace("<p>A</p>", "<p>B</p>");
        let stored = view.set_source(&text);
        assert_eq!(stored, text);

        let stored = view.set_source("<p>bare</p>");
        assert_eq!(stored, "<!DOCTYPE html><html><body><p>bare</p></body></html>");
    }

    #[test]
    fn test_gutter() {
        let mut view = ViewController::default();
        view.enter_html("<p>A</p>");
        assert_eq!(view.gutter().len(), 6);
        assert_eq!(gutter_lines(10)[0], " 1");
        assert_eq!(gutter_lines(0), vec!["1"]);
        assert!(view.source_with_gutter().starts_with("1 | <!DOCTYPE html>\n2 | <html>"));
    }

    #[test]
    fn test_fullscreen_is_independent_of_mode() {
        let mut view = ViewController::default();
        assert!(view.toggle_fullscreen());
        view.enter_html("");
        assert!(view.is_fullscreen());
        assert!(!view.toggle_fullscreen());
        assert_eq!(view.mode(), ViewMode::Html);
    }
}
