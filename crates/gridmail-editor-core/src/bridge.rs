//! Bridge between the stored document string and the live editing surface.
//!
//! Inbound, an external value is unwrapped, chip-ified and adopted only when
//! the surface is unfocused and the content actually differs. Outbound, every
//! local mutation runs the commit pipeline:
//!
//! 1. wrap root-level orphans in paragraphs (live surface)
//! 2. reset a visually empty surface to one empty paragraph (live surface)
//! 3. chips back to token text (stored copy)
//! 4. inline-style injection (stored copy)
//! 5. wrap in the document shell
//!
//! The caller then hands the string to its change listener.

use crate::document::RichDocument;
use crate::dom::{Fragment, Node};
use crate::placeholder::{display_pass, storage_pass};
use crate::sanitize::{InlineStyles, ensure_not_empty, wrap_orphans};
use crate::shell::{unwrap_document, wrap_document};

/// Outcome of offering an external value to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Adopted,
    /// Same content as the surface already shows.
    Unchanged,
    /// The surface has focus; the value was not applied.
    SkippedFocused,
}

/// Whether an incoming value should replace the live surface.
pub fn should_adopt_external_value(has_focus: bool, current: &str, incoming: &str) -> bool {
    !has_focus && current != incoming
}

/// Display fragment for a stored value: shell stripped, source-formatting
/// newlines between root blocks dropped, tokens as chips, never blank.
pub fn display_fragment(value: &str, chip_style: &str) -> Fragment {
    let mut fragment = Fragment::parse(unwrap_document(value));
    fragment
        .children
        .retain(|node| !matches!(node, Node::Text(text) if text.trim().is_empty() && text.contains('\n')));
    let chips = display_pass(&mut fragment.children, chip_style);
    ensure_not_empty(&mut fragment);
    tracing::trace!(chips, "display fragment prepared");
    fragment
}

/// Offer an external value to the document.
///
/// The fixed inline styles the commit pipeline injects are stripped first,
/// so a stored value compares equal to the surface it was serialized from.
pub fn reconcile(
    doc: &mut RichDocument,
    has_focus: bool,
    value: &str,
    chip_style: &str,
    styles: &InlineStyles,
) -> Reconcile {
    if has_focus {
        tracing::trace!("surface focused, external value ignored");
        return Reconcile::SkippedFocused;
    }
    let mut incoming = display_fragment(value, chip_style);
    styles.strip(&mut incoming);
    let incoming_html = incoming.to_html();
    if !should_adopt_external_value(has_focus, &doc.to_html(), &incoming_html) {
        tracing::trace!("external value matches surface");
        return Reconcile::Unchanged;
    }
    tracing::debug!(len = incoming_html.len(), "adopting external value");
    doc.replace_fragment(incoming);
    Reconcile::Adopted
}

/// Structural fixes applied to the live surface before serializing.
/// Returns true if the surface changed.
pub fn normalize_live(doc: &mut RichDocument) -> bool {
    let wrapped = wrap_orphans(&mut doc.fragment.children);
    let reset = ensure_not_empty(&mut doc.fragment);
    if wrapped > 0 || reset {
        tracing::debug!(wrapped, reset, "live surface normalized");
        doc.touch();
        // Offsets survive wrapping; only a reset can shorten the document.
        let selection = doc.selection();
        doc.set_selection(selection);
        return true;
    }
    false
}

/// Serialize a live fragment for storage: chips to tokens, inline styles,
/// document shell.
pub fn serialize_for_storage(live: &Fragment, styles: &InlineStyles) -> String {
    let mut stored = live.clone();
    let restored = storage_pass(&mut stored.children);
    let styled = styles.inject(&mut stored);
    tracing::debug!(restored, styled, "fragment serialized for storage");
    wrap_document(&stored.to_html())
}

/// Run the whole commit pipeline and return the stored document.
pub fn commit(doc: &mut RichDocument, styles: &InlineStyles) -> String {
    normalize_live(doc);
    serialize_for_storage(doc.fragment(), styles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::DEFAULT_CHIP_STYLE;

    #[test]
    fn test_should_adopt() {
        assert!(should_adopt_external_value(false, "<p>a</p>", "<p>b</p>"));
        assert!(!should_adopt_external_value(false, "<p>a</p>", "<p>a</p>"));
        assert!(!should_adopt_external_value(true, "<p>a</p>", "<p>b</p>"));
    }

    #[test]
    fn test_reconcile() {
        let mut doc = RichDocument::new();
        let value = "<!DOCTYPE html><html><body><p>Hi [[A]]</p></body></html>";
        assert_eq!(reconcile(&mut doc, false, value, "x", &InlineStyles::empty()), Reconcile::Adopted);
        assert!(doc.to_html().contains("data-placeholder=\"[[A]]\""));
        let revision = doc.revision();

        assert_eq!(reconcile(&mut doc, false, value, "x", &InlineStyles::empty()), Reconcile::Unchanged);
        assert_eq!(doc.revision(), revision);

        assert_eq!(
            reconcile(&mut doc, true, "<p>other</p>", "x", &InlineStyles::empty()),
            Reconcile::SkippedFocused
        );
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_pretty_printed_value() {
        let fragment = display_fragment("<html>\n  <body>\n    <p>A</p>\n    <p>B</p>\n  </body>\n</html>", "x");
        assert_eq!(fragment.to_html(), "<p>A</p><p>B</p>");
        assert_eq!(display_fragment("<b>a</b> <i>b</i>", "x").to_html(), "<b>a</b> <i>b</i>");
    }

    #[test]
    fn test_empty_value_installs_paragraph() {
        let mut doc = RichDocument::new();
        reconcile(&mut doc, false, "", DEFAULT_CHIP_STYLE, &InlineStyles::default());
        assert_eq!(doc.to_html(), "<p></p>");
    }

    #[test]
    fn test_commit_order() {
        let mut doc = RichDocument::new();
        reconcile(&mut doc, false, "Hi [[NAME]]", DEFAULT_CHIP_STYLE, &InlineStyles::empty());
        let mut styles = InlineStyles::empty();
        styles.set("p", "margin: 0;");
        let stored = commit(&mut doc, &styles);
        assert_eq!(
            stored,
            "<!DOCTYPE html><html><body><p style=\"margin: 0;\">Hi [[NAME]]</p></body></html>"
        );
        // The live surface keeps its chip and gets no stored-only styling.
        assert!(doc.to_html().starts_with("<p>Hi <span class=\"placeholder-chip\""));
    }

    #[test]
    fn test_stored_styles_stay_off_the_surface() {
        let styles = InlineStyles::default();
        let mut doc = RichDocument::new();
        reconcile(&mut doc, false, "<h1>T</h1><p>Hi [[NAME]]</p>", DEFAULT_CHIP_STYLE, &styles);
        let stored = commit(&mut doc, &styles);
        assert!(stored.contains("<p style=\"margin"));
        let surface = doc.to_html();
        let revision = doc.revision();

        assert_eq!(reconcile(&mut doc, false, &stored, DEFAULT_CHIP_STYLE, &styles), Reconcile::Unchanged);
        assert_eq!(doc.revision(), revision);

        let mut fresh = RichDocument::new();
        assert_eq!(reconcile(&mut fresh, false, &stored, DEFAULT_CHIP_STYLE, &styles), Reconcile::Adopted);
        assert_eq!(fresh.to_html(), surface);
        assert!(!fresh.to_html().contains("style=\"margin"));
    }

    #[test]
    fn test_commit_resets_blank_surface() {
        let mut doc = RichDocument::parse("<br>");
        let stored = commit(&mut doc, &InlineStyles::empty());
        assert_eq!(stored, "<!DOCTYPE html><html><body><p></p></body></html>");
        assert_eq!(doc.to_html(), "<p></p>");
    }
}
