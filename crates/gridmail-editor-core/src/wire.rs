//! Shape checks for stored documents.
//!
//! A stored value is either empty or a full `<!DOCTYPE html><html><body>`
//! document whose body is a sequence of blocks, carries tokens as plain
//! `[[NAME]]` text and has the fixed inline styles on every styled tag.

use miette::Diagnostic;

use crate::dom::{Fragment, Node};
use crate::placeholder::{CHIP_ATTR, is_chip};
use crate::sanitize::InlineStyles;
use crate::shell::unwrap_document;

const SNIPPET_LEN: usize = 40;

#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum WireViolation {
    #[error("document shell missing")]
    #[diagnostic(
        code(gridmail::wire::shell),
        help("stored values are `<!DOCTYPE html><html><body>...</body></html>`")
    )]
    MissingShell,

    #[error("inline content at the body root: `{snippet}`")]
    #[diagnostic(code(gridmail::wire::orphan), help("wrap it in a <p>"))]
    Orphan { snippet: String },

    #[error("placeholder chip markup stored for `{token}`")]
    #[diagnostic(code(gridmail::wire::chip), help("tokens are stored as plain `[[NAME]]` text"))]
    ChipMarkup { token: String },

    #[error("<{tag}> is missing its inline style")]
    #[diagnostic(code(gridmail::wire::style))]
    MissingStyle { tag: String },
}

/// Every way `value` departs from the stored shape. Empty input is valid.
pub fn check_wire(value: &str, styles: &InlineStyles) -> Vec<WireViolation> {
    let mut violations = Vec::new();
    if value.trim().is_empty() {
        return violations;
    }
    if !has_shell(value) {
        violations.push(WireViolation::MissingShell);
    }

    let fragment = Fragment::parse(unwrap_document(value));
    for node in &fragment.children {
        if node.is_inline() && !node.is_insignificant() {
            violations.push(WireViolation::Orphan {
                snippet: snippet(&node_html(node)),
            });
        }
    }
    fragment.for_each_element(&mut |el| {
        if is_chip(el) {
            let token = el
                .attr(CHIP_ATTR)
                .map(str::to_string)
                .unwrap_or_else(|| el.text_content());
            violations.push(WireViolation::ChipMarkup { token });
        }
        if !styles.is_applied(el) {
            violations.push(WireViolation::MissingStyle {
                tag: el.tag.to_string(),
            });
        }
    });
    tracing::debug!(violations = violations.len(), "stored document checked");
    violations
}

fn has_shell(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("<!doctype html") && lower.contains("<html") && lower.contains("<body")
}

fn node_html(node: &Node) -> String {
    Fragment::from_nodes(vec![node.clone()]).to_html()
}

fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_LEN).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles() -> InlineStyles {
        let mut styles = InlineStyles::empty();
        styles.set("p", "margin: 0;");
        styles
    }

    #[test]
    fn test_valid_documents() {
        assert!(check_wire("", &styles()).is_empty());
        let value = "<!DOCTYPE html><html><body><p style=\"margin: 0;\">Hi [[A]]</p></body></html>";
        assert!(check_wire(value, &styles()).is_empty());
    }

    #[test]
    fn test_violations() {
        let value = "<p>x</p>tail<span class=\"placeholder-chip\" data-placeholder=\"[[A]]\">[[A]]</span>";
        let violations = check_wire(value, &styles());
        assert_eq!(
            violations,
            vec![
                WireViolation::MissingShell,
                WireViolation::Orphan {
                    snippet: "tail".into()
                },
                WireViolation::Orphan {
                    snippet: "<span class=\"placeholder-chip\" data-plac...".into()
                },
                WireViolation::MissingStyle { tag: "p".into() },
                WireViolation::ChipMarkup {
                    token: "[[A]]".into()
                },
            ]
        );
    }

    #[test]
    fn test_pretty_printed_shell() {
        let value = "<!DOCTYPE html>\n<html>\n  <body>\n    <p style=\"margin: 0;\">A</p>\n  </body>\n</html>";
        assert!(check_wire(value, &styles()).is_empty());
    }
}
