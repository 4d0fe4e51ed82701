//! Structural normalization of editable content before it is stored.
//!
//! - orphan wrapping: root-level inline content goes into a `<p>`
//! - emptiness floor: an empty surface holds one empty `<p>`
//! - inline-style injection for email clients that ignore `<style>` blocks
//! - pretty-printing for the raw-HTML source view

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Element, Fragment, Node};

/// Wrap each run of root-level inline content that holds something visible
/// (non-whitespace text or any element) in a `<p>`.
///
/// Whitespace-only text between blocks is left alone. Returns the number of
/// paragraphs created.
pub fn wrap_orphans(nodes: &mut Vec<Node>) -> usize {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut run: Vec<Node> = Vec::new();
    let mut wrapped = 0;

    for node in nodes.drain(..) {
        if flows_inline(&node) {
            run.push(node);
        } else {
            wrapped += flush_run(&mut run, &mut out);
            out.push(node);
        }
    }
    wrapped += flush_run(&mut run, &mut out);
    *nodes = out;
    wrapped
}

fn flows_inline(node: &Node) -> bool {
    match node {
        Node::Element(el) => el.is_inline() && !el.contains_block(),
        _ => true,
    }
}

fn flush_run(run: &mut Vec<Node>, out: &mut Vec<Node>) -> usize {
    if run.is_empty() {
        return 0;
    }
    if run.iter().all(Node::is_insignificant) {
        out.append(run);
        return 0;
    }
    out.push(Element::new("p").with_children(std::mem::take(run)).into());
    1
}

/// Whether the serialized content would read as blank: nothing, whitespace,
/// a lone `<br>`, or a lone paragraph holding at most a `<br>`.
pub fn is_visually_empty(fragment: &Fragment) -> bool {
    let significant: Vec<&Node> = fragment
        .children
        .iter()
        .filter(|n| !n.is_insignificant())
        .collect();
    match significant.as_slice() {
        [] => true,
        [node] if node.is_element("br") => true,
        [Node::Element(p)] if p.tag == "p" => match p.children.as_slice() {
            [] => true,
            [only] => only.is_element("br"),
            _ => false,
        },
        _ => false,
    }
}

/// Reset a visually empty fragment to a single empty paragraph.
///
/// Returns true if the fragment was replaced.
pub fn ensure_not_empty(fragment: &mut Fragment) -> bool {
    if !is_visually_empty(fragment) {
        return false;
    }
    let already = matches!(
        fragment.children.as_slice(),
        [Node::Element(p)] if p.tag == "p" && p.children.is_empty()
    );
    if already {
        return false;
    }
    fragment.children = vec![Element::new("p").into()];
    true
}

/// Fixed inline CSS declarations per tag, applied at serialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineStyles(BTreeMap<String, String>);

impl Default for InlineStyles {
    fn default() -> Self {
        let heading = |size: u32| {
            format!(
                "margin: 0 0 12px 0; font-family: Arial, Helvetica, sans-serif; \
                 font-size: {size}px; line-height: 1.3; font-weight: bold; color: #1f2937;"
            )
        };
        let mut map = BTreeMap::new();
        for (tag, size) in [("h1", 28), ("h2", 24), ("h3", 20), ("h4", 18), ("h5", 16), ("h6", 14)] {
            map.insert(tag.to_string(), heading(size));
        }
        map.insert(
            "p".to_string(),
            "margin: 0 0 12px 0; font-family: Arial, Helvetica, sans-serif; \
             font-size: 14px; line-height: 1.5; color: #1f2937;"
                .to_string(),
        );
        let list = "margin: 0 0 12px 0; padding-left: 24px; \
                    font-family: Arial, Helvetica, sans-serif; font-size: 14px;";
        map.insert("ul".to_string(), list.to_string());
        map.insert("ol".to_string(), list.to_string());
        map.insert("li".to_string(), "margin: 0 0 4px 0; line-height: 1.5;".to_string());
        Self(map)
    }
}

impl InlineStyles {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn set(&mut self, tag: &str, style: impl Into<String>) {
        self.0.insert(tag.to_ascii_lowercase(), style.into());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether `el` carries its tag's fixed declarations, if it has any.
    pub fn is_applied(&self, el: &Element) -> bool {
        match self.get(&el.tag) {
            Some(fixed) => el
                .attr("style")
                .is_some_and(|style| style.trim_start().starts_with(fixed.trim())),
            None => true,
        }
    }

    /// Prepend each element's fixed declarations to its `style` attribute.
    ///
    /// Elements whose style already begins with the declarations are skipped,
    /// so running the pass repeatedly never duplicates them. Returns the
    /// number of elements changed.
    pub fn inject(&self, fragment: &mut Fragment) -> usize {
        let mut changed = 0;
        fragment.for_each_element_mut(&mut |el| {
            if self.is_applied(el) {
                return;
            }
            let Some(fixed) = self.get(&el.tag) else {
                return;
            };
            let style = match el.attr("style").map(str::trim) {
                Some(existing) if !existing.is_empty() => format!("{} {existing}", fixed.trim()),
                _ => fixed.trim().to_string(),
            };
            el.set_attr("style", style);
            changed += 1;
        });
        changed
    }

    /// Remove the fixed declarations [`inject`](Self::inject) prepends,
    /// keeping whatever the author wrote after them. Returns the number of
    /// elements changed.
    pub fn strip(&self, fragment: &mut Fragment) -> usize {
        let mut changed = 0;
        fragment.for_each_element_mut(&mut |el| {
            let Some(fixed) = self.get(&el.tag) else {
                return;
            };
            let Some(rest) = el
                .attr("style")
                .and_then(|style| style.trim_start().strip_prefix(fixed.trim()))
            else {
                return;
            };
            let rest = rest.trim().to_string();
            if rest.is_empty() {
                el.remove_attr("style");
            } else {
                el.set_attr("style", rest);
            }
            changed += 1;
        });
        changed
    }
}

static SOURCE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<pre\b[^>]*>|</(?:p|h[1-6]|div|ul|ol|li|table|thead|tbody|tfoot|tr|td|th|blockquote|pre|address)>",
    )
    .unwrap()
});

/// Pretty-print a body fragment as a full document for the source view: a
/// row break after every block closing tag outside `<pre>`, each row indented
/// inside `<body>`. Text inside a row is never re-flowed.
pub fn format_source(fragment_html: &str) -> String {
    let mut rows: Vec<&str> = Vec::new();
    let mut row_start = 0;
    let mut pre_depth = 0usize;
    for tag in SOURCE_BREAK_RE.find_iter(fragment_html) {
        let text = tag.as_str();
        if !text.starts_with("</") {
            pre_depth += 1;
            continue;
        }
        if text.eq_ignore_ascii_case("</pre>") {
            pre_depth = pre_depth.saturating_sub(1);
        }
        if pre_depth == 0 {
            rows.push(&fragment_html[row_start..tag.end()]);
            row_start = tag.end();
        }
    }
    rows.push(&fragment_html[row_start..]);

    let mut out = String::from("<!DOCTYPE html>\n<html>\n  <body>\n");
    // Whitespace before a row sits between blocks.
    for row in rows.into_iter().map(str::trim_start).filter(|row| !row.is_empty()) {
        out.push_str("    ");
        out.push_str(row);
        out.push('\n');
    }
    out.push_str("  </body>\n</html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orphans(html: &str) -> String {
        let mut frag = Fragment::parse(html);
        wrap_orphans(&mut frag.children);
        frag.to_html()
    }

    #[test]
    fn test_wrap_orphans() {
        assert_eq!(orphans("Hello"), "<p>Hello</p>");
        assert_eq!(orphans("a <b>b</b><p>c</p>d<br>"), "<p>a <b>b</b></p><p>c</p><p>d<br></p>");
        assert_eq!(orphans("<br>"), "<p><br></p>");
    }

    #[test]
    fn test_wrap_orphans_keeps_whitespace_between_blocks() {
        assert_eq!(orphans("<p>a</p>\n  <p>b</p>\n"), "<p>a</p>\n  <p>b</p>\n");
        assert_eq!(orphans("   "), "   ");
    }

    #[test]
    fn test_emptiness() {
        for html in ["", "  \n", "<br>", "<p><br></p>", "<p></p>", "<!-- c -->"] {
            let mut frag = Fragment::parse(html);
            assert!(is_visually_empty(&frag), "{html:?}");
            ensure_not_empty(&mut frag);
            assert_eq!(frag.to_html(), "<p></p>");
        }
        for html in ["<p>x</p>", "<p><br><br></p>", "<p></p><p></p>", "<ul><li></li></ul>"] {
            assert!(!is_visually_empty(&Fragment::parse(html)), "{html:?}");
        }
        let mut frag = Fragment::parse("<p></p>");
        assert!(!ensure_not_empty(&mut frag));
    }

    #[test]
    fn test_inject_prepends_and_is_idempotent() {
        let mut styles = InlineStyles::empty();
        styles.set("p", "margin: 0;");
        styles.set("li", "padding: 0;");
        let mut frag = Fragment::parse("<p style=\"color: red\">a</p><ul><li>b</li></ul><div>c</div>");

        assert_eq!(styles.inject(&mut frag), 2);
        let once = frag.to_html();
        assert_eq!(
            once,
            "<p style=\"margin: 0; color: red\">a</p><ul><li style=\"padding: 0;\">b</li></ul><div>c</div>"
        );
        assert_eq!(styles.inject(&mut frag), 0);
        assert_eq!(frag.to_html(), once);
    }

    #[test]
    fn test_strip_undoes_inject() {
        let mut styles = InlineStyles::empty();
        styles.set("p", "margin: 0;");
        let source = "<p style=\"color: red\">a</p><p>b</p><div style=\"margin: 0;\">c</div>";
        let mut frag = Fragment::parse(source);
        styles.inject(&mut frag);

        assert_eq!(styles.strip(&mut frag), 2);
        assert_eq!(frag.to_html(), source);
        assert_eq!(styles.strip(&mut frag), 0);
    }

    #[test]
    fn test_default_styles_cover_tags() {
        let styles = InlineStyles::default();
        let tags: Vec<_> = styles.tags().collect();
        assert_eq!(tags, vec!["h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "ul"]);
    }

    #[test]
    fn test_format_source_keeps_text_intact() {
        let source = format_source("<p>a<br>  b</p><pre>x</p>\n  y</pre><p>c</p>");
        assert!(source.contains("\n    <p>a<br>  b</p>\n"), "{source}");
        assert!(source.contains("\n    <pre>x</p>\n  y</pre>\n"), "{source}");
        assert!(source.contains("\n    <p>c</p>\n"), "{source}");
    }

    #[test]
    fn test_format_source() {
        insta::assert_snapshot!(
            format_source("<h1>Title</h1><p>Hi <b>[[NAME]]</b></p><ul><li>one</li><li>two</li></ul>"),
            @r"
        <!DOCTYPE html>
        <html>
          <body>
            <h1>Title</h1>
            <p>Hi <b>[[NAME]]</b></p>
            <ul><li>one</li>
            <li>two</li>
            </ul>
          </body>
        </html>
        "
        );
    }
}
