//! Placeholder tokens (`[[NAME]]`) and their display chips.
//!
//! Stored HTML carries tokens as plain text. On the editing surface each token
//! is shown as a chip: a non-editable styled `<span>` that behaves as one
//! unit for cursor movement and deletion. The display pass turns token text
//! into chips, the storage pass turns chips back into token text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Element, Node, RAW_TEXT_TAGS};

/// Matches one token: `[[`, one or more non-`]` chars, `]]`.
pub static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[[^\]]+\]\]").unwrap());

static WHOLE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\[[^\]]+\]\]$").unwrap());

pub const CHIP_CLASS: &str = "placeholder-chip";
pub const CHIP_ATTR: &str = "data-placeholder";

pub const DEFAULT_CHIP_STYLE: &str = "display: inline-block; padding: 0 4px; margin: 0 1px; \
     border-radius: 4px; background-color: #e8f0fe; color: #1a56db; \
     font-family: monospace; font-size: 0.9em; white-space: nowrap;";

/// Whether `text` is exactly one token.
pub fn is_token(text: &str) -> bool {
    WHOLE_TOKEN_RE.is_match(text)
}

/// Read a catalog value or requested token as a token: a bare `NAME`, or one
/// with stray brackets, becomes `[[NAME]]`. The result may still fail
/// [`is_token`], e.g. for an empty name.
pub fn normalize_token(value: &str) -> String {
    let value = value.trim();
    if is_token(value) {
        value.to_string()
    } else {
        format!("[[{}]]", value.trim_start_matches('[').trim_end_matches(']'))
    }
}

/// Byte ranges of every token in `text`, in order.
pub fn find_tokens(text: &str) -> Vec<Range<usize>> {
    TOKEN_RE.find_iter(text).map(|m| m.range()).collect()
}

/// Build the chip element for a token.
pub fn chip_element(token: &str, style: &str) -> Element {
    Element::new("span")
        .with_attr("class", CHIP_CLASS)
        .with_attr("contenteditable", "false")
        .with_attr(CHIP_ATTR, token)
        .with_attr("style", style)
        .with_children(vec![Node::text(token)])
}

pub fn is_chip(el: &Element) -> bool {
    el.has_attr(CHIP_ATTR)
        || el
            .attr("class")
            .is_some_and(|class| class.split_ascii_whitespace().any(|c| c == CHIP_CLASS))
}

/// Replace token text with chips, scanning text nodes only.
///
/// Attribute values, chip contents and raw-text elements are never touched.
/// Returns the number of chips created.
pub fn display_pass(nodes: &mut Vec<Node>, chip_style: &str) -> usize {
    let mut created = 0;
    let mut i = 0;
    while i < nodes.len() {
        match &mut nodes[i] {
            Node::Element(el) => {
                if !is_chip(el) && !RAW_TEXT_TAGS.contains(&el.tag.as_str()) {
                    created += display_pass(&mut el.children, chip_style);
                }
                i += 1;
            }
            Node::Text(text) => {
                let spans = find_tokens(text);
                if spans.is_empty() {
                    i += 1;
                    continue;
                }
                let pieces = split_tokens(text, &spans, chip_style);
                created += spans.len();
                let count = pieces.len();
                nodes.splice(i..=i, pieces);
                i += count;
            }
            Node::Comment(_) => i += 1,
        }
    }
    created
}

fn split_tokens(text: &str, spans: &[Range<usize>], chip_style: &str) -> Vec<Node> {
    let mut out = Vec::with_capacity(spans.len() * 2 + 1);
    let mut last = 0;
    for span in spans {
        if span.start > last {
            out.push(Node::text(&text[last..span.start]));
        }
        out.push(chip_element(&text[span.clone()], chip_style).into());
        last = span.end;
    }
    if last < text.len() {
        out.push(Node::text(&text[last..]));
    }
    out
}

/// Replace chips with their token text.
///
/// A chip whose text is no longer a well-formed token loses its chip markers
/// and stays as a plain `<span>`. Adjacent text nodes are merged afterwards.
/// Returns the number of chips reverted to text.
pub fn storage_pass(nodes: &mut Vec<Node>) -> usize {
    let mut reverted = 0;
    for node in nodes.iter_mut() {
        let Node::Element(el) = node else { continue };
        if !is_chip(el) {
            reverted += storage_pass(&mut el.children);
            continue;
        }
        let text = el.text_content();
        if is_token(&text) {
            *node = Node::Text(text);
            reverted += 1;
        } else {
            tracing::warn!(content = %text, "malformed placeholder chip left inert");
            strip_chip_markers(el);
            storage_pass(&mut el.children);
        }
    }
    merge_adjacent_text(nodes);
    reverted
}

fn strip_chip_markers(el: &mut Element) {
    el.remove_attr(CHIP_ATTR);
    el.remove_attr("contenteditable");
    el.remove_attr("style");
    if let Some(class) = el.remove_attr("class") {
        let rest: Vec<&str> = class
            .split_ascii_whitespace()
            .filter(|c| *c != CHIP_CLASS)
            .collect();
        if !rest.is_empty() {
            el.set_attr("class", rest.join(" "));
        }
    }
}

/// Concatenate runs of sibling text nodes into one.
pub fn merge_adjacent_text(nodes: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match (merged.last_mut(), node) {
            (Some(Node::Text(prev)), Node::Text(next)) => prev.push_str(&next),
            (_, node) => merged.push(node),
        }
    }
    *nodes = merged;
}

/// Every token in text content, chips included, in document order.
pub fn collect_tokens(nodes: &[Node]) -> Vec<String> {
    let mut out = Vec::new();
    collect_into(nodes, &mut out);
    out
}

fn collect_into(nodes: &[Node], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                out.extend(TOKEN_RE.find_iter(text).map(|m| m.as_str().to_string()))
            }
            Node::Element(el) if is_chip(el) => {
                let text = el.text_content();
                if is_token(&text) {
                    out.push(text);
                }
            }
            Node::Element(el) if RAW_TEXT_TAGS.contains(&el.tag.as_str()) => {}
            Node::Element(el) => collect_into(&el.children, out),
            Node::Comment(_) => {}
        }
    }
}

/// One entry of the caller-supplied placeholder catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderEntry {
    pub label: String,
    /// The token text inserted, e.g. `[[CUSTOMER_ID]]`. A bare `CUSTOMER_ID`
    /// is read the same way.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlaceholderEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The token this entry inserts.
    pub fn token(&self) -> String {
        normalize_token(&self.value)
    }

    /// Case-insensitive substring match against label and value.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.label.to_lowercase().contains(&query) || self.value.to_lowercase().contains(&query)
    }
}

/// Catalog entries matching a live filter query, in catalog order.
pub fn filter_catalog<'a>(catalog: &'a [PlaceholderEntry], query: &str) -> Vec<&'a PlaceholderEntry> {
    catalog.iter().filter(|entry| entry.matches(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;

    fn display(html: &str) -> String {
        let mut frag = Fragment::parse(html);
        display_pass(&mut frag.children, "color: blue;");
        frag.to_html()
    }

    fn storage(html: &str) -> String {
        let mut frag = Fragment::parse(html);
        storage_pass(&mut frag.children);
        frag.to_html()
    }

    #[test]
    fn test_find_tokens() {
        let text = "Hi [[A]] and [[B C]], not [[]] or [x]";
        let found: Vec<_> = find_tokens(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(found, vec!["[[A]]", "[[B C]]"]);
        assert!(is_token("[[CUSTOMER_ID]]"));
        assert!(!is_token("[[CUSTOMER_ID]] "));
        assert!(!is_token("[[a]b]]"));
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("[[A]]"), "[[A]]");
        assert_eq!(normalize_token(" CUSTOMER_ID "), "[[CUSTOMER_ID]]");
        assert_eq!(normalize_token("[B"), "[[B]]");
        assert!(!is_token(&normalize_token("")));
        assert_eq!(PlaceholderEntry::new("Plan", "RATE_PLAN").token(), "[[RATE_PLAN]]");
    }

    #[test]
    fn test_display_pass_splits_text() {
        assert_eq!(
            display("<p>Hi [[CUSTOMER_ID]]!</p>"),
            "<p>Hi <span class=\"placeholder-chip\" contenteditable=\"false\" \
             data-placeholder=\"[[CUSTOMER_ID]]\" style=\"color: blue;\">[[CUSTOMER_ID]]</span>!</p>"
        );
    }

    #[test]
    fn test_display_pass_is_idempotent() {
        let once = display("<p>[[A]][[B]]</p>");
        assert_eq!(display(&once), once);
    }

    #[test]
    fn test_display_pass_skips_attributes_and_raw_text() {
        let html = "<p><a href=\"https://x.test/?id=[[ID]]\" title=\"[[T]]\">go</a></p><style>.a::after{content:\"[[S]]\"}</style>";
        assert_eq!(display(html), html);
    }

    #[test]
    fn test_storage_pass_reverts_chips() {
        let shown = display("<p>Dear [[NAME]], ref [[REF]].</p>");
        assert_eq!(storage(&shown), "<p>Dear [[NAME]], ref [[REF]].</p>");
    }

    #[test]
    fn test_storage_pass_malformed_chip_is_inert() {
        let html = "<p><span class=\"placeholder-chip big\" contenteditable=\"false\" data-placeholder=\"[[A]]\" style=\"color: red\">[[A</span></p>";
        assert_eq!(storage(html), "<p><span class=\"big\">[[A</span></p>");
    }

    #[test]
    fn test_collect_tokens() {
        let frag = Fragment::parse(&display("<p>[[A]] x [[B]]</p><p><b>[[C]]</b></p>"));
        assert_eq!(collect_tokens(&frag.children), vec!["[[A]]", "[[B]]", "[[C]]"]);
    }

    #[test]
    fn test_filter_catalog() {
        let catalog = vec![
            PlaceholderEntry::new("Customer ID", "[[CUSTOMER_ID]]"),
            PlaceholderEntry::new("First name", "[[FIRST_NAME]]").with_description("Given name"),
            PlaceholderEntry::new("Rate plan", "[[RATE]]"),
        ];
        let labels = |q: &str| -> Vec<String> {
            filter_catalog(&catalog, q).iter().map(|e| e.label.clone()).collect()
        };
        assert_eq!(labels("").len(), 3);
        assert_eq!(labels("CUST"), vec!["Customer ID"]);
        assert_eq!(labels("name"), vec!["First name"]);
        assert_eq!(labels("rate]]"), vec!["Rate plan"]);
        assert!(labels("zzz").is_empty());
    }
}
