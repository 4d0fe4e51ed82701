//! Flattened view of a segment's inline content.
//!
//! A segment's nodes are flattened into [`InlineRun`]s: a piece of text or an
//! atom, plus the stack of inline elements (marks) wrapping it, outermost
//! first. Edits operate on runs and [`rebuild`] turns them back into nodes,
//! grouping consecutive runs that share a mark and merging adjacent text.

use smol_str::SmolStr;

use crate::dom::{Element, Node, parse_style};
use crate::placeholder::is_chip;

/// An inline wrapping element without its children (`<b>`, `<a href>`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark(Element);

impl Mark {
    pub fn new(tag: &str) -> Self {
        Self(Element::new(tag))
    }

    pub fn with_attr(self, name: &str, value: impl Into<String>) -> Self {
        Self(self.0.with_attr(name, value))
    }

    pub fn from_element(el: &Element) -> Self {
        Self(Element {
            tag: el.tag.clone(),
            attrs: el.attrs.clone(),
            children: Vec::new(),
        })
    }

    pub fn tag(&self) -> &SmolStr {
        &self.0.tag
    }

    pub fn element(&self) -> &Element {
        &self.0
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.0.attr(name)
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.0.style_property(property)
    }

    pub fn is_link(&self) -> bool {
        self.0.tag == "a"
    }

    /// A `<span>` setting `font-family`.
    pub fn font_family(&self) -> Option<String> {
        if self.0.tag != "span" {
            return None;
        }
        self.style_property("font-family")
    }

    /// Remove one CSS property from the mark's style. Returns false when the
    /// mark is left as an attribute-less `<span>` that should be dropped.
    fn remove_style_property(&mut self, property: &str) -> bool {
        let Some(style) = self.0.attr("style") else {
            return true;
        };
        let rest: Vec<String> = parse_style(style)
            .into_iter()
            .filter(|(name, _)| name != property)
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        if rest.is_empty() {
            self.0.remove_attr("style");
        } else {
            self.0.set_attr("style", format!("{};", rest.join("; ")));
        }
        !(self.0.tag == "span" && self.0.attrs.is_empty())
    }

    fn wrap(self, children: Vec<Node>) -> Node {
        Node::Element(self.0.with_children(children))
    }
}

/// The three inline toggles on the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineFormat {
    Bold,
    Italic,
    Underline,
}

impl InlineFormat {
    pub fn tag(self) -> &'static str {
        match self {
            InlineFormat::Bold => "b",
            InlineFormat::Italic => "i",
            InlineFormat::Underline => "u",
        }
    }

    pub fn mark(self) -> Mark {
        Mark::new(self.tag())
    }

    fn style(self) -> (&'static str, &'static [&'static str]) {
        match self {
            InlineFormat::Bold => ("font-weight", &["bold", "bolder", "600", "700", "800", "900"]),
            InlineFormat::Italic => ("font-style", &["italic", "oblique"]),
            InlineFormat::Underline => ("text-decoration", &["underline"]),
        }
    }

    /// Whether a mark renders this format, by tag or by inline style.
    pub fn matches(self, mark: &Mark) -> bool {
        let by_tag = match self {
            InlineFormat::Bold => matches!(mark.tag().as_str(), "b" | "strong"),
            InlineFormat::Italic => matches!(mark.tag().as_str(), "i" | "em"),
            InlineFormat::Underline => mark.tag() == "u",
        };
        if by_tag {
            return true;
        }
        let (property, values) = self.style();
        mark.style_property(property).is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            values.iter().any(|v| value.split_ascii_whitespace().any(|w| w == *v))
        })
    }

    pub fn is_set(self, marks: &[Mark]) -> bool {
        marks.iter().any(|m| self.matches(m))
    }

    /// Drop every mark rendering this format. Styled spans lose only the
    /// matching property.
    pub fn strip(self, marks: &mut Vec<Mark>) {
        let (property, _) = self.style();
        marks.retain_mut(|mark| {
            if !self.matches(mark) {
                return true;
            }
            if mark.style_property(property).is_some() && mark.tag() == "span" {
                return mark.remove_style_property(property);
            }
            false
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    /// One unit that cursor movement and deletion treat as a whole.
    Atom(Node),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRun {
    pub marks: Vec<Mark>,
    pub content: RunContent,
}

impl InlineRun {
    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            marks,
            content: RunContent::Text(text.into()),
        }
    }

    pub fn atom(node: Node, marks: Vec<Mark>) -> Self {
        Self {
            marks,
            content: RunContent::Atom(node),
        }
    }

    /// Content units: one per char, one per atom, none for comments.
    pub fn len(&self) -> usize {
        match &self.content {
            RunContent::Text(text) => text.chars().count(),
            RunContent::Atom(Node::Comment(_)) => 0,
            RunContent::Atom(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inline elements that are a single unit rather than a container of runs.
pub fn is_atomic_element(el: &Element) -> bool {
    el.is_void()
        || !el.is_inline()
        || is_chip(el)
        || el.attr("contenteditable") == Some("false")
        || el.contains_block()
}

/// Flatten inline nodes into runs.
pub fn flatten(nodes: &[Node]) -> Vec<InlineRun> {
    let mut out = Vec::new();
    let mut marks = Vec::new();
    flatten_into(nodes, &mut marks, &mut out);
    out
}

fn flatten_into(nodes: &[Node], marks: &mut Vec<Mark>, out: &mut Vec<InlineRun>) {
    for node in nodes {
        match node {
            Node::Text(text) if text.is_empty() => {}
            Node::Text(text) => out.push(InlineRun::text(text.clone(), marks.clone())),
            Node::Comment(_) => out.push(InlineRun::atom(node.clone(), marks.clone())),
            Node::Element(el) if is_atomic_element(el) => {
                out.push(InlineRun::atom(node.clone(), marks.clone()))
            }
            Node::Element(el) => {
                marks.push(Mark::from_element(el));
                flatten_into(&el.children, marks, out);
                marks.pop();
            }
        }
    }
}

/// Turn runs back into nodes.
pub fn rebuild(runs: Vec<InlineRun>) -> Vec<Node> {
    build_level(runs, 0)
}

fn build_level(runs: Vec<InlineRun>, depth: usize) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut iter = runs.into_iter().peekable();
    while let Some(run) = iter.next() {
        if let Some(mark) = run.marks.get(depth).cloned() {
            let mut group = vec![run];
            while let Some(next) = iter.next_if(|n| n.marks.get(depth) == Some(&mark)) {
                group.push(next);
            }
            let children = build_level(group, depth + 1);
            if !children.is_empty() {
                out.push(mark.wrap(children));
            }
            continue;
        }
        match run.content {
            RunContent::Text(text) if text.is_empty() => {}
            RunContent::Text(text) => match out.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(&text),
                _ => out.push(Node::Text(text)),
            },
            RunContent::Atom(node) => out.push(node),
        }
    }
    out
}

pub fn runs_len(runs: &[InlineRun]) -> usize {
    runs.iter().map(InlineRun::len).sum()
}

/// Split runs at a unit offset, cutting a text run in two if needed.
pub fn split_runs(runs: Vec<InlineRun>, at: usize) -> (Vec<InlineRun>, Vec<InlineRun>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut pos = 0;
    for run in runs {
        let len = run.len();
        if pos + len <= at {
            pos += len;
            head.push(run);
        } else if pos >= at {
            pos += len;
            tail.push(run);
        } else {
            let cut = at - pos;
            pos += len;
            match run.content {
                RunContent::Text(text) => {
                    let byte = text.char_indices().nth(cut).map_or(text.len(), |(i, _)| i);
                    head.push(InlineRun::text(&text[..byte], run.marks.clone()));
                    tail.push(InlineRun::text(&text[byte..], run.marks));
                }
                RunContent::Atom(_) => tail.push(run),
            }
        }
    }
    (head, tail)
}

/// Split runs into the pieces before, inside and after `start..end`.
pub fn split_range(
    runs: Vec<InlineRun>,
    start: usize,
    end: usize,
) -> (Vec<InlineRun>, Vec<InlineRun>, Vec<InlineRun>) {
    let (head, rest) = split_runs(runs, start);
    let (mid, tail) = split_runs(rest, end.saturating_sub(start));
    (head, mid, tail)
}

/// Remove `start..end`, returning the remaining runs.
pub fn remove_range(runs: Vec<InlineRun>, start: usize, end: usize) -> Vec<InlineRun> {
    let (mut head, _, tail) = split_range(runs, start, end);
    head.extend(tail);
    head
}

/// Insert runs at a unit offset.
pub fn insert_runs_at(runs: Vec<InlineRun>, at: usize, insert: Vec<InlineRun>) -> Vec<InlineRun> {
    let (mut head, tail) = split_runs(runs, at);
    head.extend(insert);
    head.extend(tail);
    head
}

/// The non-empty run covering the unit just before / just after `at`.
pub fn run_before(runs: &[InlineRun], at: usize) -> Option<&InlineRun> {
    let mut pos = 0;
    let mut found = None;
    for run in runs {
        let len = run.len();
        if len > 0 && pos < at {
            found = Some(run);
        }
        pos += len;
        if pos >= at {
            break;
        }
    }
    found
}

pub fn run_after(runs: &[InlineRun], at: usize) -> Option<&InlineRun> {
    let mut pos = 0;
    for run in runs {
        let len = run.len();
        if len > 0 && pos + len > at {
            return Some(run);
        }
        pos += len;
    }
    None
}

/// Marks new text typed at `at` picks up: those of the preceding run, minus
/// any link the caret is only touching from outside.
pub fn marks_for_text(runs: &[InlineRun], at: usize) -> Vec<Mark> {
    let after = run_after(runs, at);
    let Some(before) = run_before(runs, at) else {
        return after
            .map(|run| run.marks.iter().filter(|m| !m.is_link()).cloned().collect())
            .unwrap_or_default();
    };
    before
        .marks
        .iter()
        .filter(|mark| !mark.is_link() || after.is_some_and(|a| a.marks.contains(*mark)))
        .cloned()
        .collect()
}

/// Marks shared by both neighbours of `at`, for inserting atoms.
pub fn marks_for_atom(runs: &[InlineRun], at: usize) -> Vec<Mark> {
    match (run_before(runs, at), run_after(runs, at)) {
        (Some(before), Some(after)) => before
            .marks
            .iter()
            .zip(&after.marks)
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// Plain text of the runs, atoms rendered as U+FFFC.
pub fn runs_text(runs: &[InlineRun]) -> String {
    runs.iter()
        .map(|run| match &run.content {
            RunContent::Text(text) => text.clone(),
            RunContent::Atom(Node::Comment(_)) => String::new(),
            RunContent::Atom(_) => '\u{fffc}'.to_string(),
        })
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word around `at` when the caret sits strictly inside one.
pub fn word_around(runs: &[InlineRun], at: usize) -> Option<(usize, usize)> {
    let chars: Vec<char> = runs_text(runs).chars().collect();
    let inside = at > 0
        && at < chars.len()
        && is_word_char(chars[at - 1])
        && is_word_char(chars[at]);
    if !inside {
        return None;
    }
    let mut start = at;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = at;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Fragment;
    use crate::html::serialize_nodes;

    fn runs_of(html: &str) -> Vec<InlineRun> {
        flatten(&Fragment::parse(html).children)
    }

    fn html_of(runs: Vec<InlineRun>) -> String {
        serialize_nodes(&rebuild(runs))
    }

    #[test]
    fn test_flatten_rebuild_roundtrip() {
        for html in [
            "plain",
            "a <b>bold <i>both</i></b> c",
            "<a href=\"#\">link</a><br>x",
            "x<span class=\"placeholder-chip\" data-placeholder=\"[[A]]\">[[A]]</span>y",
        ] {
            assert_eq!(html_of(runs_of(html)), html);
        }
    }

    #[test]
    fn test_lengths() {
        let runs = runs_of("ab<br><span contenteditable=\"false\">chip</span>ç<!--x-->");
        assert_eq!(runs_len(&runs), 5);
    }

    #[test]
    fn test_rebuild_merges_adjacent() {
        let runs = vec![
            InlineRun::text("a", vec![Mark::new("b")]),
            InlineRun::text("b", vec![Mark::new("b")]),
            InlineRun::text("c", vec![]),
            InlineRun::text("d", vec![]),
        ];
        assert_eq!(html_of(runs), "<b>ab</b>cd");
    }

    #[test]
    fn test_split_and_remove() {
        let runs = runs_of("hello <b>world</b>");
        let (head, tail) = split_runs(runs.clone(), 8);
        assert_eq!(html_of(head), "hello <b>wo</b>");
        assert_eq!(html_of(tail), "<b>rld</b>");
        assert_eq!(html_of(remove_range(runs, 2, 8)), "he<b>rld</b>");
    }

    #[test]
    fn test_atoms_are_not_split() {
        let runs = runs_of("a<br>b");
        assert_eq!(html_of(remove_range(runs.clone(), 1, 2)), "ab");
        let (head, tail) = split_runs(runs, 1);
        assert_eq!(html_of(head), "a");
        assert_eq!(html_of(tail), "<br>b");
    }

    #[test]
    fn test_marks_for_text() {
        let runs = runs_of("<b>bold</b><a href=\"#\">link</a>");
        let tags = |marks: Vec<Mark>| -> Vec<String> {
            marks.iter().map(|m| m.tag().to_string()).collect()
        };
        assert_eq!(tags(marks_for_text(&runs, 4)), vec!["b"]);
        assert_eq!(tags(marks_for_text(&runs, 6)), vec!["a"]);
        assert!(marks_for_text(&runs, 8).is_empty());
        assert!(marks_for_text(&runs, 0).contains(&Mark::new("b")));
    }

    #[test]
    fn test_inline_format_matching() {
        let styled = Mark::new("span").with_attr("style", "font-weight: 700; color: red");
        assert!(InlineFormat::Bold.matches(&styled));
        assert!(InlineFormat::Bold.matches(&Mark::new("strong")));
        assert!(!InlineFormat::Italic.matches(&styled));

        let mut marks = vec![Mark::new("strong"), styled, Mark::new("i")];
        InlineFormat::Bold.strip(&mut marks);
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].attr("style"), Some("color: red;"));
        assert_eq!(marks[1].tag(), "i");
    }

    #[test]
    fn test_word_around() {
        let runs = runs_of("say hello<br>x");
        assert_eq!(word_around(&runs, 6), Some((4, 9)));
        assert_eq!(word_around(&runs, 4), None);
        assert_eq!(word_around(&runs, 9), None);
    }
}
