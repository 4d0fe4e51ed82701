//! Owned HTML document tree.
//!
//! A [`Fragment`] stands in for the live editable surface: the list of nodes
//! that would sit inside a `<body>`. Nodes are addressed by paths of child
//! indices starting at the fragment root.

use smol_str::SmolStr;

use crate::html;

/// Path of child indices from the fragment root. The empty path is the root.
pub type NodePath = Vec<usize>;

/// Elements that never have children or an end tag.
pub const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements laid out inline. Anything not listed is treated as a block.
pub const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "big", "br", "cite", "code", "data", "dfn", "em", "font",
    "i", "img", "input", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strike",
    "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

/// Blocks whose direct content is text and that can be retagged by a block format change.
pub const TEXT_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "pre", "blockquote", "address",
];

/// Elements whose text content is not entity-escaped.
pub const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub fn is_inline_tag(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

pub fn is_text_block_tag(tag: &str) -> bool {
    TEXT_BLOCK_TAGS.contains(&tag)
}

pub fn is_list_tag(tag: &str) -> bool {
    tag == "ul" || tag == "ol"
}

pub fn is_table_cell_tag(tag: &str) -> bool {
    tag == "td" || tag == "th"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An element node. Tag and attribute names are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = value,
            None => self
                .attrs
                .push(Attribute::new(name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(idx).value)
    }

    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }

    pub fn is_inline(&self) -> bool {
        is_inline_tag(&self.tag)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Look up a CSS property in the inline `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<String> {
        let style = self.attr("style")?;
        parse_style(style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Whether any descendant is a block-level element.
    pub fn contains_block(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(el) => !el.is_inline() || el.contains_block(),
            _ => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        self.as_element().map(|el| &el.children)
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.as_element_mut().map(|el| &mut el.children)
    }

    /// Text, comments and inline elements flow inline; everything else is a block.
    pub fn is_inline(&self) -> bool {
        match self {
            Node::Element(el) => el.is_inline(),
            Node::Text(_) | Node::Comment(_) => true,
        }
    }

    /// Nodes that contribute nothing visible between blocks.
    pub fn is_insignificant(&self) -> bool {
        match self {
            Node::Text(text) => text.chars().all(char::is_whitespace),
            Node::Comment(_) => true,
            Node::Element(_) => false,
        }
    }

    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self, Node::Element(el) if el.tag == tag)
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Element(el) => el.text_content(),
            Node::Text(text) => text.clone(),
            Node::Comment(_) => String::new(),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Comment(_) => {}
        }
    }
}

/// Split an inline `style` attribute into `(property, value)` pairs.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

/// The body content of a document: an ordered list of root nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub children: Vec<Node>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Parse an HTML fragment. Never fails; malformed markup is repaired.
    pub fn parse(source: &str) -> Self {
        Self {
            children: html::parse_fragment(source),
        }
    }

    /// Serialize back to HTML, equivalent to reading `innerHTML`.
    pub fn to_html(&self) -> String {
        html::serialize_nodes(&self.children)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        self.children_at(parents)?.get(*last)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (last, parents) = path.split_last()?;
        self.children_at_mut(parents)?.get_mut(*last)
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        self.node_mut(path).and_then(Node::as_element_mut)
    }

    /// Children of the container at `path`; the empty path yields the root list.
    pub fn children_at(&self, path: &[usize]) -> Option<&Vec<Node>> {
        let mut children = &self.children;
        for idx in path {
            children = children.get(*idx)?.children()?;
        }
        Some(children)
    }

    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        let mut children = &mut self.children;
        for idx in path {
            children = children.get_mut(*idx)?.children_mut()?;
        }
        Some(children)
    }

    /// Elements along `path`, outermost first, including the one at `path`.
    pub fn ancestors(&self, path: &[usize]) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut children = &self.children;
        for idx in path {
            let Some(Node::Element(el)) = children.get(*idx) else {
                break;
            };
            out.push(el);
            children = &el.children;
        }
        out
    }

    /// Path of the nearest element along `path` (inclusive) matching `pred`.
    pub fn nearest_ancestor(
        &self,
        path: &[usize],
        pred: impl Fn(&Element) -> bool,
    ) -> Option<NodePath> {
        let ancestors = self.ancestors(path);
        ancestors
            .iter()
            .rposition(|el| pred(*el))
            .map(|depth| path[..=depth].to_vec())
    }

    /// Visit every element in document order.
    pub fn for_each_element_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        visit_elements_mut(&mut self.children, f);
    }

    pub fn for_each_element(&self, f: &mut impl FnMut(&Element)) {
        visit_elements(&self.children, f);
    }
}

fn visit_elements_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit_elements_mut(&mut el.children, f);
        }
    }
}

fn visit_elements(nodes: &[Node], f: &mut impl FnMut(&Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit_elements(&el.children, f);
        }
    }
}
