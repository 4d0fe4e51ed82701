//! Tolerant HTML fragment parsing and `innerHTML`-style serialization.
//!
//! The parser never fails. It repairs the usual breakage found in stored
//! templates and hand-edited source: unclosed elements are closed at end of
//! input, stray end tags are dropped, an open `<p>` is closed by a block
//! start tag, and list items, rows and cells close their open siblings.

use crate::dom::{Attribute, Element, Node, RAW_TEXT_TAGS, is_inline_tag, is_void_tag};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Start {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    End(String),
    Comment(String),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    /// Set after a raw-text start tag; the next token reads up to its end tag.
    raw_until: Option<String>,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_until: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn next_token(&mut self) -> Option<Token> {
        if let Some(tag) = self.raw_until.take() {
            return self.raw_text(&tag);
        }

        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            let (comment, consumed) = match body.find("-->") {
                Some(end) => (&body[..end], 4 + end + 3),
                None => (body, rest.len()),
            };
            self.pos += consumed;
            return Some(Token::Comment(comment.to_string()));
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            // Doctype and processing instructions carry nothing for a fragment.
            self.skip_past('>');
            return self.next_token();
        }

        if let Some(after) = rest.strip_prefix("</") {
            if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.pos += 2;
                let name = self.take_name();
                self.skip_past('>');
                return Some(Token::End(name));
            }
        }

        if let Some(after) = rest.strip_prefix('<') {
            if after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                self.pos += 1;
                return Some(self.start_tag());
            }
        }

        // Literal text up to the next thing that looks like markup.
        let mut end = rest.len();
        for (idx, _) in rest.char_indices().skip(1) {
            let tail = &rest[idx..];
            if tail.starts_with('<') && looks_like_markup(&tail[1..]) {
                end = idx;
                break;
            }
        }
        self.pos += end;
        Some(Token::Text(decode_entities(&rest[..end])))
    }

    fn raw_text(&mut self, tag: &str) -> Option<Token> {
        let rest = self.rest();
        let close = format!("</{tag}");
        let end = find_ignore_ascii_case(rest, &close).unwrap_or(rest.len());
        self.pos += end;
        if end == 0 {
            return self.next_token();
        }
        Some(Token::Text(rest[..end].to_string()))
    }

    fn take_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn skip_past(&mut self, ch: char) {
        let rest = self.rest();
        self.pos += rest.find(ch).map(|i| i + ch.len_utf8()).unwrap_or(rest.len());
    }

    fn start_tag(&mut self) -> Token {
        let name = self.take_name();
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_end = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            let attr_name = rest[..name_end].to_ascii_lowercase();
            self.pos += name_end;
            self.skip_whitespace();

            let mut value = String::new();
            if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                value = self.attr_value();
            }

            // First occurrence wins, as in browsers.
            if !attr_name.is_empty() && !attrs.iter().any(|a| a.name == attr_name.as_str()) {
                attrs.push(Attribute::new(attr_name, value));
            }
        }

        if !self_closing && RAW_TEXT_TAGS.contains(&name.as_str()) {
            self.raw_until = Some(name.clone());
        }

        Token::Start {
            name,
            attrs,
            self_closing,
        }
    }

    fn attr_value(&mut self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                self.pos += 1 + end + if end < body.len() { 1 } else { 0 };
                decode_entities(&body[..end])
            }
            Some(_) => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                decode_entities(&rest[..end])
            }
            None => String::new(),
        }
    }
}

fn looks_like_markup(after_lt: &str) -> bool {
    after_lt.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!' || c == '?')
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Decode the character references that show up in templates.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];
        let decoded = candidate
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| decode_reference(&candidate[..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "euro" => '\u{20ac}',
        _ => return None,
    })
}

/// Builds a node tree from tokens with an open-element stack.
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn push_node(&mut self, node: Node) {
        let children = match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        };
        if let (Node::Text(new), Some(Node::Text(prev))) = (&node, children.last_mut()) {
            prev.push_str(new);
            return;
        }
        children.push(node);
    }

    fn close_top(&mut self) {
        if let Some(el) = self.stack.pop() {
            self.push_node(Node::Element(el));
        }
    }

    /// Close open elements down to and including the nearest `tag`, unless a
    /// `boundary` element is hit first.
    fn close_until(&mut self, tags: &[&str], boundaries: &[&str]) {
        let found = self.stack.iter().rposition(|el| {
            tags.contains(&el.tag.as_str()) || boundaries.contains(&el.tag.as_str())
        });
        if let Some(idx) = found {
            if tags.contains(&self.stack[idx].tag.as_str()) {
                while self.stack.len() > idx {
                    self.close_top();
                }
            }
        }
    }

    fn start(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) {
        if !is_inline_tag(&name) && self.stack.last().is_some_and(|el| el.tag == "p") {
            self.close_top();
        }
        match name.as_str() {
            "li" => self.close_until(&["li"], &["ul", "ol"]),
            "td" | "th" => self.close_until(&["td", "th"], &["tr", "table"]),
            "tr" => self.close_until(&["tr"], &["table", "tbody", "thead", "tfoot"]),
            _ => {}
        }

        let mut el = Element::new(&name);
        el.attrs = attrs;
        if self_closing || is_void_tag(&name) {
            self.push_node(Node::Element(el));
        } else {
            self.stack.push(el);
        }
    }

    fn end(&mut self, name: &str) {
        if let Some(idx) = self.stack.iter().rposition(|el| el.tag == name) {
            while self.stack.len() > idx {
                self.close_top();
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.root
    }
}

/// Parse an HTML fragment into nodes.
pub fn parse_fragment(source: &str) -> Vec<Node> {
    let mut tokenizer = Tokenizer::new(source);
    let mut builder = TreeBuilder::new();

    while let Some(token) = tokenizer.next_token() {
        match token {
            Token::Text(text) => {
                if !text.is_empty() {
                    builder.push_node(Node::Text(text));
                }
            }
            Token::Comment(comment) => builder.push_node(Node::Comment(comment)),
            Token::Start {
                name,
                attrs,
                self_closing,
            } => builder.start(name, attrs, self_closing),
            Token::End(name) => builder.end(&name),
        }
    }

    builder.finish()
}

/// Serialize nodes the way `innerHTML` reads them back.
pub fn serialize_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, false);
    }
    out
}

fn write_node(out: &mut String, node: &Node, raw: bool) {
    match node {
        Node::Text(text) if raw => out.push_str(text),
        Node::Text(text) => escape_text_into(out, text),
        Node::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attr_into(out, &attr.value);
                out.push('"');
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            let raw = RAW_TEXT_TAGS.contains(&el.tag.as_str());
            for child in &el.children {
                write_node(out, child, raw);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn escape_text_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &str) -> String {
        serialize_nodes(&parse_fragment(src))
    }

    #[test]
    fn test_well_formed_roundtrip() {
        let src = r#"<p class="x">Hi <b>there</b><br></p><ul><li>one</li></ul>"#;
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn test_attribute_forms() {
        assert_eq!(
            roundtrip("<a href=https://x.test/?a=1&amp;b=2 target='_blank' download>x</a>"),
            r#"<a href="https://x.test/?a=1&amp;b=2" target="_blank" download="">x</a>"#
        );
    }

    #[test]
    fn test_entities() {
        let nodes = parse_fragment("a &amp; b &lt;c&gt; &nbsp;&#65;&#x42; &bogus; & done");
        assert_eq!(nodes, vec![Node::text("a & b <c> \u{a0}AB &bogus; & done")]);
        assert_eq!(
            serialize_nodes(&nodes),
            "a &amp; b &lt;c&gt; &nbsp;AB &amp;bogus; &amp; done"
        );
    }

    #[test]
    fn test_repairs_markup() {
        assert_eq!(roundtrip("<p>one<p>two"), "<p>one</p><p>two</p>");
        assert_eq!(roundtrip("<p>a</b>c</p>"), "<p>ac</p>");
        assert_eq!(roundtrip("<ul><li>a<li>b</ul>"), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(roundtrip("<p>x<div>y</div>"), "<p>x</p><div>y</div>");
        assert_eq!(roundtrip("<br/><img src=\"a.png\" />"), "<br><img src=\"a.png\">");
    }

    #[test]
    fn test_comments_and_doctype() {
        assert_eq!(
            roundtrip("<!DOCTYPE html><!--[if mso]>x<![endif]--><p>a</p>"),
            "<!--[if mso]>x<![endif]--><p>a</p>"
        );
    }

    #[test]
    fn test_raw_text() {
        assert_eq!(
            roundtrip("<style>p > a { color: red; }</style><p>&lt;</p>"),
            "<style>p > a { color: red; }</style><p>&lt;</p>"
        );
    }

    #[test]
    fn test_stray_angle_bracket_is_text() {
        assert_eq!(roundtrip("1 < 2 and 3 > 2"), "1 &lt; 2 and 3 &gt; 2");
    }
}
