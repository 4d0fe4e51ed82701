//! Command execution for rich documents.
//!
//! `execute_command` applies an [`EditorCommand`] to a [`RichDocument`] and
//! its selection. Commands that need state outside the document (history,
//! clipboard, popovers) are left to [`crate::editor::HtmlEditor`].

use crate::actions::{EditorCommand, Range};
use crate::document::RichDocument;
use crate::dom::{Element, Node};
use crate::format::ListKind;
use crate::placeholder::{DEFAULT_CHIP_STYLE, chip_element, is_token, normalize_token};
use crate::runs::{InlineFormat, InlineRun, Mark};
use crate::toolbar::DEFAULT_LINK_URL;
use crate::types::Selection;

/// Inline style for call-to-action buttons. Email clients drop `<style>`
/// blocks, so everything travels on the anchor.
pub const BUTTON_STYLE: &str = "display: inline-block; padding: 10px 20px; background-color: #1a73e8; color: #ffffff; text-decoration: none; border-radius: 4px; font-weight: bold;";

const TABLE_STYLE: &str = "border-collapse: collapse; width: 100%;";
const CELL_STYLE: &str = "border: 1px solid #dddddd; padding: 8px;";

/// Settings commands need from the editor configuration.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub chip_style: &'a str,
}

impl Default for CommandContext<'_> {
    fn default() -> Self {
        Self {
            chip_style: DEFAULT_CHIP_STYLE,
        }
    }
}

/// Execute a command on a document.
///
/// This is the central dispatch point for document edits. Returns true if the
/// command was handled.
pub fn execute_command(doc: &mut RichDocument, command: &EditorCommand, ctx: CommandContext<'_>) -> bool {
    match command {
        EditorCommand::InsertText { text, range } => execute_insert(doc, text, *range),
        EditorCommand::InsertLineBreak { range } => execute_insert_line_break(doc, *range),
        EditorCommand::InsertParagraph { range } => execute_insert_paragraph(doc, *range),
        EditorCommand::DeleteBackward { range } => execute_delete_backward(doc, *range),
        EditorCommand::DeleteForward { range } => execute_delete_forward(doc, *range),
        EditorCommand::DeleteWordBackward { range } => execute_delete_word_backward(doc, *range),
        EditorCommand::DeleteWordForward { range } => execute_delete_word_forward(doc, *range),
        EditorCommand::ToggleBold => execute_toggle_inline(doc, InlineFormat::Bold),
        EditorCommand::ToggleItalic => execute_toggle_inline(doc, InlineFormat::Italic),
        EditorCommand::ToggleUnderline => execute_toggle_inline(doc, InlineFormat::Underline),
        EditorCommand::ToggleOrderedList => execute_toggle_list(doc, ListKind::Ordered),
        EditorCommand::ToggleUnorderedList => execute_toggle_list(doc, ListKind::Unordered),
        EditorCommand::SetBlockFormat(format) => {
            doc.set_block_format(doc.selection().to_range(), *format);
            true
        }
        EditorCommand::SetFontFamily(family) => execute_set_font_family(doc, family),
        EditorCommand::InsertLink { href } => execute_insert_link(doc, href),
        EditorCommand::InsertButton { text, href } => execute_insert_button(doc, text, href),
        EditorCommand::InsertTable => execute_insert_table(doc),
        EditorCommand::InsertPlaceholder { token } => execute_insert_placeholder(doc, token, ctx),
        EditorCommand::SelectAll => {
            doc.set_selection(Selection::new(0, doc.len()));
            true
        }
        EditorCommand::MoveCursor { offset } => {
            doc.set_cursor(*offset);
            true
        }
        EditorCommand::ExtendSelection { offset } => {
            let anchor = doc.selection().anchor;
            doc.set_selection(Selection::new(anchor, *offset));
            true
        }
        EditorCommand::Undo
        | EditorCommand::Redo
        | EditorCommand::Paste { .. }
        | EditorCommand::OpenPopover(_)
        | EditorCommand::ClosePopover => {
            // Handled by the editor, which owns history, clipboard and toolbar.
            false
        }
    }
}

/// Delete the range if it is a selection. Returns the insertion point.
fn clear_range(doc: &mut RichDocument, range: Range) -> usize {
    let range = range.normalize();
    if range.is_caret() {
        range.start.min(doc.len())
    } else {
        doc.delete_range(range.into())
    }
}

/// Insert text where `\n` becomes a `<br>`. Returns the offset after it.
pub(crate) fn insert_plain_text(doc: &mut RichDocument, offset: usize, text: &str) -> usize {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut cursor = offset;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            cursor = doc.insert_atom(cursor, Element::new("br").into());
        }
        cursor = doc.insert_text(cursor, line);
    }
    cursor
}

fn execute_insert(doc: &mut RichDocument, text: &str, range: Range) -> bool {
    let at = clear_range(doc, range);
    let cursor = insert_plain_text(doc, at, text);
    doc.set_cursor(cursor);
    true
}

fn execute_insert_line_break(doc: &mut RichDocument, range: Range) -> bool {
    let at = clear_range(doc, range);
    let cursor = doc.insert_atom(at, Element::new("br").into());
    doc.set_cursor(cursor);
    true
}

fn execute_insert_paragraph(doc: &mut RichDocument, range: Range) -> bool {
    let at = clear_range(doc, range);
    let cursor = doc.insert_paragraph(at);
    doc.set_cursor(cursor);
    true
}

fn execute_delete_backward(doc: &mut RichDocument, range: Range) -> bool {
    let range = range.normalize();
    if !range.is_caret() {
        let cursor = doc.delete_range(range.into());
        doc.set_cursor(cursor);
        return true;
    }
    if range.start == 0 {
        return false;
    }
    // Backspace at the start of a table cell stays put.
    if doc.crosses_cells(range.start - 1, range.start) {
        return false;
    }
    let cursor = doc.delete_range(range.start - 1..range.start);
    doc.set_cursor(cursor);
    true
}

fn execute_delete_forward(doc: &mut RichDocument, range: Range) -> bool {
    let range = range.normalize();
    if !range.is_caret() {
        let cursor = doc.delete_range(range.into());
        doc.set_cursor(cursor);
        return true;
    }
    if range.start >= doc.len() || doc.crosses_cells(range.start, range.start + 1) {
        return false;
    }
    let cursor = doc.delete_range(range.start..range.start + 1);
    doc.set_cursor(cursor);
    true
}

fn execute_delete_word_backward(doc: &mut RichDocument, range: Range) -> bool {
    let range = range.normalize();
    if !range.is_caret() {
        return execute_delete_backward(doc, range);
    }
    let start = find_word_boundary_backward(doc, range.start);
    if start == range.start.saturating_sub(1) {
        return execute_delete_backward(doc, range);
    }
    let cursor = doc.delete_range(start..range.start);
    doc.set_cursor(cursor);
    true
}

fn execute_delete_word_forward(doc: &mut RichDocument, range: Range) -> bool {
    let range = range.normalize();
    if !range.is_caret() {
        return execute_delete_forward(doc, range);
    }
    let end = find_word_boundary_forward(doc, range.start);
    if end == range.start + 1 {
        return execute_delete_forward(doc, range);
    }
    let cursor = doc.delete_range(range.start..end);
    doc.set_cursor(cursor);
    true
}

/// Start of the word before `offset`, skipping whitespace first. Falls back
/// to one unit back at a segment start.
fn find_word_boundary_backward(doc: &RichDocument, offset: usize) -> usize {
    let mut pos = offset;
    while pos > 0 && doc.char_before(pos).is_some_and(char::is_whitespace) {
        pos -= 1;
    }
    while pos > 0 && doc.char_before(pos).is_some_and(|c| !c.is_whitespace()) {
        pos -= 1;
    }
    if pos == offset { offset.saturating_sub(1) } else { pos }
}

fn find_word_boundary_forward(doc: &RichDocument, offset: usize) -> usize {
    let mut pos = offset;
    while doc.char_after(pos).is_some_and(char::is_whitespace) {
        pos += 1;
    }
    while doc.char_after(pos).is_some_and(|c| !c.is_whitespace()) {
        pos += 1;
    }
    if pos == offset { offset + 1 } else { pos }
}

/// Toggle over the selection; a collapsed caret toggles its word, or else
/// the formatting of the next typed text.
fn execute_toggle_inline(doc: &mut RichDocument, format: InlineFormat) -> bool {
    let selection = doc.selection();
    if !selection.is_collapsed() {
        doc.toggle_inline(selection.to_range(), format);
        doc.set_selection(selection);
    } else if let Some(word) = doc.word_at(selection.head) {
        doc.toggle_inline(word, format);
        doc.set_selection(selection);
    } else {
        doc.toggle_pending(selection.head, format);
    }
    true
}

fn execute_toggle_list(doc: &mut RichDocument, kind: ListKind) -> bool {
    let selection = doc.selection();
    doc.toggle_list(selection.to_range(), kind);
    doc.set_selection(selection);
    true
}

fn execute_set_font_family(doc: &mut RichDocument, family: &str) -> bool {
    let selection = doc.selection();
    let range = if selection.is_collapsed() {
        match doc.word_at(selection.head) {
            Some(word) => word,
            None => return false,
        }
    } else {
        selection.to_range()
    };
    doc.set_font_family(range, family);
    doc.set_selection(selection);
    true
}

fn is_real_url(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && href != DEFAULT_LINK_URL
}

/// Link the selection. A collapsed caret inserts the URL itself as the link text.
fn execute_insert_link(doc: &mut RichDocument, href: &str) -> bool {
    if !is_real_url(href) {
        tracing::debug!("link skipped, no url entered");
        return false;
    }
    let href = href.trim();
    let selection = doc.selection();
    if selection.is_collapsed() {
        let link = Mark::new("a").with_attr("href", href);
        let cursor = doc.insert_runs(selection.head, vec![InlineRun::text(href, vec![link])]);
        doc.set_cursor(cursor);
    } else {
        doc.set_link(selection.to_range(), href);
        doc.set_selection(selection);
    }
    true
}

fn execute_insert_button(doc: &mut RichDocument, text: &str, href: &str) -> bool {
    if text.trim().is_empty() || !is_real_url(href) {
        tracing::debug!("button skipped, missing text or url");
        return false;
    }
    let selection = doc.selection();
    let at = clear_range(doc, selection.into());
    let anchor = Mark::new("a")
        .with_attr("href", href.trim())
        .with_attr("style", BUTTON_STYLE);
    let cursor = doc.insert_runs(at, vec![InlineRun::text(text.trim(), vec![anchor])]);
    doc.set_cursor(cursor);
    true
}

/// Fixed 3x3 table (header row plus two data rows) and a trailing paragraph.
pub fn table_skeleton() -> Vec<Node> {
    let cell = |tag: &str, text: &str| -> Node {
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        };
        Element::new(tag)
            .with_attr("style", CELL_STYLE)
            .with_children(children)
            .into()
    };
    let row = |cells: Vec<Node>| -> Node { Element::new("tr").with_children(cells).into() };

    let header = row((1..=3).map(|i| cell("th", &format!("Header {i}"))).collect());
    let body_rows = (0..2).map(|_| row((0..3).map(|_| cell("td", "")).collect())).collect();
    let table = Element::new("table")
        .with_attr("style", TABLE_STYLE)
        .with_children(vec![
            Element::new("thead").with_children(vec![header]).into(),
            Element::new("tbody").with_children(body_rows).into(),
        ]);
    vec![table.into(), Element::new("p").into()]
}

fn execute_insert_table(doc: &mut RichDocument) -> bool {
    let cursor = doc.insert_blocks(doc.cursor_offset(), table_skeleton());
    doc.set_cursor(cursor);
    true
}

fn execute_insert_placeholder(doc: &mut RichDocument, token: &str, ctx: CommandContext<'_>) -> bool {
    let token = normalize_token(token);
    if !is_token(&token) {
        tracing::warn!(%token, "not a placeholder token");
        return false;
    }
    let selection = doc.selection();
    let at = clear_range(doc, selection.into());
    let cursor = doc.insert_atom(at, chip_element(&token, ctx.chip_style).into());
    doc.set_cursor(cursor);
    true
}
