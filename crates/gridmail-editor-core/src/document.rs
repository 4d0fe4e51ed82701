//! The editable document: a [`Fragment`] plus selection, revision and
//! pending formatting.
//!
//! All edits address the document through unit offsets (see
//! [`crate::segment`]). Inline edits go through the run view of a single
//! segment; structural edits (block splits, joins, lists) live in
//! [`crate::structure`].

use std::ops::Range;

use crate::dom::{Fragment, Node, NodePath, is_table_cell_tag};
use crate::error::EditorError;
use crate::format::{BlockFormat, FormatState, ListKind, unquote_font_family};
use crate::runs::{
    InlineFormat, InlineRun, Mark, flatten, insert_runs_at, marks_for_atom, marks_for_text,
    rebuild, remove_range, runs_len, runs_text, split_range, split_runs, word_around,
};
use crate::segment::{Segment, collect_segments, locate, total_len};
use crate::types::{Selection, SelectionSnapshot};

/// Formatting toggled at a collapsed caret, applied to the next typed text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingFormat {
    pub offset: usize,
    pub add: Vec<InlineFormat>,
    pub remove: Vec<InlineFormat>,
}

impl PendingFormat {
    fn apply(&self, marks: &mut Vec<Mark>) {
        for format in &self.remove {
            format.strip(marks);
        }
        for format in &self.add {
            if !format.is_set(marks) {
                marks.push(format.mark());
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RichDocument {
    pub(crate) fragment: Fragment,
    selection: Selection,
    revision: u64,
    pending: Option<PendingFormat>,
}

impl RichDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fragment(fragment: Fragment) -> Self {
        Self {
            fragment,
            ..Self::default()
        }
    }

    pub fn parse(html: &str) -> Self {
        Self::from_fragment(Fragment::parse(html))
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Serialize the live content, chips included.
    pub fn to_html(&self) -> String {
        self.fragment.to_html()
    }

    pub fn text_content(&self) -> String {
        self.fragment.text_content()
    }

    /// Replace the whole content. Resets the selection to the start.
    pub fn replace_fragment(&mut self, fragment: Fragment) {
        self.fragment = fragment;
        self.selection = Selection::collapsed(0);
        self.pending = None;
        self.touch();
    }

    // === Revision and selection ===

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a structural mutation; invalidates outstanding snapshots.
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let selection = selection.clamped(self.len());
        let keep_pending = selection.is_collapsed()
            && self
                .pending
                .as_ref()
                .is_some_and(|p| p.offset == selection.head);
        if !keep_pending {
            self.pending = None;
        }
        self.selection = selection;
    }

    pub fn set_cursor(&mut self, offset: usize) {
        self.set_selection(Selection::collapsed(offset));
    }

    pub fn cursor_offset(&self) -> usize {
        self.selection.head
    }

    pub fn pending_format(&self) -> Option<&PendingFormat> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selection: self.selection,
            revision: self.revision,
        }
    }

    /// Selection recorded in `snapshot`, if nothing changed the document since.
    pub fn restore(&self, snapshot: &SelectionSnapshot) -> Result<Selection, EditorError> {
        if snapshot.revision != self.revision {
            return Err(EditorError::StaleSelection {
                snapshot: snapshot.revision,
                current: self.revision,
            });
        }
        Ok(snapshot.selection.clamped(self.len()))
    }

    // === Segments ===

    pub fn segments(&self) -> Vec<Segment> {
        collect_segments(&self.fragment)
    }

    /// Total length in units.
    pub fn len(&self) -> usize {
        total_len(&self.segments())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn seg_runs(&self, seg: &Segment) -> Vec<InlineRun> {
        self.fragment
            .children_at(&seg.container)
            .and_then(|children| children.get(seg.children.clone()))
            .map(flatten)
            .unwrap_or_default()
    }

    /// Write runs back over a segment's nodes. Returns the new node count.
    pub(crate) fn set_seg_runs(&mut self, seg: &Segment, runs: Vec<InlineRun>) -> usize {
        let nodes = rebuild(runs);
        let count = nodes.len();
        match self.fragment.children_at_mut(&seg.container) {
            Some(children) if seg.children.end <= children.len() => {
                children.splice(seg.children.clone(), nodes);
            }
            _ => {
                tracing::warn!(container = ?seg.container, "segment no longer resolves");
                return 0;
            }
        }
        count
    }

    /// Re-flatten and rebuild the segment at `offset`, merging split text and
    /// duplicate marks left behind by structural edits.
    pub(crate) fn normalize_segment_at(&mut self, offset: usize) {
        let segments = self.segments();
        let (idx, _) = locate(&segments, offset);
        let seg = &segments[idx];
        let runs = self.seg_runs(seg);
        self.set_seg_runs(seg, runs);
    }

    /// Nearest table cell around a segment, inclusive.
    pub(crate) fn cell_of(&self, seg: &Segment) -> Option<NodePath> {
        self.fragment
            .nearest_ancestor(&seg.container, |el| is_table_cell_tag(&el.tag))
    }

    /// The character just before `offset` in the same segment. Atoms read as U+FFFC.
    pub fn char_before(&self, offset: usize) -> Option<char> {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        if local == 0 {
            return None;
        }
        runs_text(&self.seg_runs(&segments[idx])).chars().nth(local - 1)
    }

    /// The character at `offset` in the same segment.
    pub fn char_after(&self, offset: usize) -> Option<char> {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        runs_text(&self.seg_runs(&segments[idx])).chars().nth(local)
    }

    /// Whether two offsets lie in different table cells (or one in a cell
    /// and one outside).
    pub fn crosses_cells(&self, a: usize, b: usize) -> bool {
        let segments = self.segments();
        let (sa, _) = locate(&segments, a);
        let (sb, _) = locate(&segments, b);
        sa != sb && self.cell_of(&segments[sa]) != self.cell_of(&segments[sb])
    }

    // === Inline edits ===

    /// Insert plain text, inheriting marks from the text before it.
    /// Returns the offset after the insertion.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> usize {
        if text.is_empty() {
            return offset;
        }
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        let runs = self.seg_runs(seg);
        let mut marks = marks_for_text(&runs, local);
        if let Some(pending) = self.pending.take() {
            if pending.offset == offset {
                pending.apply(&mut marks);
            }
        }
        let runs = insert_runs_at(runs, local, vec![InlineRun::text(text, marks)]);
        self.set_seg_runs(seg, runs);
        self.touch();
        seg.start + local + text.chars().count()
    }

    /// Insert one atomic node (chip, `<br>`). It picks up only the marks its
    /// neighbours share.
    pub fn insert_atom(&mut self, offset: usize, node: Node) -> usize {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        let runs = self.seg_runs(seg);
        let marks = marks_for_atom(&runs, local);
        let runs = insert_runs_at(runs, local, vec![InlineRun::atom(node, marks)]);
        self.set_seg_runs(seg, runs);
        self.touch();
        seg.start + local + 1
    }

    /// Insert pre-built runs. Their marks are nested inside the marks text
    /// typed at `offset` would get.
    pub fn insert_runs(&mut self, offset: usize, insert: Vec<InlineRun>) -> usize {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        let runs = self.seg_runs(seg);
        let outer = marks_for_text(&runs, local);
        let inserted_len = runs_len(&insert);
        let insert = insert
            .into_iter()
            .map(|mut run| {
                let mut marks = outer.clone();
                marks.append(&mut run.marks);
                run.marks = marks;
                run
            })
            .collect();
        let runs = insert_runs_at(runs, local, insert);
        self.set_seg_runs(seg, runs);
        self.touch();
        seg.start + local + inserted_len
    }

    /// Delete a range. Ranges spanning blocks join the last block's remainder
    /// onto the first; ranges spanning table cells only clear content.
    /// Returns the collapsed cursor position.
    pub fn delete_range(&mut self, range: Range<usize>) -> usize {
        let len = self.len();
        let start = range.start.min(range.end).min(len);
        let end = range.start.max(range.end).min(len);
        if start == end {
            return start;
        }
        let segments = self.segments();
        let (a, la) = locate(&segments, start);
        let (b, lb) = locate(&segments, end);
        if a == b {
            let seg = &segments[a];
            let runs = remove_range(self.seg_runs(seg), la, lb);
            self.set_seg_runs(seg, runs);
        } else if self.cell_of(&segments[a]) != self.cell_of(&segments[b]) {
            self.clear_segments(&segments[a..=b], la, lb);
        } else {
            self.join_segments(&segments[a], la, &segments[b], lb);
        }
        self.touch();
        start
    }

    /// Clear `la..` of the first segment, `..lb` of the last and everything
    /// in between, keeping all block structure.
    fn clear_segments(&mut self, segments: &[Segment], la: usize, lb: usize) {
        let last = segments.len() - 1;
        for (i, seg) in segments.iter().enumerate().rev() {
            let lo = if i == 0 { la } else { 0 };
            let hi = if i == last { lb } else { seg.len };
            if lo < hi {
                let runs = remove_range(self.seg_runs(seg), lo, hi);
                self.set_seg_runs(seg, runs);
            }
        }
    }

    // === Inline formatting ===

    /// Toggle b/i/u over a non-empty range: removed if the whole range already
    /// has it, added otherwise.
    pub fn toggle_inline(&mut self, range: Range<usize>, format: InlineFormat) {
        let active = self.range_has(range.clone(), |marks| format.is_set(marks));
        self.map_marks(range, |marks| {
            if active {
                format.strip(marks);
            } else if !format.is_set(marks) {
                marks.push(format.mark());
            }
        });
    }

    /// Toggle b/i/u for the next text typed at a collapsed caret.
    pub fn toggle_pending(&mut self, offset: usize, format: InlineFormat) {
        let currently = self.format_at(Selection::collapsed(offset));
        let is_set = match format {
            InlineFormat::Bold => currently.bold,
            InlineFormat::Italic => currently.italic,
            InlineFormat::Underline => currently.underline,
        };
        let mut pending = match self.pending.take() {
            Some(p) if p.offset == offset => p,
            _ => PendingFormat {
                offset,
                ..PendingFormat::default()
            },
        };
        if is_set {
            pending.add.retain(|f| *f != format);
            if !pending.remove.contains(&format) {
                pending.remove.push(format);
            }
        } else {
            pending.remove.retain(|f| *f != format);
            if !pending.add.contains(&format) {
                pending.add.push(format);
            }
        }
        self.pending = Some(pending);
    }

    /// Word range around a collapsed caret, when it sits inside a word.
    pub fn word_at(&self, offset: usize) -> Option<Range<usize>> {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        word_around(&self.seg_runs(seg), local).map(|(s, e)| seg.start + s..seg.start + e)
    }

    /// Wrap a range in `mark`, first dropping marks `replaces` matches.
    pub fn apply_mark(&mut self, range: Range<usize>, mark: Mark, replaces: impl Fn(&Mark) -> bool) {
        self.map_marks(range, |marks| {
            marks.retain(|m| !replaces(m));
            marks.push(mark.clone());
        });
    }

    /// Link a range. Existing links inside it are replaced.
    pub fn set_link(&mut self, range: Range<usize>, href: &str) {
        self.apply_mark(range, Mark::new("a").with_attr("href", href), Mark::is_link);
    }

    pub fn set_font_family(&mut self, range: Range<usize>, family: &str) {
        let mark = Mark::new("span").with_attr("style", format!("font-family: {family};"));
        self.apply_mark(range, mark, |m| m.font_family().is_some());
    }

    /// Whether every non-empty run in the range satisfies `pred`.
    fn range_has(&self, range: Range<usize>, pred: impl Fn(&[Mark]) -> bool) -> bool {
        let mut any = false;
        let mut all = true;
        self.for_each_range_run(range, |run| {
            if run.is_empty() {
                return;
            }
            any = true;
            all &= pred(&run.marks);
        });
        any && all
    }

    fn for_each_range_run(&self, range: Range<usize>, mut f: impl FnMut(&InlineRun)) {
        let segments = self.segments();
        let (a, la) = locate(&segments, range.start);
        let (b, lb) = locate(&segments, range.end);
        for (i, seg) in segments.iter().enumerate().take(b + 1).skip(a) {
            let lo = if i == a { la } else { 0 };
            let hi = if i == b { lb } else { seg.len };
            let (_, mid, _) = split_range(self.seg_runs(seg), lo, hi);
            mid.iter().for_each(&mut f);
        }
    }

    /// Rewrite the marks of every run in a range, segment by segment, last first.
    fn map_marks(&mut self, range: Range<usize>, mut f: impl FnMut(&mut Vec<Mark>)) {
        if range.start >= range.end {
            return;
        }
        let segments = self.segments();
        let (a, la) = locate(&segments, range.start);
        let (b, lb) = locate(&segments, range.end);
        for i in (a..=b).rev() {
            let seg = &segments[i];
            let lo = if i == a { la } else { 0 };
            let hi = if i == b { lb } else { seg.len };
            if lo >= hi {
                continue;
            }
            let (mut head, mut mid, tail) = split_range(self.seg_runs(seg), lo, hi);
            for run in &mut mid {
                f(&mut run.marks);
            }
            head.append(&mut mid);
            head.extend(tail);
            self.set_seg_runs(seg, head);
        }
        self.touch();
    }

    // === Queries ===

    /// Format indicators for a selection: inline toggles hold only if they
    /// cover the whole range; block, list, font and link come from its start.
    pub fn format_at(&self, selection: Selection) -> FormatState {
        let range = selection.to_range();
        let segments = self.segments();
        let (idx, local) = locate(&segments, range.start);
        let seg = &segments[idx];
        let runs = self.seg_runs(seg);

        let mut state = FormatState::default();
        if let Some(el) = self.fragment.element_at(&seg.container) {
            state.block = BlockFormat::from_tag(&el.tag).unwrap_or_default();
        }
        let list = self
            .fragment
            .nearest_ancestor(&seg.container, |el| el.tag == "li")
            .and_then(|li| li.split_last().map(|(_, list)| list.to_vec()))
            .and_then(|list| self.fragment.element_at(&list))
            .and_then(|list| ListKind::from_tag(&list.tag));
        state.ordered_list = list == Some(ListKind::Ordered);
        state.unordered_list = list == Some(ListKind::Unordered);

        let start_marks = if selection.is_collapsed() {
            let mut marks = marks_for_text(&runs, local);
            if let Some(pending) = &self.pending {
                if pending.offset == range.start {
                    pending.apply(&mut marks);
                }
            }
            marks
        } else {
            let (_, rest) = split_runs(runs, local);
            rest.into_iter()
                .find(|run| !run.is_empty())
                .map(|run| run.marks)
                .unwrap_or_default()
        };

        if selection.is_collapsed() {
            state.bold = InlineFormat::Bold.is_set(&start_marks);
            state.italic = InlineFormat::Italic.is_set(&start_marks);
            state.underline = InlineFormat::Underline.is_set(&start_marks);
        } else {
            state.bold = self.range_has(range.clone(), |m| InlineFormat::Bold.is_set(m));
            state.italic = self.range_has(range.clone(), |m| InlineFormat::Italic.is_set(m));
            state.underline = self.range_has(range, |m| InlineFormat::Underline.is_set(m));
        }

        state.font_family = start_marks
            .iter()
            .rev()
            .find_map(Mark::font_family)
            .or_else(|| {
                self.fragment
                    .ancestors(&seg.container)
                    .iter()
                    .rev()
                    .find_map(|el| el.style_property("font-family"))
            })
            .map(|family| unquote_font_family(&family));
        state.link = start_marks
            .iter()
            .rev()
            .find(|m| m.is_link())
            .and_then(|m| m.attr("href"))
            .map(str::to_string);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> RichDocument {
        RichDocument::parse(html)
    }

    #[test]
    fn test_insert_text_inherits_marks() {
        let mut d = doc("<p><b>bo</b>x</p>");
        let cursor = d.insert_text(2, "ld");
        assert_eq!(cursor, 4);
        assert_eq!(d.to_html(), "<p><b>bold</b>x</p>");
    }

    #[test]
    fn test_insert_text_into_empty_paragraph() {
        let mut d = doc("<p></p>");
        assert_eq!(d.insert_text(0, "Hello"), 5);
        assert_eq!(d.to_html(), "<p>Hello</p>");
    }

    #[test]
    fn test_text_after_link_is_not_linked() {
        let mut d = doc("<p><a href=\"#\">go</a></p>");
        d.insert_text(2, "!");
        assert_eq!(d.to_html(), "<p><a href=\"#\">go</a>!</p>");
        d.insert_text(1, "o");
        assert_eq!(d.to_html(), "<p><a href=\"#\">goo</a>!</p>");
    }

    #[test]
    fn test_delete_within_segment() {
        let mut d = doc("<p>Hello <b>big</b> world</p>");
        assert_eq!(d.delete_range(5..9), 5);
        assert_eq!(d.to_html(), "<p>Hello world</p>");
    }

    #[test]
    fn test_delete_joins_blocks() {
        let mut d = doc("<p>abc</p><h2>def</h2><p>ghi</p>");
        // "ab|c" .. "g|hi"
        assert_eq!(d.delete_range(2..9), 2);
        assert_eq!(d.to_html(), "<p>abhi</p>");
    }

    #[test]
    fn test_backspace_at_block_start_merges() {
        let mut d = doc("<p>ab</p><p><i>cd</i></p>");
        assert_eq!(d.delete_range(2..3), 2);
        assert_eq!(d.to_html(), "<p>ab<i>cd</i></p>");
    }

    #[test]
    fn test_delete_out_of_list() {
        let mut d = doc("<ul><li>one</li><li>two</li></ul><p>after</p>");
        // "on|e" .. "af|ter"
        assert_eq!(d.delete_range(2..10), 2);
        assert_eq!(d.to_html(), "<ul><li>onter</li></ul>");
    }

    #[test]
    fn test_delete_into_list() {
        let mut d = doc("<p>head</p><ul><li>one</li><li>two</li></ul>");
        // "he|ad" .. "o|ne"
        assert_eq!(d.delete_range(2..6), 2);
        assert_eq!(d.to_html(), "<p>hene</p><ul><li>two</li></ul>");
    }

    #[test]
    fn test_delete_never_merges_cells() {
        let mut d = doc("<table><tr><td>ab</td><td>cd</td></tr></table>");
        assert_eq!(d.delete_range(1..4), 1);
        assert_eq!(d.to_html(), "<table><tr><td>a</td><td>d</td></tr></table>");
        // Backspace at the start of a cell does nothing.
        assert_eq!(d.delete_range(1..2), 1);
        assert_eq!(d.to_html(), "<table><tr><td>a</td><td>d</td></tr></table>");
    }

    #[test]
    fn test_delete_removes_whole_blocks_between() {
        let mut d = doc("<p>a</p><table><tr><td>x</td></tr></table><p>b</p>");
        assert_eq!(d.delete_range(1..4), 1);
        assert_eq!(d.to_html(), "<p>ab</p>");
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_chip_deletes_as_one_unit() {
        let mut d = doc(
            "<p>Hi <span class=\"placeholder-chip\" contenteditable=\"false\" data-placeholder=\"[[ID]]\">[[ID]]</span></p>",
        );
        assert_eq!(d.len(), 4);
        assert_eq!(d.delete_range(3..4), 3);
        assert_eq!(d.to_html(), "<p>Hi </p>");
    }

    #[test]
    fn test_toggle_inline() {
        let mut d = doc("<p>hello world</p>");
        d.toggle_inline(0..5, InlineFormat::Bold);
        assert_eq!(d.to_html(), "<p><b>hello</b> world</p>");
        d.toggle_inline(0..11, InlineFormat::Bold);
        assert_eq!(d.to_html(), "<p><b>hello world</b></p>");
        d.toggle_inline(6..11, InlineFormat::Bold);
        assert_eq!(d.to_html(), "<p><b>hello </b>world</p>");
    }

    #[test]
    fn test_toggle_across_blocks() {
        let mut d = doc("<p>ab</p><p>cd</p>");
        d.toggle_inline(1..4, InlineFormat::Italic);
        assert_eq!(d.to_html(), "<p>a<i>b</i></p><p><i>c</i>d</p>");
    }

    #[test]
    fn test_pending_format() {
        let mut d = doc("<p>ab</p>");
        d.set_cursor(2);
        d.toggle_pending(2, InlineFormat::Bold);
        assert!(d.format_at(Selection::collapsed(2)).bold);
        let cursor = d.insert_text(2, "cd");
        assert_eq!(d.to_html(), "<p>ab<b>cd</b></p>");
        assert_eq!(cursor, 4);
        assert!(d.pending_format().is_none());
    }

    #[test]
    fn test_set_link_and_font() {
        let mut d = doc("<p>hello world</p>");
        d.set_link(6..11, "https://example.com");
        assert_eq!(d.to_html(), "<p>hello <a href=\"https://example.com\">world</a></p>");
        d.set_font_family(0..5, "Georgia, serif");
        assert_eq!(
            d.to_html(),
            "<p><span style=\"font-family: Georgia, serif;\">hello</span> <a href=\"https://example.com\">world</a></p>"
        );
    }

    #[test]
    fn test_format_at() {
        let d = doc("<h2><b><span style=\"font-family: 'Courier New'\">x<a href=\"/y\">yz</a></span></b></h2><ol><li>i</li></ol>");
        let state = d.format_at(Selection::collapsed(2));
        assert!(state.bold);
        assert!(!state.italic);
        assert_eq!(state.block, BlockFormat::Heading(2));
        assert_eq!(state.font_family.as_deref(), Some("Courier New"));
        assert_eq!(state.link.as_deref(), Some("/y"));

        let state = d.format_at(Selection::collapsed(4));
        assert!(state.ordered_list);
        assert!(!state.unordered_list);
        assert_eq!(state.block, BlockFormat::Paragraph);
    }

    #[test]
    fn test_snapshot_staleness() {
        let mut d = doc("<p>abc</p>");
        d.set_selection(Selection::new(1, 2));
        let snap = d.snapshot();
        assert_eq!(d.restore(&snap).ok(), Some(Selection::new(1, 2)));
        d.insert_text(0, "x");
        assert!(matches!(d.restore(&snap), Err(EditorError::StaleSelection { .. })));
    }

    #[test]
    fn test_char_before() {
        let d = doc("<p>a[</p><p>b</p>");
        assert_eq!(d.char_before(2), Some('['));
        assert_eq!(d.char_before(3), None);
    }
}
