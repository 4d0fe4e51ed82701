//! Segments: the editable units of a document, in document order.
//!
//! A segment is a maximal run of inline siblings inside a block container, or
//! a block with no inline content of its own (an empty paragraph or cell).
//! Each text char and each atom counts one unit, and consecutive segments are
//! one unit apart, so offset `seg.start + seg.len` is the end of a segment and
//! the next offset is the start of the following one.

use std::ops::Range;

use crate::dom::{Fragment, Node, NodePath};
use crate::runs::{flatten, runs_len};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Block container holding the segment's nodes. Empty for the root.
    pub container: NodePath,
    /// Child index range inside the container.
    pub children: Range<usize>,
    /// Document offset of the first unit.
    pub start: usize,
    pub len: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Gap path just before the segment's first node.
    pub fn start_path(&self) -> NodePath {
        let mut path = self.container.clone();
        path.push(self.children.start);
        path
    }
}

/// All segments of a fragment. Never empty: a fragment without any editable
/// content still has one empty segment at the end of the root.
pub fn collect_segments(fragment: &Fragment) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_container(&fragment.children, &mut path, &mut out);
    if out.is_empty() {
        let end = fragment.children.len();
        out.push(Segment {
            container: Vec::new(),
            children: end..end,
            start: 0,
            len: 0,
        });
    }
    let mut next = 0;
    for seg in &mut out {
        seg.start = next;
        next = seg.end() + 1;
    }
    out
}

fn collect_container(children: &[Node], path: &mut NodePath, out: &mut Vec<Segment>) {
    let before = out.len();
    let mut i = 0;
    while i < children.len() {
        if children[i].is_inline() {
            let run_start = i;
            while i < children.len() && children[i].is_inline() {
                i += 1;
            }
            let nodes = &children[run_start..i];
            if !nodes.iter().all(Node::is_insignificant) {
                out.push(segment(path, run_start..i, nodes));
            }
            continue;
        }
        if let Node::Element(el) = &children[i] {
            if !el.is_void() {
                path.push(i);
                collect_container(&el.children, path, out);
                path.pop();
            }
        }
        i += 1;
    }
    // Root emptiness is handled by the caller, after the whole walk.
    if out.len() == before && !path.is_empty() && children.iter().all(Node::is_inline) {
        out.push(segment(path, 0..children.len(), children));
    }
}

fn segment(path: &[usize], children: Range<usize>, nodes: &[Node]) -> Segment {
    Segment {
        container: path.to_vec(),
        children,
        start: 0,
        len: runs_len(&flatten(nodes)),
    }
}

/// Segment index and local offset for a document offset, clamped to the end.
pub fn locate(segments: &[Segment], offset: usize) -> (usize, usize) {
    let idx = segments
        .partition_point(|seg| seg.start <= offset)
        .saturating_sub(1);
    let local = segments
        .get(idx)
        .map_or(0, |seg| offset.saturating_sub(seg.start).min(seg.len));
    (idx, local)
}

pub fn total_len(segments: &[Segment]) -> usize {
    segments.last().map_or(0, Segment::end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(html: &str) -> Vec<(NodePath, Range<usize>, usize, usize)> {
        collect_segments(&Fragment::parse(html))
            .into_iter()
            .map(|s| (s.container, s.children, s.start, s.len))
            .collect()
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(
            spans("<p>Hi <b>you</b></p>\n<p></p><p>x</p>"),
            vec![
                (vec![0], 0..2, 0, 6),
                (vec![2], 0..0, 7, 0),
                (vec![3], 0..1, 8, 1),
            ]
        );
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(spans(""), vec![(vec![], 0..0, 0, 0)]);
        assert_eq!(spans("<hr>"), vec![(vec![], 1..1, 0, 0)]);
    }

    #[test]
    fn test_mixed_content() {
        // orphan text, list items, table cells
        assert_eq!(
            spans("a<ul><li>b</li><li></li></ul><table><tr><td>c</td><td></td></tr></table>"),
            vec![
                (vec![], 0..1, 0, 1),
                (vec![1, 0], 0..1, 2, 1),
                (vec![1, 1], 0..0, 4, 0),
                (vec![2, 0, 0], 0..1, 5, 1),
                (vec![2, 0, 1], 0..0, 7, 0),
            ]
        );
    }

    #[test]
    fn test_chip_counts_one() {
        let html = "<p>Hi <span class=\"placeholder-chip\" contenteditable=\"false\" data-placeholder=\"[[A]]\">[[A]]</span></p>";
        assert_eq!(spans(html), vec![(vec![0], 0..2, 0, 4)]);
    }

    #[test]
    fn test_locate() {
        let segments = collect_segments(&Fragment::parse("<p>ab</p><p>cd</p>"));
        assert_eq!(locate(&segments, 0), (0, 0));
        assert_eq!(locate(&segments, 2), (0, 2));
        assert_eq!(locate(&segments, 3), (1, 0));
        assert_eq!(locate(&segments, 5), (1, 2));
        assert_eq!(locate(&segments, 99), (1, 2));
        assert_eq!(total_len(&segments), 5);
    }
}
