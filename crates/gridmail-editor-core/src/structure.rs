//! Structural edits: joining blocks, splitting blocks, inserting block
//! content, block formats and lists.

use smol_str::SmolStr;

use crate::document::RichDocument;
use crate::dom::{Element, Node, NodePath, is_list_tag, is_text_block_tag};
use crate::format::{BlockFormat, ListKind, is_heading_tag};
use crate::runs::{InlineRun, rebuild, runs_len, split_runs};
use crate::segment::{Segment, locate};

/// Containers never removed when a join empties them.
const STRUCTURAL_TAGS: &[&str] = &["td", "th", "tr", "table", "thead", "tbody", "tfoot"];

impl RichDocument {
    /// Join segment `a` (kept up to `la`) with segment `b` (kept from `lb`),
    /// removing everything between and pruning containers left empty.
    pub(crate) fn join_segments(&mut self, a: &Segment, la: usize, b: &Segment, lb: usize) {
        let (_, b_tail) = split_runs(self.seg_runs(b), lb);
        let tail_count = self.set_seg_runs(b, b_tail);

        let (a_head, _) = split_runs(self.seg_runs(a), la);
        let head_count = self.set_seg_runs(a, a_head);
        let delta = head_count as isize - a.children.len() as isize;

        let mut end_path = b.start_path();
        shift_path(&mut end_path, &a.container, a.children.end, delta);
        let mut start_path = a.container.clone();
        start_path.push(a.children.start + head_count);

        let end_path = remove_between(
            &mut self.fragment.children,
            Some(&start_path),
            Some(&end_path),
        )
        .unwrap_or(end_path);

        let (Some((&end_idx, end_parent)), Some((&start_idx, start_parent))) =
            (end_path.split_last(), start_path.split_last())
        else {
            return;
        };
        let mut b_container = end_parent.to_vec();
        if end_parent != start_parent && tail_count > 0 {
            let moved: Vec<Node> = match self.fragment.children_at_mut(end_parent) {
                Some(children) => {
                    let stop = (end_idx + tail_count).min(children.len());
                    children.drain(end_idx.min(stop)..stop).collect()
                }
                None => Vec::new(),
            };
            let moved_count = moved.len();
            if let Some(children) = self.fragment.children_at_mut(start_parent) {
                let at = start_idx.min(children.len());
                children.splice(at..at, moved);
            }
            shift_path(&mut b_container, start_parent, start_idx, moved_count as isize);
        }
        self.prune_empty(b_container, start_parent);
        self.normalize_segment_at(self.offset_of_gap(&start_path));
    }

    /// Offset of the segment whose first node sits at or after `gap`.
    fn offset_of_gap(&self, gap: &[usize]) -> usize {
        let segments = self.segments();
        segments
            .iter()
            .rev()
            .find(|seg| seg.start_path().as_slice() <= gap)
            .map_or(0, |seg| seg.start)
    }

    /// Remove empty elements from `path` upwards, stopping at structural
    /// containers and at ancestors of `keep`.
    fn prune_empty(&mut self, mut path: NodePath, keep: &[usize]) {
        while !path.is_empty() && !keep.starts_with(&path) {
            let Some(el) = self.fragment.element_at(&path) else {
                break;
            };
            if STRUCTURAL_TAGS.contains(&el.tag.as_str())
                || el.children.iter().any(|c| !c.is_insignificant())
            {
                break;
            }
            let Some((&idx, parent)) = path.split_last() else {
                break;
            };
            if let Some(children) = self.fragment.children_at_mut(parent) {
                children.remove(idx);
            }
            path.pop();
        }
    }

    /// Enter: split the block at `offset`. Returns the new cursor.
    ///
    /// Enter at the end of a heading continues with a paragraph; Enter in an
    /// empty list item moves it out of the list. Blocks that cannot be split
    /// (root, cells) get their inline content wrapped in two paragraphs.
    pub fn insert_paragraph(&mut self, offset: usize) -> usize {
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        let (head, tail) = split_runs(self.seg_runs(seg), local);

        match self.fragment.element_at(&seg.container).cloned() {
            Some(el) if el.tag == "li" && is_blank(&el.children) => {
                self.lift_list_item(&seg.container);
                self.touch();
                return offset;
            }
            Some(el) if is_text_block_tag(&el.tag) || el.tag == "li" => {
                let (first, mut second) = split_element(&el, seg, head, tail);
                if is_heading_tag(&el.tag) && is_blank(&second.children) {
                    second = Element::new("p");
                }
                self.replace_node(&seg.container, vec![first.into(), second.into()]);
            }
            _ => {
                let halves = vec![
                    Element::new("p").with_children(rebuild(head)).into(),
                    Element::new("p").with_children(rebuild(tail)).into(),
                ];
                if let Some(children) = self.fragment.children_at_mut(&seg.container) {
                    children.splice(seg.children.clone(), halves);
                }
            }
        }
        self.touch();
        offset + 1
    }

    /// Insert block nodes at `offset`, splitting the surrounding block.
    /// Empty halves are dropped. The cursor goes to the first segment at or
    /// after the last inserted node.
    pub fn insert_blocks(&mut self, offset: usize, nodes: Vec<Node>) -> usize {
        if nodes.is_empty() {
            return offset;
        }
        let count = nodes.len();
        let segments = self.segments();
        let (idx, local) = locate(&segments, offset);
        let seg = &segments[idx];
        let (head, tail) = split_runs(self.seg_runs(seg), local);

        let last_path = match self.fragment.element_at(&seg.container).cloned() {
            Some(el) if is_text_block_tag(&el.tag) => {
                let (first, second) = split_element(&el, seg, head, tail);
                let keep_first = !is_blank(&first.children);
                let mut pieces: Vec<Node> = Vec::new();
                if keep_first {
                    pieces.push(first.into());
                }
                pieces.extend(nodes);
                if !is_blank(&second.children) {
                    pieces.push(second.into());
                }
                let Some((&at, parent)) = seg.container.split_last() else {
                    return offset;
                };
                let mut last = parent.to_vec();
                last.push(at + usize::from(keep_first) + count - 1);
                self.replace_node(&seg.container, pieces);
                last
            }
            _ => {
                let keep_head = runs_len(&head) > 0;
                let mut pieces: Vec<Node> = Vec::new();
                if keep_head {
                    pieces.push(Element::new("p").with_children(rebuild(head)).into());
                }
                pieces.extend(nodes);
                if runs_len(&tail) > 0 {
                    pieces.push(Element::new("p").with_children(rebuild(tail)).into());
                }
                if let Some(children) = self.fragment.children_at_mut(&seg.container) {
                    children.splice(seg.children.clone(), pieces);
                }
                let mut last = seg.container.clone();
                last.push(seg.children.start + usize::from(keep_head) + count - 1);
                last
            }
        };
        self.touch();

        let segments = self.segments();
        segments
            .iter()
            .find(|s| s.start_path() >= last_path)
            .or(segments.last())
            .map_or(0, |s| s.start)
    }

    /// Replace the node at `path` with `nodes`.
    fn replace_node(&mut self, path: &[usize], nodes: Vec<Node>) {
        let Some((&idx, parent)) = path.split_last() else {
            return;
        };
        if let Some(children) = self.fragment.children_at_mut(parent) {
            if idx < children.len() {
                children.splice(idx..=idx, nodes);
            }
        }
    }

    /// Move a list item out of its list as a paragraph, splitting the list
    /// around it.
    fn lift_list_item(&mut self, li_path: &[usize]) {
        let Some((&li_idx, list_path)) = li_path.split_last() else {
            return;
        };
        let Some(list) = self.fragment.element_at(list_path).cloned() else {
            return;
        };
        if !is_list_tag(&list.tag) || li_idx >= list.children.len() {
            return;
        }
        let before = &list.children[..li_idx];
        let after = &list.children[li_idx + 1..];
        let li = match &list.children[li_idx] {
            Node::Element(li) => li.clone(),
            _ => return,
        };

        let mut pieces: Vec<Node> = Vec::new();
        if !is_blank(before) {
            pieces.push(clone_shell(&list).with_children(before.to_vec()).into());
        }
        if li.children.iter().all(Node::is_inline) {
            pieces.push(Element::new("p").with_children(strip_blank(li.children)).into());
        } else {
            pieces.extend(li.children);
        }
        if !is_blank(after) {
            pieces.push(clone_shell(&list).with_children(after.to_vec()).into());
        }
        self.replace_node(list_path, pieces);
    }

    /// Change the block containing each segment in range. Text blocks are
    /// retagged (dropping their inline style); other containers get the
    /// segment's content wrapped in a new block.
    pub fn set_block_format(&mut self, range: std::ops::Range<usize>, format: BlockFormat) {
        let segments = self.segments();
        let (a, _) = locate(&segments, range.start);
        let (b, _) = locate(&segments, range.end);
        let mut retagged: Vec<NodePath> = Vec::new();
        for seg in segments[a..=b].iter().rev() {
            let is_text_block = self
                .fragment
                .element_at(&seg.container)
                .is_some_and(|el| is_text_block_tag(&el.tag));
            if is_text_block {
                if retagged.contains(&seg.container) {
                    continue;
                }
                if let Some(el) = self.fragment.element_at_mut(&seg.container) {
                    el.tag = SmolStr::new(format.tag());
                    el.remove_attr("style");
                }
                retagged.push(seg.container.clone());
            } else if let Some(children) = self.fragment.children_at_mut(&seg.container) {
                let inner: Vec<Node> = children.drain(seg.children.clone()).collect();
                let block = Element::new(format.tag()).with_children(inner);
                children.insert(seg.children.start, block.into());
            }
        }
        self.touch();
    }

    /// Toggle a list over the blocks in range.
    ///
    /// Items already in a list of this kind leave it; items in a list of the
    /// other kind switch the list's kind; anything else is gathered into new
    /// lists, one per run of adjacent blocks.
    pub fn toggle_list(&mut self, range: std::ops::Range<usize>, kind: ListKind) {
        let segments = self.segments();
        let (a, _) = locate(&segments, range.start);
        let (b, _) = locate(&segments, range.end);
        let selected = &segments[a..=b];

        let items: Vec<Option<(NodePath, NodePath, ListKind)>> =
            selected.iter().map(|seg| self.list_item_of(seg)).collect();

        if items.iter().all(|i| matches!(i, Some((_, _, k)) if *k == kind)) {
            let mut lis: Vec<NodePath> = items.into_iter().flatten().map(|(li, _, _)| li).collect();
            lis.dedup();
            for li in lis.iter().rev() {
                self.lift_list_item(li);
            }
        } else if items.iter().all(Option::is_some) {
            for (_, list, _) in items.into_iter().flatten() {
                if let Some(el) = self.fragment.element_at_mut(&list) {
                    el.tag = SmolStr::new(kind.tag());
                    el.remove_attr("style");
                }
            }
        } else {
            let units: Vec<ListUnit> = selected
                .iter()
                .zip(&items)
                .filter(|(_, item)| item.is_none())
                .filter_map(|(seg, _)| self.list_unit(seg))
                .fold(Vec::new(), |mut acc, unit| {
                    if acc.last() != Some(&unit) {
                        acc.push(unit);
                    }
                    acc
                });
            for group in self.group_units(units).into_iter().rev() {
                self.wrap_group(group, kind);
            }
        }
        self.touch();
    }

    /// `(li path, list path, list kind)` of the nearest list item around a segment.
    fn list_item_of(&self, seg: &Segment) -> Option<(NodePath, NodePath, ListKind)> {
        let li = self
            .fragment
            .nearest_ancestor(&seg.container, |el| el.tag == "li")?;
        let list = li.split_last()?.1.to_vec();
        let kind = ListKind::from_tag(&self.fragment.element_at(&list)?.tag)?;
        Some((li, list, kind))
    }

    fn list_unit(&self, seg: &Segment) -> Option<ListUnit> {
        match self.fragment.element_at(&seg.container) {
            Some(el) if is_text_block_tag(&el.tag) => {
                let (&idx, parent) = seg.container.split_last()?;
                Some(ListUnit {
                    parent: parent.to_vec(),
                    range: idx..idx + 1,
                    unwrap: matches!(el.tag.as_str(), "p" | "div"),
                })
            }
            _ => Some(ListUnit {
                parent: seg.container.clone(),
                range: seg.children.clone(),
                unwrap: false,
            }),
        }
    }

    /// Group units sharing a parent whose ranges are separated only by
    /// insignificant nodes.
    fn group_units(&self, units: Vec<ListUnit>) -> Vec<Vec<ListUnit>> {
        let mut groups: Vec<Vec<ListUnit>> = Vec::new();
        for unit in units {
            let joins = groups.last().and_then(|g| g.last()).is_some_and(|prev| {
                prev.parent == unit.parent
                    && prev.range.end <= unit.range.start
                    && self
                        .fragment
                        .children_at(&unit.parent)
                        .and_then(|c| c.get(prev.range.end..unit.range.start))
                        .is_some_and(|gap| gap.iter().all(Node::is_insignificant))
            });
            match groups.last_mut() {
                Some(group) if joins => group.push(unit),
                _ => groups.push(vec![unit]),
            }
        }
        groups
    }

    fn wrap_group(&mut self, group: Vec<ListUnit>, kind: ListKind) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            return;
        };
        let parent = first.parent.clone();
        let span = first.range.start..last.range.end;
        let Some(children) = self.fragment.children_at_mut(&parent) else {
            return;
        };
        if span.end > children.len() {
            return;
        }
        let mut items = Vec::with_capacity(group.len());
        for unit in &group {
            let nodes = children[unit.range.clone()].to_vec();
            let content = match nodes.as_slice() {
                [Node::Element(el)] if unit.unwrap => el.children.clone(),
                _ => nodes,
            };
            items.push(Element::new("li").with_children(content).into());
        }
        let list = Element::new(kind.tag()).with_children(items);
        children.splice(span, [Node::Element(list)]);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListUnit {
    parent: NodePath,
    range: std::ops::Range<usize>,
    /// Move the block's children into the item instead of the block itself.
    unwrap: bool,
}

/// Remove every node strictly between two gaps. A gap path ends with the
/// index of the child it sits before; `None` stands for the start or end of
/// the list. Returns the end gap adjusted for the removed nodes.
fn remove_between(
    children: &mut Vec<Node>,
    start: Option<&[usize]>,
    end: Option<&[usize]>,
) -> Option<NodePath> {
    let (s_idx, s_rest) = match start {
        Some([i, rest @ ..]) => (*i, (!rest.is_empty()).then_some(rest)),
        _ => (0, None),
    };
    let (e_idx, e_rest) = match end {
        Some([j, rest @ ..]) => (*j, (!rest.is_empty()).then_some(rest)),
        _ => (children.len(), None),
    };

    if let (Some(sr), Some(er)) = (s_rest, e_rest) {
        if s_idx == e_idx {
            let inner = children.get_mut(s_idx)?.children_mut()?;
            let adjusted = remove_between(inner, Some(sr), Some(er))?;
            let mut out = vec![s_idx];
            out.extend(adjusted);
            return Some(out);
        }
    }

    let mut adjusted_rest = e_rest.map(<[usize]>::to_vec);
    if let Some(er) = e_rest {
        if let Some(inner) = children.get_mut(e_idx).and_then(Node::children_mut) {
            adjusted_rest = remove_between(inner, None, Some(er)).or(adjusted_rest);
        }
    }
    let mut full_from = s_idx;
    if let Some(sr) = s_rest {
        if let Some(inner) = children.get_mut(s_idx).and_then(Node::children_mut) {
            remove_between(inner, Some(sr), None);
        }
        full_from = s_idx + 1;
    }
    let stop = e_idx.min(children.len());
    let full_from = full_from.min(stop);
    children.drain(full_from..stop);
    let removed = stop - full_from;

    end.map(|_| {
        let mut out = vec![e_idx - removed];
        out.extend(adjusted_rest.unwrap_or_default());
        out
    })
}

/// Shift the index a path holds inside `container` by `delta` when it is at
/// or past `threshold`.
fn shift_path(path: &mut NodePath, container: &[usize], threshold: usize, delta: isize) {
    if path.len() > container.len() && path.starts_with(container) {
        let slot = &mut path[container.len()];
        if *slot >= threshold {
            *slot = slot.saturating_add_signed(delta);
        }
    }
}

/// Split a block around a segment: the first copy keeps what precedes the
/// split point, the second what follows it.
fn split_element(
    el: &Element,
    seg: &Segment,
    head: Vec<InlineRun>,
    tail: Vec<InlineRun>,
) -> (Element, Element) {
    let mut first = clone_shell(el);
    first.children = el.children[..seg.children.start].to_vec();
    first.children.extend(rebuild(head));
    let mut second = clone_shell(el);
    second.children = rebuild(tail);
    second.children.extend_from_slice(&el.children[seg.children.end..]);
    (first, second)
}

/// Same tag and attributes, no children.
fn clone_shell(el: &Element) -> Element {
    Element {
        tag: el.tag.clone(),
        attrs: el.attrs.clone(),
        children: Vec::new(),
    }
}

/// Nothing but whitespace, comments and line breaks.
fn is_blank(nodes: &[Node]) -> bool {
    nodes
        .iter()
        .all(|n| n.is_insignificant() || n.is_element("br"))
}

fn strip_blank(nodes: Vec<Node>) -> Vec<Node> {
    if is_blank(&nodes) { Vec::new() } else { nodes }
}
