//! Undo/redo history for rich documents.
//!
//! Each step is a full snapshot of the fragment and selection taken before
//! an edit. Consecutive typing within [`COALESCE_WINDOW`] is one step.

use std::time::Duration;

use web_time::Instant;

use crate::document::RichDocument;
use crate::dom::Fragment;
use crate::types::Selection;

pub const DEFAULT_MAX_STEPS: usize = 100;
pub const COALESCE_WINDOW: Duration = Duration::from_secs(1);

/// What kind of edit is about to happen, for coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Typing,
    Other,
}

#[derive(Debug, Clone)]
struct UndoStep {
    fragment: Fragment,
    selection: Selection,
}

impl UndoStep {
    fn capture(doc: &RichDocument) -> Self {
        Self {
            fragment: doc.fragment().clone(),
            selection: doc.selection(),
        }
    }

    fn apply(self, doc: &mut RichDocument) {
        doc.replace_fragment(self.fragment);
        doc.set_selection(self.selection);
    }
}

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    max_steps: usize,
    last_typing: Option<Instant>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps: max_steps.max(1),
            last_typing: None,
        }
    }

    /// Record the document state before an edit.
    pub fn record(&mut self, doc: &RichDocument, kind: EditKind) {
        self.record_at(doc, kind, Instant::now());
    }

    pub fn record_at(&mut self, doc: &RichDocument, kind: EditKind, now: Instant) {
        let coalesce = kind == EditKind::Typing
            && !self.undo_stack.is_empty()
            && self
                .last_typing
                .is_some_and(|last| now.duration_since(last) < COALESCE_WINDOW);
        self.last_typing = (kind == EditKind::Typing).then_some(now);
        self.redo_stack.clear();
        if coalesce {
            return;
        }
        self.undo_stack.push(UndoStep::capture(doc));
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Restore the previous state. Returns false if there is none.
    pub fn undo(&mut self, doc: &mut RichDocument) -> bool {
        let Some(step) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(UndoStep::capture(doc));
        step.apply(doc);
        self.last_typing = None;
        true
    }

    pub fn redo(&mut self, doc: &mut RichDocument) -> bool {
        let Some(step) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(UndoStep::capture(doc));
        step.apply(doc);
        self.last_typing = None;
        true
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_typing = None;
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}
