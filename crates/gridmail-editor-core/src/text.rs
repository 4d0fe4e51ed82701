//! Text buffer for the raw-HTML source view.
//!
//! All offsets are in Unicode scalar values (chars), not bytes or UTF-16.

use std::ops::Range;

/// A text buffer edited by char range.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Insert text at char offset, clamped to the end.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range, clamped to the buffer.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    fn to_string(&self) -> String;

    /// Number of newline-delimited rows. An empty buffer has one row.
    fn len_lines(&self) -> usize;
}

/// Ropey-backed text buffer.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }

    /// Text of one row without its line ending.
    pub fn line(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        let at = char_offset.min(self.len_chars());
        self.rope.insert(at, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        let len = self.len_chars();
        let range = char_range.start.min(len)..char_range.end.min(len);
        if range.start < range.end {
            self.rope.remove(range);
        }
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    // Ropey counts the empty row after a trailing newline; a textarea shows it too.
    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }
}
