//! Placeholder picker menu and its `[[` trigger.
//!
//! The menu is either idle or open. Typing a `[` right after another `[`
//! opens it at the caret (the first bracket is removed so the surface never
//! shows `[[`); the picker shortcut opens it too. Selecting an entry, Escape
//! or a click outside the menu closes it.

use crate::actions::Key;
use crate::placeholder::{PlaceholderEntry, filter_catalog};
use crate::platform::SurfaceGeometry;
use crate::types::Rect;

/// Where the menu is positioned. Without layout the rect stays unresolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuAnchor {
    Caret { offset: usize, rect: Option<Rect> },
    PickerButton { rect: Option<Rect> },
}

impl MenuAnchor {
    /// Anchor for the `[[` trigger: always the caret.
    pub fn at_caret(geometry: &dyn SurfaceGeometry, offset: usize) -> Self {
        MenuAnchor::Caret {
            offset,
            rect: geometry.caret_rect(offset),
        }
    }

    /// Anchor for the shortcut: the caret if it is laid out, else the
    /// picker button.
    pub fn for_shortcut(geometry: &dyn SurfaceGeometry, caret: Option<usize>) -> Self {
        if let Some(offset) = caret {
            if let Some(rect) = geometry.caret_rect(offset) {
                return MenuAnchor::Caret {
                    offset,
                    rect: Some(rect),
                };
            }
        }
        MenuAnchor::PickerButton {
            rect: geometry.picker_button_rect(),
        }
    }

    /// Top-left corner of the menu, just below the anchor.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            MenuAnchor::Caret { rect, .. } | MenuAnchor::PickerButton { rect } => {
                rect.as_ref().map(Rect::below)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuState {
    pub anchor: MenuAnchor,
    pub query: String,
    pub highlighted: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AutocompleteState {
    #[default]
    Idle,
    MenuOpen(MenuState),
}

/// What a key press in the open menu asks the editor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuKeyResult {
    /// Insert this token and close.
    Select(String),
    Closed,
    /// Highlight moved.
    Handled,
    NotHandled,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceholderMenu {
    state: AutocompleteState,
}

/// Whether typing `typed` with `before` just ahead of the caret completes `[[`.
pub fn completes_trigger(before: Option<char>, typed: &str) -> bool {
    typed == "[" && before == Some('[')
}

impl PlaceholderMenu {
    pub fn state(&self) -> &AutocompleteState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, AutocompleteState::MenuOpen(_))
    }

    pub fn anchor(&self) -> Option<MenuAnchor> {
        match &self.state {
            AutocompleteState::MenuOpen(menu) => Some(menu.anchor),
            AutocompleteState::Idle => None,
        }
    }

    pub fn open(&mut self, anchor: MenuAnchor) {
        tracing::debug!(?anchor, "placeholder menu opened");
        self.state = AutocompleteState::MenuOpen(MenuState {
            anchor,
            query: String::new(),
            highlighted: 0,
        });
    }

    /// Close without inserting anything. Returns whether it was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = AutocompleteState::Idle;
        was_open
    }

    /// A pointer press; closes unless it landed inside the menu.
    pub fn pointer_down(&mut self, inside_menu: bool) -> bool {
        !inside_menu && self.close()
    }

    pub fn query(&self) -> &str {
        match &self.state {
            AutocompleteState::MenuOpen(menu) => &menu.query,
            AutocompleteState::Idle => "",
        }
    }

    /// Update the live filter; the highlight returns to the first match.
    pub fn set_query(&mut self, query: &str) {
        if let AutocompleteState::MenuOpen(menu) = &mut self.state {
            menu.query = query.to_string();
            menu.highlighted = 0;
        }
    }

    pub fn matches<'a>(&self, catalog: &'a [PlaceholderEntry]) -> Vec<&'a PlaceholderEntry> {
        filter_catalog(catalog, self.query())
    }

    pub fn highlighted<'a>(&self, catalog: &'a [PlaceholderEntry]) -> Option<&'a PlaceholderEntry> {
        let AutocompleteState::MenuOpen(menu) = &self.state else {
            return None;
        };
        self.matches(catalog).get(menu.highlighted).copied()
    }

    /// Move the highlight, wrapping around the filtered list.
    pub fn move_highlight(&mut self, delta: isize, catalog: &[PlaceholderEntry]) {
        let count = self.matches(catalog).len();
        if let AutocompleteState::MenuOpen(menu) = &mut self.state {
            if count == 0 {
                menu.highlighted = 0;
                return;
            }
            let current = menu.highlighted.min(count - 1) as isize;
            menu.highlighted = (current + delta).rem_euclid(count as isize) as usize;
        }
    }

    pub fn handle_key(&mut self, key: &Key, catalog: &[PlaceholderEntry]) -> MenuKeyResult {
        if !self.is_open() {
            return MenuKeyResult::NotHandled;
        }
        match key {
            Key::ArrowDown => {
                self.move_highlight(1, catalog);
                MenuKeyResult::Handled
            }
            Key::ArrowUp => {
                self.move_highlight(-1, catalog);
                MenuKeyResult::Handled
            }
            Key::Enter => match self.highlighted(catalog).map(|entry| entry.value.clone()) {
                Some(value) => {
                    self.close();
                    MenuKeyResult::Select(value)
                }
                None => MenuKeyResult::Handled,
            },
            Key::Escape => {
                self.close();
                MenuKeyResult::Closed
            }
            _ => MenuKeyResult::NotHandled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NoGeometry;

    struct FixedGeometry;

    impl SurfaceGeometry for FixedGeometry {
        fn caret_rect(&self, offset: usize) -> Option<Rect> {
            Some(Rect::new(offset as f64 * 8.0, 20.0, 1.0, 16.0))
        }

        fn picker_button_rect(&self) -> Option<Rect> {
            Some(Rect::new(300.0, 0.0, 24.0, 24.0))
        }
    }

    fn catalog() -> Vec<PlaceholderEntry> {
        vec![
            PlaceholderEntry::new("Customer ID", "[[CUSTOMER_ID]]"),
            PlaceholderEntry::new("First name", "[[FIRST_NAME]]").with_description("Given name"),
            PlaceholderEntry::new("Rate plan", "[[RATE_PLAN]]"),
        ]
    }

    #[test]
    fn test_trigger() {
        assert!(completes_trigger(Some('['), "["));
        assert!(!completes_trigger(Some('x'), "["));
        assert!(!completes_trigger(None, "["));
        assert!(!completes_trigger(Some('['), "[["));
    }

    #[test]
    fn test_anchor() {
        let anchor = MenuAnchor::at_caret(&FixedGeometry, 3);
        assert_eq!(anchor.position(), Some((24.0, 36.0)));

        let anchor = MenuAnchor::for_shortcut(&NoGeometry, Some(3));
        assert_eq!(anchor, MenuAnchor::PickerButton { rect: None });
        assert_eq!(anchor.position(), None);

        let anchor = MenuAnchor::for_shortcut(&FixedGeometry, None);
        assert_eq!(anchor.position(), Some((300.0, 24.0)));
    }

    #[test]
    fn test_filter_and_highlight() {
        let catalog = catalog();
        let mut menu = PlaceholderMenu::default();
        menu.open(MenuAnchor::PickerButton { rect: None });
        assert_eq!(menu.matches(&catalog).len(), 3);

        menu.set_query("NAME");
        let labels: Vec<_> = menu.matches(&catalog).iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, ["First name"]);

        menu.set_query("");
        assert_eq!(menu.handle_key(&Key::ArrowUp, &catalog), MenuKeyResult::Handled);
        assert_eq!(menu.highlighted(&catalog).map(|e| e.label.as_str()), Some("Rate plan"));
        menu.handle_key(&Key::ArrowDown, &catalog);
        assert_eq!(
            menu.handle_key(&Key::Enter, &catalog),
            MenuKeyResult::Select("[[CUSTOMER_ID]]".into())
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn test_close_paths() {
        let catalog = catalog();
        let mut menu = PlaceholderMenu::default();
        assert_eq!(menu.handle_key(&Key::Escape, &catalog), MenuKeyResult::NotHandled);

        menu.open(MenuAnchor::PickerButton { rect: None });
        assert!(!menu.pointer_down(true));
        assert!(menu.is_open());
        assert!(menu.pointer_down(false));
        assert!(!menu.is_open());

        menu.open(MenuAnchor::PickerButton { rect: None });
        assert_eq!(menu.handle_key(&Key::Escape, &catalog), MenuKeyResult::Closed);
        assert_eq!(menu.state(), &AutocompleteState::Idle);
    }

    #[test]
    fn test_enter_with_no_matches() {
        let catalog = catalog();
        let mut menu = PlaceholderMenu::default();
        menu.open(MenuAnchor::PickerButton { rect: None });
        menu.set_query("zzz");
        assert_eq!(menu.handle_key(&Key::Enter, &catalog), MenuKeyResult::Handled);
        assert!(menu.is_open());
    }
}
