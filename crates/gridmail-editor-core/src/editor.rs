//! `HtmlEditor`: one template editor instance.
//!
//! Owns the live document, undo history, toolbar and menu state, and the
//! view controller. Takes the stored value in through [`HtmlEditor::set_value`]
//! and hands every normalized mutation to its [`ChangeListener`]. Nothing
//! fails outward: degraded paths are logged and the editor carries on.

use crate::actions::{EditorCommand, InputType, KeyCombo, KeybindingConfig, KeydownResult, Range};
use crate::autocomplete::{MenuAnchor, MenuKeyResult, PlaceholderMenu, completes_trigger};
use crate::bridge::{self, Reconcile};
use crate::config::EditorConfig;
use crate::document::RichDocument;
use crate::dom::Fragment;
use crate::error::EditorError;
use crate::execute::{CommandContext, execute_command};
use crate::format::FormatState;
use crate::placeholder::PlaceholderEntry;
use crate::platform::{ClipboardPlatform, MemoryClipboard, NoGeometry, SurfaceGeometry};
use crate::toolbar::{Popover, ToolbarState};
use crate::types::{Selection, SelectionSnapshot};
use crate::undo::{EditKind, History};
use crate::view::{ViewController, ViewMode};

/// Receives the stored document after every normalized mutation.
pub trait ChangeListener {
    fn on_change(&mut self, value: &str);
}

impl<F: FnMut(&str)> ChangeListener for F {
    fn on_change(&mut self, value: &str) {
        self(value)
    }
}

/// Listener that keeps every emitted value.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog(pub Vec<String>);

impl ChangeLog {
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl ChangeListener for ChangeLog {
    fn on_change(&mut self, value: &str) {
        self.0.push(value.to_string());
    }
}

pub struct HtmlEditor<L: ChangeListener> {
    config: EditorConfig,
    keybindings: KeybindingConfig,
    doc: RichDocument,
    history: History,
    toolbar: ToolbarState,
    menu: PlaceholderMenu,
    view: ViewController,
    catalog: Vec<PlaceholderEntry>,
    clipboard: Box<dyn ClipboardPlatform>,
    geometry: Box<dyn SurfaceGeometry>,
    /// Last value received or emitted.
    value: String,
    focused: bool,
    saved_selection: Option<SelectionSnapshot>,
    listener: L,
}

impl<L: ChangeListener> HtmlEditor<L> {
    /// Create an editor. An invalid config is logged and replaced by defaults
    /// where it matters.
    pub fn new(config: EditorConfig, listener: L) -> Self {
        let keybindings = config.keybindings().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid shortcut config, using defaults");
            KeybindingConfig::default_for_platform(config.mac_keys)
        });
        if let Err(err) = config.validate() {
            tracing::warn!(error = %err, "invalid editor config");
        }
        let history = History::new(config.history_depth);
        let mut editor = Self {
            config,
            keybindings,
            doc: RichDocument::new(),
            history,
            toolbar: ToolbarState::default(),
            menu: PlaceholderMenu::default(),
            view: ViewController::default(),
            catalog: Vec::new(),
            clipboard: Box::new(MemoryClipboard::new()),
            geometry: Box::new(NoGeometry),
            value: String::new(),
            focused: false,
            saved_selection: None,
            listener,
        };
        editor.adopt("");
        editor
    }

    pub fn with_catalog(mut self, catalog: Vec<PlaceholderEntry>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_clipboard(mut self, clipboard: impl ClipboardPlatform + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    pub fn with_geometry(mut self, geometry: impl SurfaceGeometry + 'static) -> Self {
        self.geometry = Box::new(geometry);
        self
    }

    pub fn set_catalog(&mut self, catalog: Vec<PlaceholderEntry>) {
        self.catalog = catalog;
    }

    // === Accessors ===

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &RichDocument {
        &self.doc
    }

    /// Live surface content, chips included.
    pub fn surface_html(&self) -> String {
        self.doc.to_html()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn toolbar(&self) -> &ToolbarState {
        &self.toolbar
    }

    pub fn toolbar_mut(&mut self) -> &mut ToolbarState {
        &mut self.toolbar
    }

    pub fn menu(&self) -> &PlaceholderMenu {
        &self.menu
    }

    pub fn catalog(&self) -> &[PlaceholderEntry] {
        &self.catalog
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn format_state(&self) -> &FormatState {
        &self.toolbar.format
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // === Focus and external value ===

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Offer a new external value. Ignored while the surface has focus, and
    /// when it is just the echo of our own last change.
    pub fn set_value(&mut self, value: &str) -> Reconcile {
        if self.focused {
            tracing::trace!("surface focused, external value ignored");
            return Reconcile::SkippedFocused;
        }
        if value == self.value {
            tracing::trace!("external value is our own last change");
            return Reconcile::Unchanged;
        }
        self.adopt(value)
    }

    fn adopt(&mut self, value: &str) -> Reconcile {
        let outcome = bridge::reconcile(
            &mut self.doc,
            self.focused,
            value,
            &self.config.chip_style,
            &self.config.inline_styles,
        );
        self.value = value.to_string();
        if outcome == Reconcile::Adopted {
            self.history.clear_history();
            self.saved_selection = None;
            self.refresh_format();
        }
        outcome
    }

    // === Commands ===

    /// Apply a command. Returns true if it was handled.
    pub fn execute(&mut self, command: EditorCommand) -> bool {
        match &command {
            EditorCommand::Undo => return self.undo(),
            EditorCommand::Redo => return self.redo(),
            EditorCommand::Paste { range } => return self.paste(*range),
            EditorCommand::OpenPopover(popover) => {
                self.open_popover(*popover);
                return true;
            }
            EditorCommand::ClosePopover => return self.close_popover(),
            EditorCommand::InsertText { text, range } => {
                if range.is_caret() && completes_trigger(self.doc.char_before(range.start), text) {
                    return self.open_menu_from_trigger(range.start);
                }
            }
            _ => {}
        }

        let kind = match command {
            EditorCommand::InsertText { .. } => EditKind::Typing,
            _ => EditKind::Other,
        };
        let before = command.is_mutation().then(|| self.doc.clone());
        let ctx = CommandContext {
            chip_style: &self.config.chip_style,
        };
        let handled = execute_command(&mut self.doc, &command, ctx);
        self.focused = true;
        if !handled {
            return false;
        }
        match before {
            Some(before) => {
                self.history.record(&before, kind);
                self.commit();
            }
            None => self.refresh_format(),
        }
        true
    }

    fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.doc) {
            return false;
        }
        self.commit();
        true
    }

    fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.doc) {
            return false;
        }
        self.commit();
        true
    }

    /// Paste the clipboard as plain text. Rich content only contributes its
    /// text; line breaks become `<br>`.
    fn paste(&mut self, range: Range) -> bool {
        let text = match self.clipboard.read_text() {
            Some(text) => Some(text),
            None => self
                .clipboard
                .read_html()
                .map(|html| Fragment::parse(&html).text_content()),
        };
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            tracing::debug!("nothing to paste");
            return false;
        };
        let before = self.doc.clone();
        let ctx = CommandContext {
            chip_style: &self.config.chip_style,
        };
        execute_command(&mut self.doc, &EditorCommand::InsertText { text, range }, ctx);
        self.focused = true;
        self.history.record(&before, EditKind::Other);
        self.commit();
        true
    }

    /// Run the commit pipeline and notify the listener.
    fn commit(&mut self) {
        let value = bridge::commit(&mut self.doc, &self.config.inline_styles);
        self.value = value;
        self.listener.on_change(&self.value);
        self.refresh_format();
    }

    fn refresh_format(&mut self) {
        let format = self.doc.format_at(self.doc.selection());
        self.toolbar.refresh(format);
    }

    // === Selection snapshots ===

    /// Put back the selection saved when a popover opened. A stale or
    /// missing snapshot falls back to the end of the document.
    fn restore_saved_selection(&mut self) {
        let restored = self
            .saved_selection
            .take()
            .ok_or(EditorError::NoSnapshot)
            .and_then(|snapshot| self.doc.restore(&snapshot));
        let selection = match restored {
            Ok(selection) => selection,
            Err(err) => {
                tracing::warn!(error = %err, "selection restore failed, using end of document");
                Selection::collapsed(self.doc.len())
            }
        };
        self.doc.set_selection(selection);
        self.focused = true;
    }

    // === Popovers and the placeholder menu ===

    pub fn open_popover(&mut self, popover: Popover) {
        if let Some(previous) = self.toolbar.open(popover) {
            tracing::trace!(?previous, ?popover, "popover replaced");
        }
        if popover == Popover::Placeholder {
            let caret = self.focused.then(|| self.doc.cursor_offset());
            self.menu.open(MenuAnchor::for_shortcut(self.geometry.as_ref(), caret));
        } else {
            self.menu.close();
        }
        self.saved_selection = popover.needs_snapshot().then(|| self.doc.snapshot());
    }

    /// Close whatever is open. Nothing is applied.
    pub fn close_popover(&mut self) -> bool {
        let closed_popover = self.toolbar.close().is_some();
        let closed_menu = self.menu.close();
        self.saved_selection = None;
        closed_popover || closed_menu
    }

    /// A pointer press, inside the open popover/menu or outside it.
    pub fn pointer_down(&mut self, inside_popover: bool) {
        if !inside_popover {
            self.close_popover();
        }
    }

    fn open_menu_from_trigger(&mut self, offset: usize) -> bool {
        let before = self.doc.clone();
        let cursor = self.doc.delete_range(offset - 1..offset);
        self.doc.set_cursor(cursor);
        self.focused = true;
        self.history.record(&before, EditKind::Typing);
        self.commit();

        self.toolbar.open(Popover::Placeholder);
        self.menu
            .open(MenuAnchor::at_caret(self.geometry.as_ref(), cursor));
        self.saved_selection = Some(self.doc.snapshot());
        true
    }

    pub fn set_menu_query(&mut self, query: &str) {
        self.menu.set_query(query);
    }

    /// Insert a placeholder chosen from the menu at the saved selection.
    pub fn select_placeholder(&mut self, value: &str) -> bool {
        self.restore_saved_selection();
        self.toolbar.close();
        self.menu.close();
        self.execute(EditorCommand::InsertPlaceholder {
            token: value.to_string(),
        })
    }

    /// Insert a placeholder at the current selection, or at the end of the
    /// document if the surface never had focus.
    pub fn insert_placeholder(&mut self, token: &str) -> bool {
        if !self.focused {
            self.doc.set_cursor(self.doc.len());
        }
        self.execute(EditorCommand::InsertPlaceholder {
            token: token.to_string(),
        })
    }

    /// Confirm the link popover with its URL field.
    pub fn confirm_link(&mut self) -> bool {
        if !self.toolbar.is_open(Popover::Link) {
            return false;
        }
        let href = self.toolbar.link_form.url.clone();
        if !self.toolbar.link_form.is_submittable() {
            tracing::debug!("link confirmed without a url");
            self.close_popover();
            return false;
        }
        self.restore_saved_selection();
        self.close_popover();
        self.execute(EditorCommand::InsertLink { href })
    }

    /// Confirm the button popover with its text and URL fields.
    pub fn confirm_button(&mut self) -> bool {
        if !self.toolbar.is_open(Popover::Button) {
            return false;
        }
        let form = self.toolbar.button_form.clone();
        if !form.is_submittable() {
            tracing::debug!("button confirmed without text or url");
            self.close_popover();
            return false;
        }
        self.restore_saved_selection();
        self.close_popover();
        self.execute(EditorCommand::InsertButton {
            text: form.text,
            href: form.url,
        })
    }

    // === Input ===

    /// Handle a keydown. The open menu sees keys first, then keybindings.
    pub fn handle_keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        if self.menu.is_open() {
            match self.menu.handle_key(&combo.key, &self.catalog) {
                MenuKeyResult::Select(value) => {
                    self.select_placeholder(&value);
                    return KeydownResult::Handled;
                }
                MenuKeyResult::Closed => {
                    self.close_popover();
                    return KeydownResult::Handled;
                }
                MenuKeyResult::Handled => return KeydownResult::Handled,
                MenuKeyResult::NotHandled => {}
            }
        }

        let range = Range::from(self.doc.selection());
        if let Some(command) = self.keybindings.lookup(combo, range) {
            self.execute(command);
            return KeydownResult::Handled;
        }

        if combo.key.is_navigation() || combo.key.is_modifier() {
            return KeydownResult::PassThrough;
        }
        KeydownResult::NotHandled
    }

    /// Handle a `beforeinput`-style event. Returns true if the editor
    /// handled it and the platform default should be prevented.
    pub fn handle_input(&mut self, input: &InputType, data: Option<&str>) -> bool {
        if *input == InputType::InsertLink {
            self.open_popover(Popover::Link);
            return true;
        }
        let range = Range::from(self.doc.selection());
        match input.to_command(data, range) {
            Some(command) => self.execute(command),
            None => {
                tracing::trace!(?input, "input left to the platform");
                false
            }
        }
    }

    /// Convenience for typing text at the current selection.
    pub fn type_text(&mut self, text: &str) -> bool {
        let range = Range::from(self.doc.selection());
        self.execute(EditorCommand::InsertText {
            text: text.to_string(),
            range,
        })
    }

    // === View mode ===

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Html => {
                self.close_popover();
                self.focused = false;
                self.view.enter_html(&self.value);
            }
            ViewMode::Edit => {
                self.view.enter_edit();
                self.focused = false;
                if !self.view.source_edited() {
                    tracing::trace!("source untouched, live surface kept");
                    return;
                }
                let value = self.value.clone();
                self.adopt(&value);
            }
        }
    }

    /// Replace the source view text. Commits immediately.
    pub fn set_source(&mut self, text: &str) {
        let value = self.view.set_source(text);
        self.emit_source(value);
    }

    /// Edit a char range of the source view text. Commits immediately.
    pub fn edit_source(&mut self, range: std::ops::Range<usize>, text: &str) {
        let value = self.view.edit_source(range, text);
        self.emit_source(value);
    }

    fn emit_source(&mut self, value: String) {
        if self.view.mode() != ViewMode::Html {
            tracing::warn!("source edit outside the html view");
        }
        self.value = value;
        self.listener.on_change(&self.value);
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.view.toggle_fullscreen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Key;
    use crate::sanitize::InlineStyles;
    use crate::types::Rect;

    struct FixedGeometry;

    impl SurfaceGeometry for FixedGeometry {
        fn caret_rect(&self, offset: usize) -> Option<Rect> {
            Some(Rect::new(offset as f64 * 10.0, 5.0, 1.0, 20.0))
        }

        fn picker_button_rect(&self) -> Option<Rect> {
            Some(Rect::new(300.0, 0.0, 24.0, 24.0))
        }
    }

    fn editor() -> HtmlEditor<ChangeLog> {
        let config = EditorConfig {
            inline_styles: InlineStyles::empty(),
            ..EditorConfig::default()
        };
        HtmlEditor::new(config, ChangeLog::default())
    }

    fn body(value: &str) -> &str {
        crate::shell::unwrap_document(value)
    }

    #[test]
    fn test_starts_with_empty_paragraph() {
        let editor = editor();
        assert_eq!(editor.surface_html(), "<p></p>");
        assert!(editor.listener().0.is_empty());
    }

    #[test]
    fn test_typing_emits_changes() {
        let mut editor = editor();
        editor.type_text("Hi");
        assert_eq!(
            editor.listener().last(),
            Some("<!DOCTYPE html><html><body><p>Hi</p></body></html>")
        );
        assert_eq!(editor.value(), editor.listener().last().unwrap());
    }

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut editor = HtmlEditor::new(EditorConfig::default(), |v: &str| seen.push(v.to_string()));
            editor.type_text("x");
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_focus_blocks_external_value() {
        let mut editor = editor();
        editor.type_text("mine");
        assert!(editor.has_focus());
        assert_eq!(editor.set_value("<p>theirs</p>"), Reconcile::SkippedFocused);
        assert_eq!(editor.surface_html(), "<p>mine</p>");

        editor.blur();
        assert_eq!(editor.set_value("<p>theirs</p>"), Reconcile::Adopted);
        assert_eq!(editor.surface_html(), "<p>theirs</p>");
    }

    #[test]
    fn test_own_echo_keeps_history() {
        let mut editor = editor();
        editor.type_text("a");
        editor.blur();
        let echo = editor.value().to_string();
        assert_eq!(editor.set_value(&echo), Reconcile::Unchanged);
        assert!(editor.can_undo());
    }

    #[test]
    fn test_bracket_trigger_opens_menu() {
        let mut editor = editor().with_catalog(vec![PlaceholderEntry::new("Name", "[[NAME]]")]);
        editor.type_text("Hi [");
        editor.type_text("[");
        assert!(editor.menu().is_open());
        assert_eq!(editor.surface_html(), "<p>Hi </p>");

        let result = editor.handle_keydown(&KeyCombo::new(Key::Enter));
        assert_eq!(result, KeydownResult::Handled);
        assert!(!editor.menu().is_open());
        assert_eq!(body(editor.value()), "<p>Hi [[NAME]]</p>");
    }

    #[test]
    fn test_pasted_brackets_do_not_trigger() {
        let mut editor = editor().with_clipboard(MemoryClipboard::with_text("[["));
        editor.type_text("a");
        editor.execute(EditorCommand::Paste {
            range: Range::caret(1),
        });
        assert!(!editor.menu().is_open());
        assert_eq!(body(editor.value()), "<p>a[[</p>");
    }

    #[test]
    fn test_escape_closes_menu_without_inserting() {
        let mut editor = editor();
        editor.focus();
        editor.handle_keydown(&KeyCombo::primary(Key::Space, false));
        assert!(editor.menu().is_open());
        assert!(editor.toolbar().is_open(Popover::Placeholder));
        let changes = editor.listener().0.len();
        assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Escape)), KeydownResult::Handled);
        assert!(!editor.menu().is_open());
        assert_eq!(editor.toolbar().popover(), None);
        assert_eq!(editor.listener().0.len(), changes);
    }

    #[test]
    fn test_stale_snapshot_falls_back_to_end() {
        let mut editor = editor();
        editor.type_text("hello");
        editor.execute(EditorCommand::MoveCursor { offset: 0 });
        editor.open_popover(Popover::Link);
        // A structural edit while the popover is open invalidates the snapshot.
        editor.execute(EditorCommand::InsertText {
            text: "Y".into(),
            range: Range::caret(5),
        });
        editor.toolbar_mut().link_form.url = "https://x.io".into();
        assert!(editor.confirm_link());
        assert_eq!(
            body(editor.value()),
            "<p>helloY<a href=\"https://x.io\">https://x.io</a></p>"
        );
    }

    #[test]
    fn test_undo_redo_commit() {
        let mut editor = editor();
        editor.type_text("a");
        editor.execute(EditorCommand::ToggleBold);
        assert!(editor.can_undo());
        editor.execute(EditorCommand::Undo);
        assert_eq!(body(editor.value()), "<p>a</p>");
        editor.execute(EditorCommand::Undo);
        assert_eq!(body(editor.value()), "<p></p>");
        editor.execute(EditorCommand::Redo);
        assert_eq!(body(editor.value()), "<p>a</p>");
    }

    #[test]
    fn test_toolbar_reflects_format() {
        let mut editor = editor();
        editor.blur();
        editor.set_value("<h2><b>Title</b></h2>");
        editor.execute(EditorCommand::MoveCursor { offset: 2 });
        assert!(editor.format_state().bold);
        assert_eq!(editor.toolbar().heading_value(), "h2");
    }

    #[test]
    fn test_html_view_round_trip() {
        let mut editor = editor();
        editor.blur();
        editor.set_value("<!DOCTYPE html><html><body><p>A</p></body></html>");
        editor.set_view_mode(ViewMode::Html);
        let text = editor.view().source_string();
        editor.set_source(&text.replace("<p>A</p>", "<p>B</p>"));
        assert_eq!(editor.surface_html(), "<p>A</p>");
        editor.set_view_mode(ViewMode::Edit);
        assert_eq!(editor.surface_html(), "<p>B</p>");
    }

    #[test]
    fn test_view_switch_keeps_live_state() {
        let mut editor = HtmlEditor::new(EditorConfig::default(), ChangeLog::default());
        editor.type_text("Hello");
        editor.execute(EditorCommand::MoveCursor { offset: 2 });
        assert!(editor.value().contains("<p style=\"margin"));

        editor.set_view_mode(ViewMode::Html);
        editor.set_view_mode(ViewMode::Edit);
        assert_eq!(editor.surface_html(), "<p>Hello</p>");
        assert!(editor.can_undo());
        assert_eq!(editor.document().selection(), Selection::collapsed(2));
    }

    #[test]
    fn test_source_edit_adopted_without_stored_styles() {
        let mut editor = HtmlEditor::new(EditorConfig::default(), ChangeLog::default());
        editor.type_text("Hello");
        editor.set_view_mode(ViewMode::Html);
        let text = editor.view().source_string().replace("Hello", "Bye");
        editor.set_source(&text);
        editor.set_view_mode(ViewMode::Edit);
        assert_eq!(editor.surface_html(), "<p>Bye</p>");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_button_needs_text_and_real_url() {
        let mut editor = editor();
        editor.type_text("Hi ");
        assert!(!editor.confirm_button());

        editor.open_popover(Popover::Button);
        editor.toolbar_mut().button_form.text = "Pay".into();
        assert!(!editor.confirm_button());
        assert_eq!(editor.toolbar().popover(), None);
        assert_eq!(body(editor.value()), "<p>Hi </p>");

        editor.open_popover(Popover::Button);
        editor.toolbar_mut().button_form.text = "Pay".into();
        editor.toolbar_mut().button_form.url = "https://pay.example".into();
        assert!(editor.confirm_button());
        let stored = body(editor.value());
        assert!(stored.starts_with("<p>Hi <a href=\"https://pay.example\" style=\""), "{stored}");
        assert!(stored.ends_with(">Pay</a></p>"), "{stored}");
    }

    #[test]
    fn test_menu_query_filters_selection() {
        let mut editor = editor().with_catalog(vec![
            PlaceholderEntry::new("Customer ID", "[[CUSTOMER_ID]]"),
            PlaceholderEntry::new("Rate plan", "[[RATE_PLAN]]"),
        ]);
        editor.type_text("Plan: [");
        editor.type_text("[");
        editor.set_menu_query("rat");
        assert_eq!(editor.menu().query(), "rat");
        assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Enter)), KeydownResult::Handled);
        assert!(!editor.menu().is_open());
        assert_eq!(body(editor.value()), "<p>Plan: [[RATE_PLAN]]</p>");
    }

    #[test]
    fn test_before_input_mapping() {
        let mut editor = editor();
        assert!(editor.handle_input(&InputType::InsertText, Some("ab")));
        assert!(editor.handle_input(&InputType::DeleteContentBackward, None));
        assert_eq!(body(editor.value()), "<p>a</p>");
        assert!(!editor.handle_input(&InputType::InsertText, None));
        assert!(!editor.handle_input(&InputType::from_name("insertFromYank"), None));

        let changes = editor.listener().0.len();
        assert!(editor.handle_input(&InputType::InsertLink, None));
        assert!(editor.toolbar().is_open(Popover::Link));
        assert_eq!(editor.listener().0.len(), changes);
    }

    #[test]
    fn test_menu_anchor_follows_geometry() {
        let mut editor = editor().with_geometry(FixedGeometry);
        editor.open_popover(Popover::Placeholder);
        assert_eq!(editor.menu().anchor().and_then(|a| a.position()), Some((300.0, 24.0)));
        editor.close_popover();

        editor.type_text("ab[");
        editor.type_text("[");
        assert_eq!(editor.menu().anchor().and_then(|a| a.position()), Some((20.0, 25.0)));
    }

    #[test]
    fn test_replaced_catalog_accepts_bare_names() {
        let mut editor = editor();
        editor.set_catalog(vec![PlaceholderEntry::new("Plan", "RATE_PLAN")]);
        editor.focus();
        editor.handle_keydown(&KeyCombo::primary(Key::Space, false));
        assert_eq!(editor.handle_keydown(&KeyCombo::new(Key::Enter)), KeydownResult::Handled);

        let log = editor.into_listener();
        assert_eq!(log.0.len(), 1);
        assert_eq!(log.last().map(body), Some("<p>[[RATE_PLAN]]</p>"));
    }
}
