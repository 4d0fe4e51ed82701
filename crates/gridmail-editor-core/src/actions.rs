//! Editor commands and input types.
//!
//! The `EditorCommand` enum represents semantic operations on the template
//! document, while `InputType` carries the intent of an input event (browser
//! `beforeinput`, native input methods). `KeybindingConfig` maps key combos
//! to commands.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::format::BlockFormat;
use crate::toolbar::Popover;
use crate::types::Selection;

/// A range in the document, measured in document offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

impl From<Selection> for Range {
    fn from(sel: Selection) -> Self {
        Self::new(sel.start(), sel.end())
    }
}

/// Semantic input types from input events.
///
/// Based on the W3C Input Events specification, limited to the intents the
/// template editor acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    InsertText,
    /// Insert text from IME composition.
    InsertCompositionText,
    /// Shift+Enter.
    InsertLineBreak,
    /// Enter.
    InsertParagraph,
    InsertFromPaste,
    InsertFromDrop,
    /// Spell check correction and similar.
    InsertReplacementText,
    InsertOrderedList,
    InsertUnorderedList,
    InsertLink,

    DeleteContentBackward,
    DeleteContentForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteByCut,
    DeleteByDrag,
    DeleteContent,

    HistoryUndo,
    HistoryRedo,

    FormatBold,
    FormatItalic,
    FormatUnderline,

    Unknown(String),
}

impl InputType {
    /// Parse a DOM `inputType` name such as `insertText`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "insertText" => Self::InsertText,
            "insertCompositionText" => Self::InsertCompositionText,
            "insertLineBreak" => Self::InsertLineBreak,
            "insertParagraph" => Self::InsertParagraph,
            "insertFromPaste" => Self::InsertFromPaste,
            "insertFromDrop" => Self::InsertFromDrop,
            "insertReplacementText" => Self::InsertReplacementText,
            "insertOrderedList" => Self::InsertOrderedList,
            "insertUnorderedList" => Self::InsertUnorderedList,
            "insertLink" => Self::InsertLink,
            "deleteContentBackward" => Self::DeleteContentBackward,
            "deleteContentForward" => Self::DeleteContentForward,
            "deleteWordBackward" => Self::DeleteWordBackward,
            "deleteWordForward" => Self::DeleteWordForward,
            "deleteByCut" => Self::DeleteByCut,
            "deleteByDrag" => Self::DeleteByDrag,
            "deleteContent" => Self::DeleteContent,
            "historyUndo" => Self::HistoryUndo,
            "historyRedo" => Self::HistoryRedo,
            "formatBold" => Self::FormatBold,
            "formatItalic" => Self::FormatItalic,
            "formatUnderline" => Self::FormatUnderline,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The command for this input, if the editor handles it itself.
    ///
    /// `InsertLink` has no command: a link needs a URL, so the host opens the
    /// link popover instead.
    pub fn to_command(&self, data: Option<&str>, range: Range) -> Option<EditorCommand> {
        let command = match self {
            Self::InsertText
            | Self::InsertCompositionText
            | Self::InsertReplacementText
            | Self::InsertFromDrop => EditorCommand::InsertText {
                text: data?.to_string(),
                range,
            },
            Self::InsertLineBreak => EditorCommand::InsertLineBreak { range },
            Self::InsertParagraph => EditorCommand::InsertParagraph { range },
            Self::InsertFromPaste => EditorCommand::Paste { range },
            Self::InsertOrderedList => EditorCommand::ToggleOrderedList,
            Self::InsertUnorderedList => EditorCommand::ToggleUnorderedList,
            Self::DeleteContentBackward => EditorCommand::DeleteBackward { range },
            Self::DeleteContentForward | Self::DeleteByCut | Self::DeleteByDrag | Self::DeleteContent => {
                EditorCommand::DeleteForward { range }
            }
            Self::DeleteWordBackward => EditorCommand::DeleteWordBackward { range },
            Self::DeleteWordForward => EditorCommand::DeleteWordForward { range },
            Self::HistoryUndo => EditorCommand::Undo,
            Self::HistoryRedo => EditorCommand::Redo,
            Self::FormatBold => EditorCommand::ToggleBold,
            Self::FormatItalic => EditorCommand::ToggleItalic,
            Self::FormatUnderline => EditorCommand::ToggleUnderline,
            Self::InsertLink | Self::Unknown(_) => return None,
        };
        Some(command)
    }
}

/// All editor commands.
///
/// Semantic operations on the document, decoupled from how they are
/// triggered. Commands that carry a `range` act on it; the rest act on the
/// document's current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    /// Insert text at the range, replacing any selected content.
    InsertText { text: String, range: Range },
    /// Shift+Enter, a `<br>`.
    InsertLineBreak { range: Range },
    /// Enter, splits the block.
    InsertParagraph { range: Range },

    DeleteBackward { range: Range },
    DeleteForward { range: Range },
    DeleteWordBackward { range: Range },
    DeleteWordForward { range: Range },

    Undo,
    Redo,

    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleOrderedList,
    ToggleUnorderedList,
    /// Retag the whole block containing the selection.
    SetBlockFormat(BlockFormat),
    SetFontFamily(String),

    /// Link the selection. Ignored if the URL is empty or still the default.
    InsertLink { href: String },
    /// Insert a styled call-to-action anchor.
    InsertButton { text: String, href: String },
    /// Insert the 3x3 table skeleton at the cursor.
    InsertTable,
    /// Insert a placeholder chip, replacing the selection.
    InsertPlaceholder { token: String },

    /// Paste the clipboard as plain text.
    Paste { range: Range },

    SelectAll,
    MoveCursor { offset: usize },
    ExtendSelection { offset: usize },

    /// Open a toolbar popover, closing any other.
    OpenPopover(Popover),
    /// Close the open popover or placeholder menu without side effects.
    ClosePopover,
}

impl EditorCommand {
    /// Update the range in commands that use one.
    pub fn with_range(self, range: Range) -> Self {
        match self {
            Self::InsertText { text, .. } => Self::InsertText { text, range },
            Self::InsertLineBreak { .. } => Self::InsertLineBreak { range },
            Self::InsertParagraph { .. } => Self::InsertParagraph { range },
            Self::DeleteBackward { .. } => Self::DeleteBackward { range },
            Self::DeleteForward { .. } => Self::DeleteForward { range },
            Self::DeleteWordBackward { .. } => Self::DeleteWordBackward { range },
            Self::DeleteWordForward { .. } => Self::DeleteWordForward { range },
            Self::Paste { .. } => Self::Paste { range },
            other => other,
        }
    }

    /// Whether the command can change the document.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::SelectAll
                | Self::MoveCursor { .. }
                | Self::ExtendSelection { .. }
                | Self::OpenPopover(_)
                | Self::ClosePopover
        )
    }
}

/// Key values for keyboard input.
///
/// Platform-specific code converts native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    Alt,
    AltGraph,
    CapsLock,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key. Letters are stored lower-cased, so Shift+Z
    /// and Shift+z are the same combo.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        let s: SmolStr = s.into();
        if s == " " {
            return Self::Space;
        }
        Self::Character(SmolStr::new(s.to_lowercase()))
    }

    /// Parse a DOM `key` value or a shortcut key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "Space" | " " => Self::Space,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Alt" => Self::Alt,
            "AltGraph" => Self::AltGraph,
            "CapsLock" => Self::CapsLock,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "" | "Unidentified" => Self::Unidentified,
            other if other.chars().count() == 1 => Self::character(other),
            _ => Self::Unidentified,
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Alt | Self::AltGraph | Self::CapsLock | Self::Control | Self::Meta | Self::Shift
        )
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    /// Get the primary modifier + Shift for the platform.
    pub fn primary_shift(is_mac: bool) -> Self {
        Self {
            shift: true,
            ..Self::primary(is_mac)
        }
    }
}

/// A key combination for triggering a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary_shift(is_mac),
        }
    }

    /// Parse a shortcut such as `Mod+Space` or `Ctrl+Shift+K`.
    ///
    /// `Mod` is the platform's primary modifier.
    pub fn parse(shortcut: &str, is_mac: bool) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidShortcut(shortcut.to_string());
        let mut parts: Vec<&str> = shortcut.split('+').map(str::trim).collect();
        // "Mod++" binds the plus key.
        if shortcut.ends_with("++") {
            parts.truncate(parts.len().saturating_sub(2));
            parts.push("+");
        }
        let (key_name, modifier_names) = parts.split_last().ok_or_else(invalid)?;
        let mut modifiers = Modifiers::NONE;
        for name in modifier_names {
            match name.to_ascii_lowercase().as_str() {
                "mod" | "primary" => {
                    let primary = Modifiers::primary(is_mac);
                    modifiers.ctrl |= primary.ctrl;
                    modifiers.meta |= primary.meta;
                }
                "ctrl" | "control" => modifiers.ctrl = true,
                "cmd" | "meta" | "super" => modifiers.meta = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                _ => return Err(invalid()),
            }
        }
        let key = Key::from_name(key_name);
        if key == Key::Unidentified || key.is_modifier() {
            return Err(invalid());
        }
        Ok(Self { key, modifiers })
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Key combo to command table.
#[derive(Debug, Clone, Default)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorCommand>,
}

impl KeybindingConfig {
    /// Default bindings with the platform's primary modifier.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let mut config = Self::default();
        let primary = |c: &str| KeyCombo::primary(Key::character(c), is_mac);

        config.bind(primary("b"), EditorCommand::ToggleBold);
        config.bind(primary("i"), EditorCommand::ToggleItalic);
        config.bind(primary("u"), EditorCommand::ToggleUnderline);
        config.bind(primary("k"), EditorCommand::OpenPopover(Popover::Link));
        config.bind(primary("z"), EditorCommand::Undo);
        config.bind(
            KeyCombo::primary_shift(Key::character("z"), is_mac),
            EditorCommand::Redo,
        );
        config.bind(primary("y"), EditorCommand::Redo);
        config.bind(
            KeyCombo::primary(Key::Space, is_mac),
            EditorCommand::OpenPopover(Popover::Placeholder),
        );
        config.bind(KeyCombo::new(Key::Escape), EditorCommand::ClosePopover);
        config
    }

    pub fn bind(&mut self, combo: KeyCombo, command: EditorCommand) {
        self.bindings.insert(combo, command);
    }

    /// Rebind the placeholder picker to a parsed shortcut, dropping the old one.
    pub fn set_placeholder_shortcut(
        &mut self,
        shortcut: &str,
        is_mac: bool,
    ) -> Result<(), ConfigError> {
        let combo = KeyCombo::parse(shortcut, is_mac)?;
        let picker = EditorCommand::OpenPopover(Popover::Placeholder);
        self.bindings.retain(|_, command| *command != picker);
        self.bind(combo, picker);
        Ok(())
    }

    /// The command bound to a combo, with its range set.
    pub fn lookup(&self, combo: &KeyCombo, range: Range) -> Option<EditorCommand> {
        self.bindings
            .get(combo)
            .map(|command| command.clone().with_range(range))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
