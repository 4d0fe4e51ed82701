//! gridmail-editor-core: Rich HTML email template editor logic without
//! framework dependencies.
//!
//! This crate provides:
//! - `Fragment` / `Node` - owned document tree with a tolerant HTML parser
//! - `RichDocument` - segment-offset editing model with revisioned selections
//! - Placeholder chips, orphan wrapping and inline-style injection
//! - `EditorCommand` dispatch, keybindings and undo history
//! - `HtmlEditor` - the facade a surface drives, committing stored documents
//!   to a `ChangeListener`

pub mod actions;
pub mod autocomplete;
pub mod bridge;
pub mod config;
pub mod document;
pub mod dom;
pub mod editor;
pub mod error;
pub mod execute;
pub mod format;
pub mod html;
pub mod placeholder;
pub mod platform;
pub mod runs;
pub mod sanitize;
pub mod segment;
pub mod shell;
pub mod structure;
pub mod text;
pub mod toolbar;
pub mod types;
pub mod undo;
pub mod view;
pub mod wire;

pub use actions::{
    EditorCommand, InputType, Key, KeyCombo, KeybindingConfig, KeydownResult, Modifiers, Range,
};
pub use autocomplete::{AutocompleteState, MenuAnchor, MenuKeyResult, PlaceholderMenu};
pub use bridge::{Reconcile, commit, display_fragment, reconcile, should_adopt_external_value};
pub use config::{EditorConfig, validate_catalog};
pub use document::RichDocument;
pub use dom::{Element, Fragment, Node};
pub use editor::{ChangeListener, ChangeLog, HtmlEditor};
pub use error::{ConfigError, EditorError};
pub use execute::{CommandContext, execute_command};
pub use format::{BlockFormat, FormatState, ListKind};
pub use placeholder::{PlaceholderEntry, collect_tokens, display_pass, find_tokens, storage_pass};
pub use platform::{ClipboardPlatform, MemoryClipboard, NoGeometry, SurfaceGeometry};
pub use sanitize::{InlineStyles, ensure_not_empty, wrap_orphans};
pub use shell::{unwrap_document, wrap_document};
pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use toolbar::{Popover, ToolbarState};
pub use types::{Rect, Selection, SelectionSnapshot};
pub use undo::History;
pub use view::{ViewController, ViewMode};
pub use wire::{WireViolation, check_wire};
