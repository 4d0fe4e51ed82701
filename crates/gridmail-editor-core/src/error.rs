//! Error types for the editor core.
//!
//! None of these cross the [`crate::HtmlEditor`] boundary: the editor logs
//! them and degrades.

use miette::Diagnostic;

use crate::platform::PlatformError;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditorError {
    /// The document changed after the selection snapshot was taken
    #[error("selection snapshot from revision {snapshot} is stale (document is at {current})")]
    #[diagnostic(
        code(gridmail::stale_selection),
        help("take a new snapshot after the last structural edit")
    )]
    StaleSelection { snapshot: u64, current: u64 },

    /// No snapshot was taken before an out-of-band interaction
    #[error("no selection snapshot to restore")]
    #[diagnostic(code(gridmail::no_snapshot))]
    NoSnapshot,

    /// Clipboard or geometry access failed
    #[error("platform error: {0}")]
    #[diagnostic(code(gridmail::platform))]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("invalid key combination `{0}`")]
    #[diagnostic(
        code(gridmail::config::shortcut),
        help("use `+`-separated modifiers and a key, e.g. `Mod+Space` or `Ctrl+Shift+K`")
    )]
    InvalidShortcut(String),

    #[error("history depth must be at least 1")]
    #[diagnostic(code(gridmail::config::history_depth))]
    InvalidHistoryDepth,

    #[error("placeholder `{value}` does not name a token")]
    #[diagnostic(
        code(gridmail::config::placeholder),
        help("write it as `[[NAME]]` or a bare `NAME`, without `]` inside")
    )]
    InvalidPlaceholder { value: String },
}
