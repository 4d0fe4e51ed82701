//! KDL settings file.
//!
//! ```kdl
//! editor {
//!     min-height 320
//!     placeholder-shortcut "Mod+Shift+P"
//! }
//! styles {
//!     p "margin: 0; font-size: 14px;"
//! }
//! placeholders {
//!     placeholder "Customer ID" "[[CUSTOMER_ID]]" description="Account number"
//! }
//! ```

use std::path::{Path, PathBuf};

use gridmail_editor_core::{EditorConfig, PlaceholderEntry, validate_catalog};
use kdl::{KdlDocument, KdlNode, KdlValue};
use miette::{Diagnostic, IntoDiagnostic, Result, WrapErr};

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum SettingsError {
    #[error("`{node}` needs a {expected} value")]
    #[diagnostic(code(gridmail::settings::value))]
    BadValue { node: String, expected: &'static str },

    #[error("placeholder entries need a label and a value")]
    #[diagnostic(
        code(gridmail::settings::placeholder),
        help("placeholder \"Customer ID\" \"[[CUSTOMER_ID]]\"")
    )]
    IncompletePlaceholder,
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub editor: EditorConfig,
    pub catalog: Vec<PlaceholderEntry>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gridmail").join("editor.kdl"))
}

/// Load settings from `explicit`, else the default path if it exists, else
/// built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.exists()),
    };
    let Some(path) = path else {
        tracing::debug!("no config file, using defaults");
        return Ok(Settings::default());
    };
    tracing::debug!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read config {}", path.display()))?;
    let settings = parse(&content)?;
    settings.editor.validate()?;
    validate_catalog(&settings.catalog)?;
    Ok(settings)
}

pub fn parse(content: &str) -> Result<Settings> {
    let doc: KdlDocument = content.parse().into_diagnostic()?;
    let mut settings = Settings::default();

    if let Some(editor) = doc.get("editor").and_then(KdlNode::children) {
        for node in editor.nodes() {
            apply_editor_field(&mut settings.editor, node)?;
        }
    }
    if let Some(styles) = doc.get("styles").and_then(KdlNode::children) {
        for node in styles.nodes() {
            let style = string_arg(node)?;
            settings.editor.inline_styles.set(node.name().value(), style);
        }
    }
    if let Some(placeholders) = doc.get("placeholders").and_then(KdlNode::children) {
        for node in placeholders.nodes() {
            settings.catalog.push(placeholder_entry(node)?);
        }
    }
    Ok(settings)
}

fn apply_editor_field(config: &mut EditorConfig, node: &KdlNode) -> Result<(), SettingsError> {
    match node.name().value() {
        "empty-text" => config.empty_text = string_arg(node)?,
        "min-height" => config.min_height = int_arg(node)?,
        "label" => config.label = Some(string_arg(node)?),
        "helper-text" => config.helper_text = Some(string_arg(node)?),
        "error-text" => config.error_text = Some(string_arg(node)?),
        "class-name" => config.class_name = Some(string_arg(node)?),
        "chip-style" => config.chip_style = string_arg(node)?,
        "history-depth" => config.history_depth = int_arg(node)?,
        "placeholder-shortcut" => config.placeholder_shortcut = string_arg(node)?,
        "mac-keys" => config.mac_keys = bool_arg(node)?,
        other => tracing::warn!(key = other, "unknown editor setting ignored"),
    }
    Ok(())
}

fn placeholder_entry(node: &KdlNode) -> Result<PlaceholderEntry, SettingsError> {
    let mut positional = node
        .entries()
        .iter()
        .filter(|entry| entry.name().is_none())
        .filter_map(|entry| entry.value().as_string());
    let (Some(label), Some(value)) = (positional.next(), positional.next()) else {
        return Err(SettingsError::IncompletePlaceholder);
    };
    let mut entry = PlaceholderEntry::new(label, value);
    let description = node
        .entries()
        .iter()
        .find(|entry| entry.name().is_some_and(|name| name.value() == "description"))
        .and_then(|entry| entry.value().as_string());
    if let Some(description) = description {
        entry = entry.with_description(description);
    }
    Ok(entry)
}

fn first_value(node: &KdlNode) -> Option<&KdlValue> {
    node.entries().first().map(|entry| entry.value())
}

fn bad_value(node: &KdlNode, expected: &'static str) -> SettingsError {
    SettingsError::BadValue {
        node: node.name().value().to_string(),
        expected,
    }
}

fn string_arg(node: &KdlNode) -> Result<String, SettingsError> {
    first_value(node)
        .and_then(KdlValue::as_string)
        .map(str::to_string)
        .ok_or_else(|| bad_value(node, "string"))
}

/// A non-negative integer that fits the setting's type.
fn int_arg<T: TryFrom<i64>>(node: &KdlNode) -> Result<T, SettingsError> {
    first_value(node)
        .and_then(KdlValue::as_i64)
        .and_then(|value| T::try_from(value).ok())
        .ok_or_else(|| bad_value(node, "non-negative integer"))
}

fn bool_arg(node: &KdlNode) -> Result<bool, SettingsError> {
    first_value(node)
        .and_then(KdlValue::as_bool)
        .ok_or_else(|| bad_value(node, "boolean"))
}
