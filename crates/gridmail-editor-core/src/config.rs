//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::actions::{KeyCombo, KeybindingConfig};
use crate::error::ConfigError;
use crate::placeholder::{DEFAULT_CHIP_STYLE, PlaceholderEntry, is_token};
use crate::sanitize::InlineStyles;
use crate::undo::DEFAULT_MAX_STEPS;

pub const DEFAULT_PLACEHOLDER_SHORTCUT: &str = "Mod+Space";

/// Settings for one editor instance. Every field has a default, so a partial
/// config file deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Hint shown while the surface is empty.
    pub empty_text: String,
    /// Minimum surface height in CSS pixels.
    pub min_height: u32,
    pub label: Option<String>,
    pub helper_text: Option<String>,
    pub error_text: Option<String>,
    pub class_name: Option<String>,

    pub chip_style: String,
    pub inline_styles: InlineStyles,
    pub history_depth: usize,
    pub placeholder_shortcut: String,
    /// Use Cmd rather than Ctrl as the primary modifier.
    pub mac_keys: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            empty_text: "Start typing...".to_string(),
            min_height: 200,
            label: None,
            helper_text: None,
            error_text: None,
            class_name: None,
            chip_style: DEFAULT_CHIP_STYLE.to_string(),
            inline_styles: InlineStyles::default(),
            history_depth: DEFAULT_MAX_STEPS,
            placeholder_shortcut: DEFAULT_PLACEHOLDER_SHORTCUT.to_string(),
            mac_keys: false,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_depth == 0 {
            return Err(ConfigError::InvalidHistoryDepth);
        }
        KeyCombo::parse(&self.placeholder_shortcut, self.mac_keys)?;
        Ok(())
    }

    /// Default keybindings with the configured picker shortcut.
    pub fn keybindings(&self) -> Result<KeybindingConfig, ConfigError> {
        let mut bindings = KeybindingConfig::default_for_platform(self.mac_keys);
        bindings.set_placeholder_shortcut(&self.placeholder_shortcut, self.mac_keys)?;
        Ok(bindings)
    }
}

/// Every catalog value must name a well-formed token, written either as
/// `[[NAME]]` or as a bare `NAME`.
pub fn validate_catalog(catalog: &[PlaceholderEntry]) -> Result<(), ConfigError> {
    match catalog.iter().find(|entry| !is_token(&entry.token())) {
        Some(entry) => Err(ConfigError::InvalidPlaceholder {
            value: entry.value.clone(),
        }),
        None => Ok(()),
    }
}
