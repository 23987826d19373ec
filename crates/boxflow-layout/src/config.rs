//! Engine configuration.
//!
//! All fields have defaults, so a config file only lists what it changes:
//!
//! ```json
//! { "scrollbar_width": 12, "max_child_restarts": 4 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::style::DEFAULT_FONT_SIZE_PX;

/// Tunables for [`crate::LayoutEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Width taken from a block's content box by a vertical scrollbar.
    pub scrollbar_width: f32,
    /// How many times one block may restart its child loop before the
    /// engine gives up restarting and keeps the current pass.
    pub max_child_restarts: usize,
    /// Font size used by the synthetic root context.
    pub default_font_size: f32,
    /// `line-height: normal` as a multiple of the font size.
    pub line_height_ratio: f32,
    /// Horizontal and vertical gap between table cells.
    pub table_border_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            scrollbar_width: 16.0,
            max_child_restarts: 8,
            default_font_size: DEFAULT_FONT_SIZE_PX,
            line_height_ratio: 1.2,
            table_border_spacing: 2.0,
        }
    }
}

impl LayoutConfig {
    /// Parse a config from JSON text.
    ///
    /// # Errors
    /// Invalid JSON or negative sizes.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    ///
    /// # Errors
    /// The file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!(target: "boxflow::config", "loaded {}: {config:?}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("scrollbar_width", self.scrollbar_width),
            ("default_font_size", self.default_font_size),
            ("line_height_ratio", self.line_height_ratio),
            ("table_border_spacing", self.table_border_spacing),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }
}
