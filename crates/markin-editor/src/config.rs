//! Annotator configuration.
//!
//! Every recognised option with its default. Options load from JSON or TOML
//! files and are validated before use.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use markin_core::constants::DEFAULT_HISTORY_CAPACITY;
use markin_core::{ConfigError, Error, Result};

/// Role name -> roles removed along with it.
pub type DeletionRules = BTreeMap<String, Vec<String>>;

/// Default cascade: a bbox takes its keypoints, polygon and group with it,
/// keypoints take nothing, a polygon takes its bbox.
pub fn default_deletion_rules() -> DeletionRules {
    let mut rules = DeletionRules::new();
    rules.insert(
        "bbox".to_string(),
        vec![
            "keypoint".to_string(),
            "polygon".to_string(),
            "group".to_string(),
        ],
    );
    rules.insert("keypoint".to_string(), Vec::new());
    rules.insert("polygon".to_string(), vec!["bbox".to_string()]);
    rules
}

/// Parses a serialized deletion rule map.
pub fn parse_deletion_rules(raw: &str) -> Result<DeletionRules> {
    serde_json::from_str(raw).map_err(|e| {
        ConfigError::InvalidDeletionRules {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Options recognised by the annotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorOptions {
    /// Initial zoom; stroke widths and radii are drawn at `base / zoom`.
    pub zoom: f64,
    pub history_enabled: bool,
    pub history_max_states: usize,
    pub keyboard_controls: bool,
    /// Always create a bbox, even without an explicit box.
    pub require_bbox: bool,
    /// First press selects, second press drags.
    pub require_selection_to_drag: bool,
    pub bbox_contain_polygon: bool,
    pub bbox_contain_keypoints: bool,
    /// Accepted for compatibility; the bbox is never grown automatically.
    pub auto_resize_bbox: bool,
    /// Bind polygon and keypoints to the bbox at creation.
    pub bind_elements: bool,
    pub deletion_rules: DeletionRules,
}

impl Default for AnnotatorOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            history_enabled: true,
            history_max_states: DEFAULT_HISTORY_CAPACITY,
            keyboard_controls: true,
            require_bbox: false,
            require_selection_to_drag: true,
            bbox_contain_polygon: true,
            bbox_contain_keypoints: true,
            auto_resize_bbox: true,
            bind_elements: true,
            deletion_rules: default_deletion_rules(),
        }
    }
}

impl AnnotatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let options: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| ConfigError::InvalidOptions {
                reason: format!("Invalid TOML options: {}", e),
            })?
        } else {
            return Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        };

        options.validate()?;
        tracing::info!("Loaded annotator options from {}", path.display());
        Ok(options)
    }

    /// Save options to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self).map_err(|e| Error::other(format!("Failed to serialize options: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate options
    pub fn validate(&self) -> Result<()> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(ConfigError::InvalidZoom { zoom: self.zoom }.into());
        }

        if self.history_max_states == 0 {
            return Err(ConfigError::InvalidHistoryCapacity {
                max_states: self.history_max_states,
            }
            .into());
        }

        if let Some(role) = self.deletion_rules.keys().find(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidDeletionRules {
                reason: format!("empty role name {:?}", role),
            }
            .into());
        }

        Ok(())
    }
}
