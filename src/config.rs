use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV_VAR: &str = "INSTPLOT_CONFIG";

/// Tunables for the editing session. Every field has a default, so a
/// settings file only needs the keys it wants to override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of undo snapshots kept.
    pub history_capacity: usize,
    /// Pointer travel (pixels) before a left-press becomes a rectangle selection.
    pub drag_threshold_px: f32,
    /// Maximum pixel distance for a click to pick a data point.
    pub hit_tolerance_px: f32,
    /// Width multiplier per scroll notch.
    pub zoom_step: f64,
    /// Number of largest values averaged by normalization.
    pub normalize_top_n: usize,
    /// Fractional padding added on each side when autoscaling.
    pub autoscale_padding: f64,
    pub dark_theme: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            drag_threshold_px: 6.0,
            hit_tolerance_px: 10.0,
            zoom_step: 1.1,
            normalize_top_n: 20,
            autoscale_padding: 0.05,
            dark_theme: false,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], falling back to the
    /// defaults when the variable is unset or the file is unusable.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        let path = Path::new(&path);
        match Self::load(path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("Ignoring settings file {:?}: {e}", path);
                Self::default()
            }
        }
    }
}
