use std::fs;
use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an optional JSON config file for the host binary
pub const CONFIG_ENV_VAR: &str = "STUDIO_CANVAS_CONFIG";

/// Tunable constants of the editor core.
///
/// Every field has a default, so a config file only needs to list the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Side length of a transform handle in screen pixels
    pub handle_size: f32,
    /// Distance of the rotation handle above the top edge, in screen pixels
    pub rotation_handle_offset: f32,
    /// Smallest width/height a resize may produce, in world units
    pub min_layer_size: f32,
    /// Added images are scaled down to fit this many world units
    pub max_display_dimension: f32,
    /// Logical extent of a drawing surface (square, world units at 1:1)
    pub drawing_surface_size: u32,
    /// Side length of one lazily allocated surface tile
    pub surface_tile_size: u32,
    /// Long side of the background artboard
    pub artboard_size: f32,
    /// Maximum number of layers in a multi-selection
    pub max_selection: usize,
    /// Margin added around the selected layers when no marquee box is reused
    pub export_padding: f32,
    /// Exported rasters larger than this on either side are scaled down
    pub max_export_dimension: u32,
    /// Arrows shorter than this are discarded
    pub min_arrow_length: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Multiplicative zoom applied per scroll notch
    pub zoom_step: f32,
    pub stroke_color: [u8; 4],
    pub stroke_width: f32,
    pub eraser_width: f32,
    pub text_size: f32,
    pub canvas_background: [u8; 4],
    pub selection_color: [u8; 4],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_size: 8.0,
            rotation_handle_offset: 30.0,
            min_layer_size: 10.0,
            max_display_dimension: 800.0,
            drawing_surface_size: 10_000,
            surface_tile_size: 256,
            artboard_size: 1024.0,
            max_selection: 3,
            export_padding: 20.0,
            max_export_dimension: 4096,
            min_arrow_length: 5.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
            zoom_step: 1.1,
            stroke_color: [230, 40, 40, 255],
            stroke_width: 4.0,
            eraser_width: 24.0,
            text_size: 28.0,
            canvas_background: [229, 229, 229, 255],
            selection_color: [30, 144, 255, 255],
        }
    }
}

impl EditorConfig {
    /// Load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse a config and check that its values are usable
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("handle_size", self.handle_size),
            ("min_layer_size", self.min_layer_size),
            ("max_display_dimension", self.max_display_dimension),
            ("artboard_size", self.artboard_size),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("stroke_width", self.stroke_width),
            ("eraser_width", self.eraser_width),
            ("text_size", self.text_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                });
            }
        }

        let non_negative = [
            ("rotation_handle_offset", self.rotation_handle_offset),
            ("export_padding", self.export_padding),
            ("min_arrow_length", self.min_arrow_length),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        let counts = [
            ("drawing_surface_size", self.drawing_surface_size as usize),
            ("surface_tile_size", self.surface_tile_size as usize),
            ("max_selection", self.max_selection),
            ("max_export_dimension", self.max_export_dimension as usize),
        ];
        if let Some((field, _)) = counts.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid {
                field,
                reason: "must be at least 1",
            });
        }

        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid {
                field: "min_zoom",
                reason: "must not exceed max_zoom",
            });
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::Invalid {
                field: "zoom_step",
                reason: "must be greater than 1",
            });
        }
        Ok(())
    }

    /// Load the config named by [`CONFIG_ENV_VAR`], falling back to defaults
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded editor config from {}", path);
                config
            }
            Err(err) => {
                log::warn!("Ignoring config {}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn stroke_color(&self) -> Color32 {
        rgba(self.stroke_color)
    }

    pub fn canvas_background(&self) -> Color32 {
        rgba(self.canvas_background)
    }

    pub fn selection_color(&self) -> Color32 {
        rgba(self.selection_color)
    }
}

fn rgba([r, g, b, a]: [u8; 4]) -> Color32 {
    Color32::from_rgba_unmultiplied(r, g, b, a)
}
