//! Flattening a region of the canvas into a single raster for generation requests.

use std::io::Cursor;

use egui::{Pos2, Rect};
use image::{ImageFormat, RgbaImage};
use tiny_skia::{Color, Pixmap, Transform};

use crate::aspect::AspectRatio;
use crate::config::EditorConfig;
use crate::document::paint_rank;
use crate::error::{EditorError, EditorResult};
use crate::geometry::hit_testing::{bounding_rect, quad_intersects_rect};
use crate::layer::{Layer, LayerId};
use crate::paint::rgba_from_pixmap;
use crate::renderer::draw_layer;
use crate::selection::Selection;

/// A flattened canvas region
#[derive(Debug, Clone)]
pub struct ExportedRegion {
    pub image: RgbaImage,
    /// World rectangle the image covers
    pub rect: Rect,
    /// Output pixels per world unit, below 1 when the region was scaled down
    pub scale: f32,
    /// Layers composited into the image, in paint order
    pub layers: Vec<LayerId>,
}

impl ExportedRegion {
    pub fn encode_png(&self) -> EditorResult<Vec<u8>> {
        encode_png(&self.image)
    }
}

/// Payload handed to the generate callback
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub image_png: Vec<u8>,
    pub instruction: String,
    pub aspect_ratio: AspectRatio,
    pub width: u32,
    pub height: u32,
}

impl GenerationRequest {
    pub fn new(
        region: &ExportedRegion,
        instruction: &str,
        annotations: &[String],
        aspect_ratio: AspectRatio,
    ) -> EditorResult<Self> {
        Ok(Self {
            image_png: region.encode_png()?,
            instruction: compose_instruction(instruction, annotations),
            aspect_ratio,
            width: region.image.width(),
            height: region.image.height(),
        })
    }
}

/// Append text annotations placed on the canvas to the user's instruction
pub fn compose_instruction(instruction: &str, annotations: &[String]) -> String {
    let instruction = instruction.trim();
    if annotations.is_empty() {
        return instruction.to_owned();
    }
    let notes = format!("Text annotations: {}", annotations.join("; "));
    if instruction.is_empty() {
        notes
    } else {
        format!("{instruction} {notes}")
    }
}

pub fn encode_png(image: &RgbaImage) -> EditorResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(EditorError::ImageEncode)?;
    Ok(bytes)
}

/// Flatten the selected part of the canvas onto white.
///
/// With two or more layers selected the export covers those layers plus every
/// visible drawing layer with paint inside the export rectangle. Otherwise it
/// covers every visible layer, limited to layers touching the last marquee box
/// when that box is used. The rectangle is the last marquee box if every
/// selected layer still touches it, else the padded bounds of the exported
/// layers.
pub fn export_region(
    layers: &[Layer],
    selection: &Selection,
    config: &EditorConfig,
) -> EditorResult<ExportedRegion> {
    let exportable: Vec<&Layer> = layers
        .iter()
        .filter(|layer| layer.visible && !layer.is_background())
        .collect();

    let selected: Vec<&Layer> = exportable
        .iter()
        .copied()
        .filter(|layer| selection.contains(layer.id))
        .collect();

    let quad_bounds = |targets: &[&Layer]| -> Option<Rect> {
        let points: Vec<Pos2> = targets.iter().filter_map(|layer| layer.hit_quad()).flatten().collect();
        if points.is_empty() {
            None
        } else {
            Some(bounding_rect(points).expand(config.export_padding))
        }
    };

    let marquee = selection.final_box().filter(|rect| {
        rect.is_positive()
            && !selected.is_empty()
            && selected
                .iter()
                .all(|layer| layer.hit_quad().is_some_and(|quad| quad_intersects_rect(&quad, *rect)))
    });

    let (mut targets, rect) = if selected.len() >= 2 {
        let rect = marquee.or_else(|| quad_bounds(&selected)).ok_or(EditorError::NothingToExport)?;
        let targets: Vec<&Layer> = exportable
            .iter()
            .copied()
            .filter(|layer| {
                selection.contains(layer.id)
                    || layer.is_drawing() && layer.hit_quad().is_some_and(|quad| quad_intersects_rect(&quad, rect))
            })
            .collect();
        (targets, rect)
    } else {
        let painted = exportable.iter().copied().filter(|layer| layer.hit_region().is_some());
        match marquee {
            // Layers lying entirely outside the box contribute nothing
            Some(rect) => {
                let targets: Vec<&Layer> = painted
                    .filter(|layer| layer.hit_quad().is_some_and(|quad| quad_intersects_rect(&quad, rect)))
                    .collect();
                (targets, rect)
            }
            None => {
                let targets: Vec<&Layer> = painted.collect();
                let rect = quad_bounds(&targets).ok_or(EditorError::NothingToExport)?;
                (targets, rect)
            }
        }
    };

    if targets.is_empty() {
        return Err(EditorError::NothingToExport);
    }
    let rect = Rect::from_min_max(rect.min.floor(), rect.max.ceil());
    if rect.width() < 1.0 || rect.height() < 1.0 {
        return Err(EditorError::DegenerateRegion);
    }

    let longest = rect.width().max(rect.height());
    let max_dimension = config.max_export_dimension.max(1) as f32;
    let scale = if longest > max_dimension {
        max_dimension / longest
    } else {
        1.0
    };
    let width = (rect.width() * scale).round().max(1.0) as u32;
    let height = (rect.height() * scale).round().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height).ok_or(EditorError::Raster { width, height })?;
    pixmap.fill(Color::WHITE);

    let world_to_image = Transform::from_scale(scale, scale).pre_translate(-rect.min.x, -rect.min.y);
    targets.sort_by_key(|layer| paint_rank(layer));
    for layer in &targets {
        draw_layer(&mut pixmap, layer, world_to_image);
    }

    log::info!(
        "Exported {} layers from {:?} as {}x{} (scale {:.3})",
        targets.len(),
        rect,
        width,
        height,
        scale
    );

    Ok(ExportedRegion {
        image: rgba_from_pixmap(&pixmap),
        rect,
        scale,
        layers: targets.iter().map(|layer| layer.id).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotations_follow_instruction() {
        let notes = vec!["make it red".to_owned(), "add a hat".to_owned()];
        assert_eq!(
            compose_instruction("fix lighting", &notes),
            "fix lighting Text annotations: make it red; add a hat"
        );
        assert_eq!(compose_instruction("  ", &notes), "Text annotations: make it red; add a hat");
        assert_eq!(compose_instruction("fix lighting ", &[]), "fix lighting");
    }

    #[test]
    fn png_encoding_has_signature() {
        let png = encode_png(&RgbaImage::new(4, 3)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
