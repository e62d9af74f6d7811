use std::sync::Arc;

use egui::{Pos2, Vec2};
use image::DynamicImage;
use tiny_skia::{Color, Pixmap};

use crate::aspect::AspectRatio;
use crate::config::EditorConfig;
use crate::error::{CommandError, CommandResult, EditorError, EditorResult};
use crate::geometry::transform::Viewport;
use crate::layer::{Layer, LayerContent, LayerId, LayerKind, Transform};
use crate::paint::pixmap_from_rgba;

/// The ordered layer list.
///
/// Every mutation builds a complete new list and publishes it as a fresh
/// snapshot, so a reader holding an older [`Document::snapshot`] never sees a
/// half-applied edit.
#[derive(Debug, Clone)]
pub struct Document {
    layers: Arc<Vec<Layer>>,
    config: EditorConfig,
}

impl Document {
    /// A document holding only the white background artboard
    pub fn new(config: &EditorConfig, aspect_ratio: AspectRatio) -> Self {
        let mut document = Self {
            layers: Arc::new(Vec::new()),
            config: config.clone(),
        };
        match background_layer(config, aspect_ratio) {
            Some(background) => document.publish(vec![background]),
            None => log::warn!("Failed to allocate background artboard"),
        }
        document
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<Vec<Layer>> {
        Arc::clone(&self.layers)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    /// Topmost drawing layer in document order
    pub fn topmost_drawing(&self) -> Option<LayerId> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.is_drawing())
            .map(|layer| layer.id)
    }

    /// Layers in paint order: the background, then images, then drawings,
    /// keeping document order within each group
    pub fn resolved_order(&self) -> Vec<&Layer> {
        resolved_order(&self.layers)
    }

    /// Add a decoded bitmap, centered on the middle of the viewport and scaled
    /// down to fit `max_display_dimension`
    pub fn add_image_layer(&mut self, bitmap: Pixmap, name: impl Into<String>, viewport: &Viewport) -> LayerId {
        let natural = Vec2::new(bitmap.width() as f32, bitmap.height() as f32);
        let longest = natural.x.max(natural.y);
        let scale = if longest > self.config.max_display_dimension {
            self.config.max_display_dimension / longest
        } else {
            1.0
        };

        let transform = Transform::centered(viewport.world_center(), natural * scale);
        let layer = Layer::new(LayerId::new(), name, LayerContent::Image(Arc::new(bitmap)), transform);
        let id = layer.id;
        log::info!("Added image layer {} ({}x{}) at scale {:.3}", id, natural.x, natural.y, scale);
        self.push(layer);
        id
    }

    pub fn add_dynamic_image(
        &mut self,
        image: &DynamicImage,
        name: impl Into<String>,
        viewport: &Viewport,
    ) -> EditorResult<LayerId> {
        let rgba = image.to_rgba8();
        let bitmap = pixmap_from_rgba(&rgba).ok_or(EditorError::Raster {
            width: rgba.width(),
            height: rgba.height(),
        })?;
        Ok(self.add_image_layer(bitmap, name, viewport))
    }

    /// Decode an encoded image and add it as a new layer.
    ///
    /// A decode failure leaves the document untouched.
    pub fn add_image_from_bytes(
        &mut self,
        bytes: &[u8],
        name: impl Into<String>,
        viewport: &Viewport,
    ) -> EditorResult<LayerId> {
        let image = image::load_from_memory(bytes).map_err(EditorError::ImageDecode)?;
        self.add_dynamic_image(&image, name, viewport)
    }

    /// Add an empty drawing layer covering the configured surface extent around the world origin
    pub fn add_drawing_layer(&mut self) -> LayerId {
        let extent = self.config.drawing_surface_size;
        let content = LayerContent::drawing(extent, self.config.surface_tile_size);
        let transform = Transform::centered(Pos2::ZERO, Vec2::splat(extent as f32));
        let count = self.layers.iter().filter(|layer| layer.is_drawing()).count();
        let layer = Layer::new(LayerId::new(), format!("Drawing {}", count + 1), content, transform);
        let id = layer.id;
        log::info!("Added drawing layer {}", id);
        self.push(layer);
        id
    }

    /// Insert an existing record at `index`, clamped to the list. Used to restore removed layers.
    pub fn insert_layer(&mut self, index: usize, layer: Layer) {
        let mut layers = self.layers.to_vec();
        let index = index.clamp(1.min(layers.len()), layers.len());
        layers.insert(index, layer);
        self.publish(layers);
    }

    /// Remove a layer, returning its record and former index
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(Layer, usize), CommandError> {
        if id.is_background() {
            return Err(CommandError::BackgroundLocked);
        }
        let index = self.index_of(id).ok_or(CommandError::LayerNotFound(id))?;
        let mut layers = self.layers.to_vec();
        let removed = layers.remove(index);
        log::info!("Removed layer {} ({})", id, removed.name);
        self.publish(layers);
        Ok((removed, index))
    }

    /// Move `source` to the index currently held by `target`.
    ///
    /// Returns `false` without touching the document if the two are equal,
    /// either is the background or either is missing.
    pub fn reorder(&mut self, source: LayerId, target: LayerId) -> bool {
        if source == target || source.is_background() || target.is_background() {
            return false;
        }
        let Some(target_index) = self.index_of(target) else {
            return false;
        };
        self.move_to_index(source, target_index).is_ok()
    }

    /// Move a layer to `index`. Index 0 belongs to the background and is never taken.
    pub fn move_to_index(&mut self, id: LayerId, index: usize) -> CommandResult {
        if id.is_background() {
            return Err(CommandError::BackgroundLocked);
        }
        let from = self.index_of(id).ok_or(CommandError::LayerNotFound(id))?;
        let mut layers = self.layers.to_vec();
        let lowest = usize::from(layers.first().is_some_and(|layer| layer.is_background()));
        let to = index.clamp(lowest, layers.len() - 1);
        if from == to {
            return Ok(());
        }
        let layer = layers.remove(from);
        layers.insert(to, layer);
        log::debug!("Moved layer {} from {} to {}", id, from, to);
        self.publish(layers);
        Ok(())
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> CommandResult {
        self.update(id, |layer| layer.visible = visible)
    }

    pub fn set_transform(&mut self, id: LayerId, transform: Transform) -> CommandResult {
        if id.is_background() {
            return Err(CommandError::BackgroundLocked);
        }
        self.update(id, |layer| layer.transform = transform)
    }

    /// Re-wrap a layer after its drawing surface was painted.
    ///
    /// The new record shares the same surface; only the revision changes.
    pub fn touch(&mut self, id: LayerId) -> CommandResult {
        self.update(id, |layer| layer.revision += 1)
    }

    fn update(&mut self, id: LayerId, edit: impl FnOnce(&mut Layer)) -> CommandResult {
        let index = self.index_of(id).ok_or(CommandError::LayerNotFound(id))?;
        let mut layers = self.layers.to_vec();
        edit(&mut layers[index]);
        self.publish(layers);
        Ok(())
    }

    fn push(&mut self, layer: Layer) {
        let mut layers = self.layers.to_vec();
        layers.push(layer);
        self.publish(layers);
    }

    fn publish(&mut self, layers: Vec<Layer>) {
        self.layers = Arc::new(layers);
    }
}

/// Paint order of a layer list: the background, then images, then drawings
pub fn resolved_order(layers: &[Layer]) -> Vec<&Layer> {
    let mut ordered: Vec<&Layer> = layers.iter().collect();
    ordered.sort_by_key(|layer| paint_rank(layer));
    ordered
}

/// Sort key of a layer's paint group. Sorting by it must be stable to keep
/// document order within a group.
pub fn paint_rank(layer: &Layer) -> u8 {
    match (layer.is_background(), layer.kind()) {
        (true, _) => 0,
        (false, LayerKind::Image) => 1,
        (false, LayerKind::Drawing) => 2,
    }
}

fn background_layer(config: &EditorConfig, aspect_ratio: AspectRatio) -> Option<Layer> {
    let mut white = Pixmap::new(1, 1)?;
    white.fill(Color::WHITE);
    let size = aspect_ratio.frame_size(config.artboard_size);
    Some(Layer::new(
        LayerId::Background,
        "Background",
        LayerContent::Image(Arc::new(white)),
        Transform::centered(Pos2::ZERO, size),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        let config = EditorConfig {
            drawing_surface_size: 2048,
            ..EditorConfig::default()
        };
        Document::new(&config, AspectRatio::Square)
    }

    fn image(width: u32, height: u32) -> Pixmap {
        Pixmap::new(width, height).unwrap()
    }

    #[test]
    fn starts_with_background_only() {
        let doc = document();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.layers()[0].id, LayerId::Background);
        assert_eq!(doc.layers()[0].transform.size, Vec2::splat(1024.0));
    }

    #[test]
    fn large_images_are_scaled_to_fit() {
        let mut doc = document();
        let viewport = Viewport::new(Vec2::new(800.0, 600.0));
        let id = doc.add_image_layer(image(1600, 400), "Wide", &viewport);

        let layer = doc.get(id).unwrap();
        assert_eq!(layer.transform.size, Vec2::new(800.0, 200.0));
        assert_eq!(layer.transform.center(), viewport.world_center());
    }

    #[test]
    fn small_images_keep_their_size() {
        let mut doc = document();
        let id = doc.add_image_layer(image(120, 90), "Small", &Viewport::default());
        assert_eq!(doc.get(id).unwrap().transform.size, Vec2::new(120.0, 90.0));
    }

    #[test]
    fn background_cannot_be_removed_or_moved() {
        let mut doc = document();
        let id = doc.add_drawing_layer();

        assert_eq!(doc.remove_layer(LayerId::Background).unwrap_err(), CommandError::BackgroundLocked);
        assert!(!doc.reorder(id, LayerId::Background));
        doc.move_to_index(id, 0).unwrap();
        assert_eq!(doc.index_of(LayerId::Background), Some(0));
    }

    #[test]
    fn reorder_moves_source_to_target_index() {
        let mut doc = document();
        let a = doc.add_image_layer(image(10, 10), "A", &Viewport::default());
        let b = doc.add_image_layer(image(10, 10), "B", &Viewport::default());
        let c = doc.add_image_layer(image(10, 10), "C", &Viewport::default());

        assert!(doc.reorder(c, a));
        let order: Vec<LayerId> = doc.layers().iter().map(|layer| layer.id).collect();
        assert_eq!(order, vec![LayerId::Background, c, a, b]);
        assert!(!doc.reorder(b, b));
    }

    #[test]
    fn mutations_publish_new_snapshots() {
        let mut doc = document();
        let id = doc.add_drawing_layer();
        let before = doc.snapshot();

        doc.touch(id).unwrap();

        let after = doc.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before[1].revision, 0);
        assert_eq!(after[1].revision, 1);
        assert_eq!(before[1].content, after[1].content);
    }

    #[test]
    fn drawings_paint_after_images() {
        let mut doc = document();
        let drawing = doc.add_drawing_layer();
        let image_id = doc.add_image_layer(image(10, 10), "Image", &Viewport::default());

        let order: Vec<LayerId> = doc.resolved_order().iter().map(|layer| layer.id).collect();
        assert_eq!(order, vec![LayerId::Background, image_id, drawing]);
    }

    #[test]
    fn undecodable_bytes_add_nothing() {
        let mut doc = document();
        let result = doc.add_image_from_bytes(b"not an image", "Broken", &Viewport::default());
        assert!(matches!(result, Err(EditorError::ImageDecode(_))));
        assert_eq!(doc.len(), 1);
    }
}
