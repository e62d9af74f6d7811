use std::fmt;
use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::geometry::hit_testing::{contains_point, rect_corners};
use crate::geometry::transform::{local_to_world, rotate_vec};
use crate::surface::{Surface, SurfaceRef};

/// Unique identifier of a layer.
///
/// The background artboard has a fixed id so it can be recognised (and
/// protected) without looking at its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerId {
    Background,
    Layer(Uuid),
}

impl LayerId {
    pub fn new() -> Self {
        LayerId::Layer(Uuid::new_v4())
    }

    pub fn is_background(&self) -> bool {
        matches!(self, LayerId::Background)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Background => f.write_str("background"),
            LayerId::Layer(uuid) => write!(f, "{}", uuid),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Image,
    Drawing,
}

/// Pixel content of a layer
#[derive(Clone)]
pub enum LayerContent {
    /// Decoded bitmap, never modified after load
    Image(Arc<Pixmap>),
    /// Paintable surface shared between successive records of the same layer
    Drawing(SurfaceRef),
}

impl LayerContent {
    pub fn drawing(extent: u32, tile_size: u32) -> Self {
        LayerContent::Drawing(Surface::new(extent, tile_size).into_shared())
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            LayerContent::Image(_) => LayerKind::Image,
            LayerContent::Drawing(_) => LayerKind::Drawing,
        }
    }

    pub fn surface(&self) -> Option<&SurfaceRef> {
        match self {
            LayerContent::Drawing(surface) => Some(surface),
            LayerContent::Image(_) => None,
        }
    }
}

impl PartialEq for LayerContent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LayerContent::Image(a), LayerContent::Image(b)) => Arc::ptr_eq(a, b),
            (LayerContent::Drawing(a), LayerContent::Drawing(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for LayerContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerContent::Image(pixmap) => f
                .debug_struct("Image")
                .field("width", &pixmap.width())
                .field("height", &pixmap.height())
                .finish(),
            LayerContent::Drawing(surface) => f.debug_tuple("Drawing").field(&*surface.read()).finish(),
        }
    }
}

/// Placement of a layer in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Top-left corner before rotation
    pub position: Pos2,
    /// Width and height in world units
    pub size: Vec2,
    /// Rotation in degrees about the center, clockwise on screen
    pub rotation: f32,
}

impl Transform {
    pub fn new(position: Pos2, size: Vec2) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
        }
    }

    /// An unrotated transform of `size` centered on `center`
    pub fn centered(center: Pos2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    pub fn center(&self) -> Pos2 {
        self.position + self.size / 2.0
    }

    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            position: self.position + delta,
            ..*self
        }
    }

    /// World placement of `part`, a rectangle in normalized layer coordinates
    /// where (0, 0) is the top-left corner and (1, 1) the bottom-right.
    pub fn sub_frame(&self, part: Rect) -> Transform {
        let size = Vec2::new(part.width() * self.size.x, part.height() * self.size.y);
        let min = Pos2::new(part.min.x * self.size.x, part.min.y * self.size.y);
        let center = local_to_world(min + size / 2.0, self);
        Transform {
            position: center - size / 2.0,
            size,
            rotation: self.rotation,
        }
    }

    /// The layer placement whose `part` lands exactly on `frame`.
    ///
    /// Inverse of [`Transform::sub_frame`]. A degenerate `part` returns `frame`.
    pub fn from_sub_frame(frame: &Transform, part: Rect) -> Transform {
        if part.width() <= 0.0 || part.height() <= 0.0 {
            return *frame;
        }
        let size = Vec2::new(frame.size.x / part.width(), frame.size.y / part.height());
        let min = Vec2::new(part.min.x * size.x, part.min.y * size.y);
        let offset = min + frame.size / 2.0 - size / 2.0;
        let center = frame.center() - rotate_vec(offset, frame.rotation);
        Transform {
            position: center - size / 2.0,
            size,
            rotation: frame.rotation,
        }
    }

    /// Raster transform mapping layer-local coordinates to world coordinates
    pub fn to_world_transform(&self) -> tiny_skia::Transform {
        let center = self.center();
        tiny_skia::Transform::from_translate(center.x, center.y)
            .pre_concat(tiny_skia::Transform::from_rotate(self.rotation))
            .pre_translate(-self.size.x / 2.0, -self.size.y / 2.0)
    }
}

/// One record in the layer document.
///
/// Records are immutable once published; edits produce a new record with the
/// same id.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub content: LayerContent,
    pub transform: Transform,
    /// Bumped whenever the drawing surface behind this record was painted
    pub revision: u64,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, content: LayerContent, transform: Transform) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            content,
            transform,
            revision: 0,
        }
    }

    pub fn kind(&self) -> LayerKind {
        self.content.kind()
    }

    pub fn is_background(&self) -> bool {
        self.id.is_background()
    }

    pub fn is_drawing(&self) -> bool {
        self.kind() == LayerKind::Drawing
    }

    /// The part of the layer that counts for hit-testing, in normalized layer
    /// coordinates.
    ///
    /// Images use their full frame. Drawing layers use the bounds of their
    /// painted pixels and have no region while empty. Resizing a layer does not
    /// change its normalized region.
    pub fn normalized_region(&self) -> Option<Rect> {
        match &self.content {
            LayerContent::Image(_) => Some(Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0))),
            LayerContent::Drawing(surface) => {
                let surface = surface.read();
                let ink = surface.ink_bounds()?;
                let extent = surface.extent() as f32;
                Some(Rect::from_min_max(
                    (ink.min.to_vec2() / extent).to_pos2(),
                    (ink.max.to_vec2() / extent).to_pos2(),
                ))
            }
        }
    }

    /// [`Layer::normalized_region`] in layer-local space
    pub fn hit_region(&self) -> Option<Rect> {
        let part = self.normalized_region()?;
        let size = self.transform.size;
        Some(Rect::from_min_max(
            Pos2::new(part.min.x * size.x, part.min.y * size.y),
            Pos2::new(part.max.x * size.x, part.max.y * size.y),
        ))
    }

    /// The box that outlines the layer and carries its handles, in world space
    pub fn frame(&self) -> Option<Transform> {
        self.normalized_region()
            .map(|part| self.transform.sub_frame(part))
    }

    /// World-space corners of [`Layer::hit_region`]
    pub fn hit_quad(&self) -> Option<[Pos2; 4]> {
        self.hit_region()
            .map(|region| rect_corners(&self.transform, region))
    }

    pub fn contains_point(&self, point: Pos2) -> bool {
        self.hit_region()
            .is_some_and(|region| contains_point(&self.transform, region, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::handles::corners;

    #[test]
    fn background_id_displays_as_background() {
        assert_eq!(LayerId::Background.to_string(), "background");
        assert!(!LayerId::new().is_background());
        assert_ne!(LayerId::new(), LayerId::new());
    }

    #[test]
    fn empty_drawing_layer_has_no_hit_region() {
        let layer = Layer::new(
            LayerId::new(),
            "Drawing",
            LayerContent::drawing(1000, 100),
            Transform::centered(Pos2::ZERO, Vec2::splat(1000.0)),
        );
        assert_eq!(layer.hit_region(), None);
        assert!(!layer.contains_point(Pos2::ZERO));
    }

    #[test]
    fn image_hit_quad_matches_corners() {
        let mut transform = Transform::new(Pos2::new(5.0, 5.0), Vec2::new(40.0, 20.0));
        transform.rotation = 30.0;
        let pixmap = Arc::new(Pixmap::new(4, 2).unwrap());
        let layer = Layer::new(LayerId::new(), "Image", LayerContent::Image(pixmap), transform);

        let quad = layer.hit_quad().unwrap();
        for (a, b) in quad.iter().zip(corners(&transform)) {
            assert!((*a - b).length() < 1e-3);
        }
        assert!(layer.contains_point(transform.center()));
    }

    #[test]
    fn sub_frame_maps_back_to_layer() {
        let transform = Transform {
            position: Pos2::new(-30.0, 12.0),
            size: Vec2::new(400.0, 250.0),
            rotation: 35.0,
        };
        let part = Rect::from_min_max(Pos2::new(0.25, 0.1), Pos2::new(0.5, 0.9));
        let frame = transform.sub_frame(part);
        assert!((frame.size - Vec2::new(100.0, 200.0)).length() < 1e-3);

        let corner = local_to_world(Pos2::new(100.0, 25.0), &transform);
        assert!((corners(&frame)[0] - corner).length() < 1e-3);

        let back = Transform::from_sub_frame(&frame, part);
        assert!((back.position - transform.position).length() < 1e-3);
        assert!((back.size - transform.size).length() < 1e-3);
    }

    #[test]
    fn image_frame_is_its_transform() {
        let transform = Transform::new(Pos2::new(5.0, 5.0), Vec2::new(40.0, 20.0));
        let pixmap = Arc::new(Pixmap::new(4, 2).unwrap());
        let layer = Layer::new(LayerId::new(), "Image", LayerContent::Image(pixmap), transform);
        assert_eq!(layer.frame(), Some(transform));
    }
}
