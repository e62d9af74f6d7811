//! Vector marks (strokes, rectangles, arrows, text) and how they are rasterized,
//! both onto drawing surfaces and as live previews.

use egui::{Color32, Pos2, Rect, Vec2};
use image::RgbaImage;
use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Stroke, Transform,
};

use crate::geometry::transform::rotate_vec;
use crate::layer::Layer;
use crate::text;

/// Angle between an arrow's shaft and each stroke of its head
pub const ARROW_HEAD_ANGLE: f32 = 30.0;

/// A committed or in-progress drawing operation, in the coordinates of
/// whatever space it is painted into (layer-local for commits).
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Freehand(Vec<Pos2>),
    Rect { from: Pos2, to: Pos2 },
    Arrow { from: Pos2, to: Pos2 },
    Text { position: Pos2, text: String, size: f32 },
}

/// How a mark is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color32,
    pub width: f32,
    /// Remove paint instead of adding it
    pub erase: bool,
}

impl Brush {
    pub fn new(color: Color32, width: f32) -> Self {
        Self {
            color,
            width,
            erase: false,
        }
    }

    pub fn eraser(width: f32) -> Self {
        Self {
            color: Color32::BLACK,
            width,
            erase: true,
        }
    }
}

impl Mark {
    /// Conservative bounds of everything the mark paints
    pub fn bounds(&self, brush: &Brush) -> Rect {
        let points: Vec<Pos2> = match self {
            Mark::Freehand(points) => points.clone(),
            Mark::Rect { from, to } => vec![*from, *to],
            Mark::Arrow { from, to } => {
                let [shaft, left, right] = arrow_segments(*from, *to, arrow_head_length(brush.width, *from, *to));
                vec![shaft.0, shaft.1, left.1, right.1]
            }
            Mark::Text { position, text, size } => {
                return Rect::from_min_size(*position, text::measure(text, *size)).expand(2.0);
            }
        };
        let rect = points
            .into_iter()
            .fold(Rect::NOTHING, |rect, p| rect.union(Rect::from_min_max(p, p)));
        rect.expand(brush.width / 2.0 + 2.0)
    }

    fn path(&self, brush: &Brush) -> Option<Path> {
        match self {
            Mark::Freehand(points) => polyline_path(points),
            Mark::Rect { from, to } => {
                let rect = Rect::from_two_pos(*from, *to);
                let rect = tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y)?;
                Some(PathBuilder::from_rect(rect))
            }
            Mark::Arrow { from, to } => {
                let mut builder = PathBuilder::new();
                for (a, b) in arrow_segments(*from, *to, arrow_head_length(brush.width, *from, *to)) {
                    builder.move_to(a.x, a.y);
                    builder.line_to(b.x, b.y);
                }
                builder.finish()
            }
            Mark::Text { .. } => None,
        }
    }

    /// Paint the mark into `pixmap`, mapping mark coordinates through `transform`
    pub fn paint(&self, pixmap: &mut Pixmap, brush: &Brush, transform: Transform) {
        if let Mark::Text { position, text, size } = self {
            if let Some(glyphs) = text::rasterize(text, *size, brush.color) {
                pixmap.draw_pixmap(
                    0,
                    0,
                    glyphs.as_ref(),
                    &PixmapPaint::default(),
                    transform.pre_translate(position.x, position.y),
                    None,
                );
            }
            return;
        }

        let mut paint = Paint::default();
        paint.set_color(to_sk_color(brush.color));
        paint.anti_alias = true;
        if brush.erase {
            paint.blend_mode = BlendMode::DestinationOut;
        }

        // A click without movement leaves a round dot
        if let Mark::Freehand(points) = self {
            if let [point] = points.as_slice() {
                if let Some(dot) = PathBuilder::from_circle(point.x, point.y, brush.width / 2.0) {
                    pixmap.fill_path(&dot, &paint, FillRule::Winding, transform, None);
                }
                return;
            }
        }

        if let Some(path) = self.path(brush) {
            pixmap.stroke_path(&path, &paint, &stroke_style(brush.width), transform, None);
        }
    }
}

/// Paint `mark`, given in the layer's local space, onto the layer's drawing surface.
///
/// Returns `false` if the layer is not a drawing layer.
pub fn paint_on_layer(layer: &Layer, mark: &Mark, brush: &Brush) -> bool {
    let Some(surface) = layer.content.surface() else {
        return false;
    };
    let mut surface = surface.write();

    let extent = surface.extent() as f32;
    let scale = Vec2::new(extent / layer.transform.size.x, extent / layer.transform.size.y);
    let local_bounds = mark.bounds(brush);
    let area = Rect::from_min_max(
        Pos2::new(local_bounds.min.x * scale.x, local_bounds.min.y * scale.y),
        Pos2::new(local_bounds.max.x * scale.x, local_bounds.max.y * scale.y),
    );

    let draw = |tile: &mut Pixmap, tile_transform: Transform| {
        mark.paint(tile, brush, tile_transform.pre_scale(scale.x, scale.y));
    };
    if brush.erase {
        surface.erase(area, draw);
    } else {
        surface.draw(area, draw);
    }
    true
}

/// Shaft and the two head strokes of an arrow from `from` to `to`
pub fn arrow_segments(from: Pos2, to: Pos2, head_length: f32) -> [(Pos2, Pos2); 3] {
    let direction = (from - to).normalized() * head_length;
    [
        (from, to),
        (to, to + rotate_vec(direction, ARROW_HEAD_ANGLE)),
        (to, to + rotate_vec(direction, -ARROW_HEAD_ANGLE)),
    ]
}

fn arrow_head_length(width: f32, from: Pos2, to: Pos2) -> f32 {
    (width * 4.0).max(12.0).min(from.distance(to) * 0.5)
}

fn polyline_path(points: &[Pos2]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.finish()
}

pub fn stroke_style(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

pub fn to_sk_color(color: Color32) -> Color {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color::from_rgba8(r, g, b, a)
}

/// Convert straight-alpha RGBA into a premultiplied pixmap
pub fn pixmap_from_rgba(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        if let Some(pixel) = PremultipliedColorU8::from_rgba(premultiply(r), premultiply(g), premultiply(b), a) {
            *dst = pixel;
        }
    }
    Some(pixmap)
}

/// Convert a premultiplied pixmap back into straight-alpha RGBA
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_head_strokes_are_symmetric() {
        let [shaft, left, right] = arrow_segments(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0), 20.0);
        assert_eq!(shaft, (Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0)));
        assert!((left.1.x - right.1.x).abs() < 1e-3);
        assert!((left.1.y + right.1.y).abs() < 1e-3);
        assert!((left.1.distance(Pos2::new(100.0, 0.0)) - 20.0).abs() < 1e-3);
        assert!((left.1.x - (100.0 - 20.0 * 30f32.to_radians().cos())).abs() < 1e-3);
    }

    #[test]
    fn single_point_freehand_paints_a_dot() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        let mark = Mark::Freehand(vec![Pos2::new(10.0, 10.0)]);
        mark.paint(&mut pixmap, &Brush::new(Color32::BLACK, 6.0), Transform::identity());

        assert_eq!(pixmap.pixel(10, 10).map(|p| p.alpha()), Some(255));
        assert_eq!(pixmap.pixel(2, 2).map(|p| p.alpha()), Some(0));
    }

    #[test]
    fn eraser_clears_paint() {
        let mut pixmap = Pixmap::new(20, 20).unwrap();
        pixmap.fill(Color::BLACK);
        let mark = Mark::Freehand(vec![Pos2::new(0.0, 10.0), Pos2::new(20.0, 10.0)]);
        mark.paint(&mut pixmap, &Brush::eraser(6.0), Transform::identity());

        assert_eq!(pixmap.pixel(10, 10).map(|p| p.alpha()), Some(0));
        assert_eq!(pixmap.pixel(10, 1).map(|p| p.alpha()), Some(255));
    }

    #[test]
    fn premultiplication_round_trips_opaque_pixels() {
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([200, 100, 50, 255]));
        let pixmap = pixmap_from_rgba(&image).unwrap();
        assert_eq!(rgba_from_pixmap(&pixmap), image);
    }
}
