use egui::{Color32, Pos2, Rect};
use tiny_skia::{
    FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

use crate::document::resolved_order;
use crate::editor::Editor;
use crate::geometry::handles::{Handle, corners, handle_positions};
use crate::geometry::transform::world_to_local;
use crate::layer::{Layer, LayerContent, LayerId};
use crate::paint::{Brush, Mark, to_sk_color};
use crate::state::{InteractionState, ShapeKind};
use crate::tools::{ToolKind, freehand_brush};

const OUTLINE_WIDTH: f32 = 1.5;
const GUIDE_WIDTH: f32 = 1.0;
const MARQUEE_FILL_ALPHA: u8 = 40;
const ERASER_PREVIEW: Color32 = Color32::from_rgba_premultiplied(120, 120, 120, 120);
const CARET: char = '|';

/// Composites the document into a raster frame.
///
/// The frame buffer is kept between calls and only reallocated when the
/// canvas size changes.
#[derive(Debug, Default)]
pub struct Renderer {
    frame: Option<Pixmap>,
    frames_rendered: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Render one frame of the editor at its viewport size
    pub fn render(&mut self, editor: &Editor) -> Option<&Pixmap> {
        let viewport = editor.viewport();
        let width = viewport.size.x.ceil().max(1.0) as u32;
        let height = viewport.size.y.ceil().max(1.0) as u32;

        let frame = match self.frame.take() {
            Some(frame) if frame.width() == width && frame.height() == height => frame,
            _ => Pixmap::new(width, height)?,
        };
        let frame = self.frame.insert(frame);
        frame.fill(to_sk_color(editor.config().canvas_background()));

        let view = viewport.to_raster_transform();
        let snapshot = editor.document().snapshot();
        for layer in resolved_order(&snapshot) {
            if layer.visible {
                draw_layer(frame, layer, view);
            }
        }

        if editor.tool() == ToolKind::Select {
            draw_selection_overlay(frame, editor);
        }
        draw_preview(frame, editor);

        self.frames_rendered += 1;
        Some(&*frame)
    }
}

/// Draw a layer's pixels. `world_to_target` maps world space into the pixmap.
pub fn draw_layer(pixmap: &mut Pixmap, layer: &Layer, world_to_target: Transform) {
    let local_to_target = world_to_target.pre_concat(layer.transform.to_world_transform());
    let size = layer.transform.size;
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };

    match &layer.content {
        LayerContent::Image(bitmap) => {
            let bitmap: &Pixmap = bitmap;
            let transform = local_to_target.pre_scale(
                size.x / bitmap.width() as f32,
                size.y / bitmap.height() as f32,
            );
            pixmap.draw_pixmap(0, 0, bitmap.as_ref(), &paint, transform, None);
        }
        LayerContent::Drawing(surface) => {
            let surface = surface.read();
            let extent = surface.extent() as f32;
            let surface_to_target = local_to_target.pre_scale(size.x / extent, size.y / extent);
            for (origin, tile) in surface.tiles() {
                let transform = surface_to_target.pre_translate(origin.x, origin.y);
                pixmap.draw_pixmap(0, 0, tile.as_ref(), &paint, transform, None);
            }
        }
    }
}

fn draw_selection_overlay(frame: &mut Pixmap, editor: &Editor) {
    let viewport = editor.viewport();
    let config = editor.config();
    let color = config.selection_color();

    for id in editor.selection().ids() {
        let Some(layer) = editor.document().get(*id) else {
            continue;
        };
        if !layer.visible {
            continue;
        }
        // Drawing layers span the whole surface, so outline their ink instead
        let (quad, dashed) = if layer.is_drawing() {
            match layer.hit_quad() {
                Some(quad) => (quad, true),
                None => continue,
            }
        } else {
            (corners(&layer.transform), false)
        };
        stroke_polygon(frame, &quad.map(|p| viewport.world_to_screen(p)), color, OUTLINE_WIDTH, dashed);
    }

    if let InteractionState::Marqueeing { start, current } = editor.interaction() {
        let rect = Rect::from_two_pos(viewport.world_to_screen(*start), viewport.world_to_screen(*current));
        let points = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()];
        fill_polygon(frame, &points, color.gamma_multiply(MARQUEE_FILL_ALPHA as f32 / 255.0));
        stroke_polygon(frame, &points, color, GUIDE_WIDTH, true);
    }

    let Some(active) = editor.selection().active().and_then(|id| editor.document().get(id)) else {
        return;
    };
    if !active.visible {
        return;
    }

    let Some(box_frame) = active.frame() else {
        return;
    };
    let handles = handle_positions(&box_frame, viewport.zoom, config);
    let top = handles
        .iter()
        .find(|(handle, _)| *handle == Handle::Top)
        .map(|(_, pos)| *pos);
    let rotate = handles
        .iter()
        .find(|(handle, _)| *handle == Handle::Rotate)
        .map(|(_, pos)| *pos);
    if let (Some(top), Some(rotate)) = (top, rotate) {
        stroke_line(
            frame,
            viewport.world_to_screen(top),
            viewport.world_to_screen(rotate),
            color,
            GUIDE_WIDTH,
        );
    }

    let half = config.handle_size / 2.0;
    for (handle, pos) in handles {
        let center = viewport.world_to_screen(pos);
        let mut paint = solid(color);
        let path = match handle {
            Handle::Rotate => PathBuilder::from_circle(center.x, center.y, half),
            _ => tiny_skia::Rect::from_xywh(
                center.x - half,
                center.y - half,
                config.handle_size,
                config.handle_size,
            )
                .map(PathBuilder::from_rect),
        };
        let Some(path) = path else {
            continue;
        };
        paint.set_color(to_sk_color(Color32::WHITE));
        frame.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        paint.set_color(to_sk_color(color));
        let stroke = Stroke {
            width: OUTLINE_WIDTH,
            ..Stroke::default()
        };
        frame.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Live preview of paint that has not been committed yet
fn draw_preview(frame: &mut Pixmap, editor: &Editor) {
    let config = editor.config();
    let view = editor.viewport().to_raster_transform();
    let layer_view = |layer_id: LayerId| {
        let layer = editor.document().get(layer_id)?;
        Some((layer.transform, view.pre_concat(layer.transform.to_world_transform())))
    };

    match editor.interaction() {
        InteractionState::Painting { points, erase, .. } => {
            let mut brush = freehand_brush(config, *erase);
            if brush.erase {
                brush = Brush::new(ERASER_PREVIEW, brush.width);
            }
            Mark::Freehand(points.clone()).paint(frame, &brush, view);
        }
        InteractionState::Shaping {
            layer_id,
            kind,
            start,
            current,
        } => {
            let Some((transform, local_view)) = layer_view(*layer_id) else {
                return;
            };
            let (from, to) = (world_to_local(*start, &transform), world_to_local(*current, &transform));
            let mark = match kind {
                ShapeKind::Rect => Mark::Rect { from, to },
                ShapeKind::Arrow if start.distance(*current) < config.min_arrow_length => return,
                ShapeKind::Arrow => Mark::Arrow { from, to },
            };
            mark.paint(frame, &Brush::new(config.stroke_color(), config.stroke_width), local_view);
        }
        InteractionState::TextEntry {
            layer_id,
            position,
            buffer,
        } => {
            let Some((transform, local_view)) = layer_view(*layer_id) else {
                return;
            };
            let mark = Mark::Text {
                position: world_to_local(*position, &transform),
                text: format!("{buffer}{CARET}"),
                size: config.text_size,
            };
            mark.paint(frame, &Brush::new(config.stroke_color(), config.stroke_width), local_view);
        }
        _ => {}
    }
}

fn solid(color: Color32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn polygon_path(points: &[Pos2]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    builder.finish()
}

fn stroke_polygon(frame: &mut Pixmap, points: &[Pos2], color: Color32, width: f32, dashed: bool) {
    let Some(path) = polygon_path(points) else {
        return;
    };
    let stroke = Stroke {
        width,
        dash: if dashed { StrokeDash::new(vec![6.0, 4.0], 0.0) } else { None },
        ..Stroke::default()
    };
    frame.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
}

fn fill_polygon(frame: &mut Pixmap, points: &[Pos2], color: Color32) {
    if let Some(path) = polygon_path(points) {
        frame.fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
    }
}

fn stroke_line(frame: &mut Pixmap, from: Pos2, to: Pos2, color: Color32, width: f32) {
    let mut builder = PathBuilder::new();
    builder.move_to(from.x, from.y);
    builder.line_to(to.x, to.y);
    if let Some(path) = builder.finish() {
        let stroke = Stroke { width, ..Stroke::default() };
        frame.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::AspectRatio;
    use crate::config::EditorConfig;
    use crate::input::InputEvent;
    use egui::Modifiers;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn editor_with_image() -> Editor {
        let config = EditorConfig {
            drawing_surface_size: 2048,
            ..EditorConfig::default()
        };
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 200, 0, 255])));
        Editor::with_source_image(config, &image, AspectRatio::Square).unwrap()
    }

    fn rgba(frame: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let pixel = frame.pixel(x, y).unwrap().demultiply();
        [pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()]
    }

    #[test]
    fn frame_matches_viewport_and_paints_layers_in_order() {
        let editor = editor_with_image();
        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();

        assert_eq!((frame.width(), frame.height()), (1280, 800));
        // Outside the artboard only the canvas background shows
        let [r, g, b, _] = editor.config().canvas_background;
        assert_eq!(rgba(frame, 2, 2), [r, g, b, 255]);
        // The image sits on top of the white artboard at the view center
        assert_eq!(rgba(frame, 640, 400), [0, 200, 0, 255]);
        assert_eq!(rgba(frame, 640, 500), [255, 255, 255, 255]);
        assert_eq!(renderer.frames_rendered(), 1);
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let mut editor = editor_with_image();
        let id = editor.document().layers()[1].id;
        editor.toggle_visibility(id).unwrap();

        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();
        assert_eq!(rgba(frame, 640, 400), [255, 255, 255, 255]);
    }

    #[test]
    fn active_layer_gets_outline() {
        let mut editor = editor_with_image();
        let id = editor.document().layers()[1].id;
        editor.select_layer(id);

        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();
        // Top edge of the 100x100 image centered at (640, 400)
        let [_, _, blue, _] = rgba(frame, 620, 350);
        assert!(blue > 100, "blue was {blue}");
        assert_eq!(rgba(frame, 620, 360), [0, 200, 0, 255]);
    }

    fn drag_screen(editor: &mut Editor, from: Pos2, to: Pos2, release: bool) {
        let modifiers = Modifiers::NONE;
        editor.handle_event(&InputEvent::PointerDown { position: from, modifiers });
        editor.handle_event(&InputEvent::PointerMove { position: to, modifiers });
        if release {
            editor.handle_event(&InputEvent::PointerUp { position: to, modifiers });
        }
    }

    /// A green image at the view center plus a red rectangle drawn left of the artboard
    fn editor_with_drawing() -> (Editor, LayerId) {
        let mut editor = editor_with_image();
        editor.set_tool(ToolKind::Rect);
        drag_screen(&mut editor, Pos2::new(20.0, 250.0), Pos2::new(110.0, 350.0), true);
        let drawing = editor.document().topmost_drawing().unwrap();
        editor.set_tool(ToolKind::Select);
        (editor, drawing)
    }

    #[test]
    fn overlay_is_only_drawn_for_select_tool() {
        let mut editor = editor_with_image();
        let id = editor.document().layers()[1].id;
        editor.select_layer(id);
        editor.set_tool(ToolKind::Pencil);

        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();
        assert_eq!(rgba(frame, 620, 350), [0, 200, 0, 255]);
    }

    #[test]
    fn drawing_outline_is_dashed_and_image_outline_solid() {
        let (mut editor, drawing) = editor_with_drawing();
        let mut renderer = Renderer::new();

        editor.select_layer(drawing);
        let quad = editor.document().get(drawing).unwrap().hit_quad().unwrap();
        let quad = quad.map(|corner| editor.viewport().world_to_screen(corner));
        let frame = renderer.render(&editor).unwrap();
        let row = quad[0].y.floor() as u32;
        let middle = (quad[0].x + quad[1].x) / 2.0;
        let reds: Vec<u8> = ((quad[0].x + 8.0) as u32..(middle - 8.0) as u32)
            .map(|x| rgba(frame, x, row)[0])
            .collect();
        assert!(reds.iter().any(|red| *red < 100), "no dash in {reds:?}");
        assert!(reds.iter().any(|red| *red > 200), "no gap in {reds:?}");

        let image = editor.document().layers()[1].id;
        editor.select_layer(image);
        let frame = renderer.render(&editor).unwrap();
        for x in 598..632 {
            assert!(rgba(frame, x, 350)[2] > 100, "gap at {x}");
        }
    }

    #[test]
    fn drawing_layer_handles_sit_on_ink_corners() {
        let (mut editor, drawing) = editor_with_drawing();
        editor.select_layer(drawing);
        let quad = editor.document().get(drawing).unwrap().hit_quad().unwrap();

        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();
        for corner in [quad[0], quad[2]] {
            let screen = editor.viewport().world_to_screen(corner);
            assert_eq!(rgba(frame, screen.x as u32, screen.y as u32), [255, 255, 255, 255]);
        }
    }

    #[test]
    fn shape_in_progress_is_previewed() {
        let mut editor = editor_with_image();
        editor.set_tool(ToolKind::Rect);
        drag_screen(&mut editor, Pos2::new(700.0, 300.0), Pos2::new(800.0, 340.0), false);

        let mut renderer = Renderer::new();
        let frame = renderer.render(&editor).unwrap();
        let [r, g, b, a] = editor.config().stroke_color;
        assert_eq!(rgba(frame, 750, 300), [r, g, b, a]);

        // Nothing reaches the surface until release
        let drawing = editor.document().topmost_drawing().unwrap();
        assert_eq!(editor.document().get(drawing).unwrap().hit_region(), None);
    }
}
