//! Glyph rasterization for text annotations, using the fonts egui ships with.

use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use egui::{Color32, Vec2};
use tiny_skia::{Pixmap, PremultipliedColorU8};

const PREFERRED_FONT: &str = "Ubuntu-Light";

static DEFAULT_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

/// The proportional font bundled with egui, loaded once
pub fn default_font() -> Option<&'static FontArc> {
    DEFAULT_FONT.get_or_init(load_default_font).as_ref()
}

fn load_default_font() -> Option<FontArc> {
    let definitions = egui::FontDefinitions::default();
    let data = definitions
        .font_data
        .get(PREFERRED_FONT)
        .or_else(|| definitions.font_data.values().next())?;

    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("Failed to load default font: {}", err);
            None
        }
    }
}

struct Line {
    glyphs: Vec<(GlyphId, f32)>,
    width: f32,
    height: f32,
    ascent: f32,
}

fn layout(font: &FontArc, text: &str, size: f32) -> Line {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(previous) = previous {
            cursor += scaled.kern(previous, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        previous = Some(id);
    }

    Line {
        glyphs,
        width: cursor,
        height: scaled.height(),
        ascent: scaled.ascent(),
    }
}

/// Size of a single line of text at `size` pixels
pub fn measure(text: &str, size: f32) -> Vec2 {
    match default_font() {
        Some(font) => {
            let line = layout(font, text, size);
            Vec2::new(line.width, line.height)
        }
        None => Vec2::new(text.chars().count() as f32 * size * 0.5, size),
    }
}

/// Rasterize one line of text with its top-left corner at the pixmap origin.
///
/// Returns `None` for empty text or when no font is available.
pub fn rasterize(text: &str, size: f32, color: Color32) -> Option<Pixmap> {
    if text.is_empty() {
        return None;
    }
    let font = default_font()?;
    let line = layout(font, text, size);
    let width = line.width.ceil().max(1.0) as u32;
    let height = line.height.ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height)?;

    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let pixels = pixmap.pixels_mut();

    for (id, x) in line.glyphs {
        let glyph = id.with_scale_and_position(size, point(x, line.ascent));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = gx as i32 + bounds.min.x as i32;
            let py = gy as i32 + bounds.min.y as i32;
            if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                return;
            }
            let index = (py as u32 * width + px as u32) as usize;
            let alpha = (coverage.clamp(0.0, 1.0) * a as f32).round() as u8;
            if alpha <= pixels[index].alpha() {
                return;
            }
            let premultiply = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
            let pixel =
                PremultipliedColorU8::from_rgba(premultiply(r), premultiply(g), premultiply(b), alpha);
            if let Some(pixel) = pixel {
                pixels[index] = pixel;
            }
        });
    }

    Some(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_font_loads() {
        assert!(default_font().is_some());
    }

    #[test]
    fn rasterized_text_has_ink() {
        let pixmap = rasterize("fix lighting", 24.0, Color32::RED).unwrap();
        let measured = measure("fix lighting", 24.0);

        assert_eq!(pixmap.width(), measured.x.ceil() as u32);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 200));
        assert!(rasterize("", 24.0, Color32::RED).is_none());
    }

    #[test]
    fn longer_text_is_wider() {
        assert!(measure("annotation", 20.0).x > measure("note", 20.0).x);
    }
}
