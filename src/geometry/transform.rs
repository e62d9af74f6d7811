//! Conversions between the three coordinate spaces of the editor.
//!
//! * **Screen** space: pointer coordinates relative to the canvas widget.
//! * **World** space: the unbounded logical canvas, `world = (screen - pan) / zoom`.
//! * **Layer-local** space: a layer's own unrotated frame with its origin at the
//!   top-left corner. Paint on drawing surfaces is stored in this space so it
//!   follows the layer through later moves and rotations.

use egui::{Pos2, Vec2};

use crate::layer::Transform;

/// Rotate `point` about `origin` by `angle_degrees`.
///
/// Screen space is y-down, so positive angles turn clockwise on screen. This is
/// the same convention `tiny_skia::Transform::from_rotate` uses.
pub fn rotate_point(point: Pos2, origin: Pos2, angle_degrees: f32) -> Pos2 {
    origin + rotate_vec(point - origin, angle_degrees)
}

pub fn rotate_vec(v: Vec2, angle_degrees: f32) -> Vec2 {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Map a world point into the layer's unrotated frame (origin at its top-left).
///
/// Exact inverse of the render transform: translate to center, rotate by
/// `+rotation`, draw the layer centered.
pub fn world_to_local(point: Pos2, transform: &Transform) -> Pos2 {
    let center = transform.center();
    let unrotated = rotate_point(point, center, -transform.rotation);
    (unrotated - center + transform.size / 2.0).to_pos2()
}

pub fn local_to_world(point: Pos2, transform: &Transform) -> Pos2 {
    let center = transform.center();
    let unrotated = center + (point.to_vec2() - transform.size / 2.0);
    rotate_point(unrotated, center, transform.rotation)
}

/// Pan and zoom of the canvas widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Uniform world-to-screen scale
    pub zoom: f32,
    /// Screen-space translation applied after zooming
    pub pan: Vec2,
    /// Size of the canvas widget in screen pixels
    pub size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::new(1280.0, 800.0))
    }
}

impl Viewport {
    /// A viewport of the given size with world origin at its center
    pub fn new(size: Vec2) -> Self {
        Self {
            zoom: 1.0,
            pan: size / 2.0,
            size,
        }
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    /// World point currently shown at the middle of the canvas
    pub fn world_center(&self) -> Pos2 {
        self.screen_to_world((self.size / 2.0).to_pos2())
    }

    pub fn center_on(&mut self, world: Pos2) {
        self.pan = self.size / 2.0 - world.to_vec2() * self.zoom;
    }

    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta;
    }

    /// Resize the widget while keeping the same world point centered
    pub fn set_size(&mut self, size: Vec2) {
        if size == self.size {
            return;
        }
        let center = self.world_center();
        self.size = size;
        self.center_on(center);
    }

    /// Multiply the zoom by `factor`, keeping the world point under `screen` fixed
    pub fn zoom_at(&mut self, screen: Pos2, factor: f32, min_zoom: f32, max_zoom: f32) {
        let anchor = self.screen_to_world(screen);
        self.zoom = (self.zoom * factor).clamp(min_zoom, max_zoom);
        self.pan = screen.to_vec2() - anchor.to_vec2() * self.zoom;
    }

    /// World-to-screen mapping as a raster transform
    pub fn to_raster_transform(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(self.zoom, 0.0, 0.0, self.zoom, self.pan.x, self.pan.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn local_round_trip_for_all_rotations() {
        let mut transform = Transform::new(Pos2::new(-40.0, 25.0), Vec2::new(120.0, 80.0));
        let samples = [
            Pos2::new(0.0, 0.0),
            Pos2::new(120.0, 80.0),
            Pos2::new(33.0, 71.5),
            Pos2::new(-15.0, 200.0),
        ];

        for degrees in (0..=360).step_by(15) {
            transform.rotation = degrees as f32;
            for p in samples {
                let back = world_to_local(local_to_world(p, &transform), &transform);
                assert!(close(back, p), "rotation {degrees}: {p:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn local_matches_raster_transform() {
        let mut transform = Transform::new(Pos2::new(10.0, 20.0), Vec2::new(50.0, 30.0));
        transform.rotation = 37.0;

        let mut mapped = [tiny_skia::Point::from_xy(12.0, 7.0)];
        transform.to_world_transform().map_points(&mut mapped);
        let expected = local_to_world(Pos2::new(12.0, 7.0), &transform);
        assert!(close(Pos2::new(mapped[0].x, mapped[0].y), expected));
    }

    #[test]
    fn zoom_keeps_anchor_under_cursor() {
        let mut viewport = Viewport::new(Vec2::new(800.0, 600.0));
        let cursor = Pos2::new(620.0, 140.0);
        let before = viewport.screen_to_world(cursor);

        viewport.zoom_at(cursor, 2.5, 0.1, 8.0);

        assert!(close(viewport.screen_to_world(cursor), before));
        assert_eq!(viewport.zoom, 2.5);
    }

    #[test]
    fn screen_world_round_trip() {
        let mut viewport = Viewport::new(Vec2::new(800.0, 600.0));
        viewport.zoom = 0.75;
        viewport.pan_by(Vec2::new(13.0, -40.0));

        let world = Pos2::new(-120.0, 56.0);
        assert!(close(viewport.screen_to_world(viewport.world_to_screen(world)), world));
    }
}
