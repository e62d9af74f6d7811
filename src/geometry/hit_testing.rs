use egui::{Pos2, Rect, Vec2};

use crate::geometry::transform::{local_to_world, world_to_local};
use crate::layer::Transform;

/// Whether a world point falls inside `local_rect` of a layer.
///
/// The point is rotated back into the layer's frame, so the test is exact for
/// rotated layers instead of using their axis-aligned bounds.
pub fn contains_point(transform: &Transform, local_rect: Rect, point: Pos2) -> bool {
    local_rect.contains(world_to_local(point, transform))
}

/// Corners of a layer-local rectangle mapped to world space (TL, TR, BR, BL)
pub fn rect_corners(transform: &Transform, local_rect: Rect) -> [Pos2; 4] {
    [
        local_rect.left_top(),
        local_rect.right_top(),
        local_rect.right_bottom(),
        local_rect.left_bottom(),
    ]
    .map(|local| local_to_world(local, transform))
}

/// Smallest axis-aligned rectangle containing every point
pub fn bounding_rect(points: impl IntoIterator<Item = Pos2>) -> Rect {
    points
        .into_iter()
        .fold(Rect::NOTHING, |rect, point| rect.union(Rect::from_min_max(point, point)))
}

/// Separating-axis test between a convex quad and an axis-aligned rectangle.
///
/// Touching edges count as intersecting.
pub fn quad_intersects_rect(quad: &[Pos2; 4], rect: Rect) -> bool {
    let rect_points = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()];

    let mut axes = vec![Vec2::X, Vec2::Y];
    for i in 0..2 {
        let edge = quad[i + 1] - quad[i];
        if edge.length_sq() > f32::EPSILON {
            axes.push(Vec2::new(-edge.y, edge.x));
        }
    }

    axes.iter().all(|axis| {
        let (quad_min, quad_max) = project(quad, *axis);
        let (rect_min, rect_max) = project(&rect_points, *axis);
        quad_max >= rect_min && rect_max >= quad_min
    })
}

fn project(points: &[Pos2; 4], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
        let d = p.to_vec2().dot(axis);
        (min.min(d), max.max(d))
    })
}
