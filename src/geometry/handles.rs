use egui::{CursorIcon, Pos2, Vec2};

use crate::config::EditorConfig;
use crate::geometry::transform::{local_to_world, rotate_vec};
use crate::layer::Transform;

/// A transform handle of the active layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Rotate,
}

impl Handle {
    pub const RESIZE: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    /// Which edges the handle moves, as `(-1 | 0 | 1, -1 | 0 | 1)` in layer-local axes.
    /// `None` for the rotation handle.
    pub fn resize_signs(&self) -> Option<(f32, f32)> {
        match self {
            Handle::TopLeft => Some((-1.0, -1.0)),
            Handle::Top => Some((0.0, -1.0)),
            Handle::TopRight => Some((1.0, -1.0)),
            Handle::Right => Some((1.0, 0.0)),
            Handle::BottomRight => Some((1.0, 1.0)),
            Handle::Bottom => Some((0.0, 1.0)),
            Handle::BottomLeft => Some((-1.0, 1.0)),
            Handle::Left => Some((-1.0, 0.0)),
            Handle::Rotate => None,
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            Handle::TopLeft | Handle::BottomRight => CursorIcon::ResizeNwSe,
            Handle::TopRight | Handle::BottomLeft => CursorIcon::ResizeNeSw,
            Handle::Top | Handle::Bottom => CursorIcon::ResizeVertical,
            Handle::Left | Handle::Right => CursorIcon::ResizeHorizontal,
            Handle::Rotate => CursorIcon::Alias,
        }
    }
}

/// Rotated corners of a layer in world space, in TL, TR, BR, BL order
pub fn corners(transform: &Transform) -> [Pos2; 4] {
    let Vec2 { x: w, y: h } = transform.size;
    [
        Pos2::new(0.0, 0.0),
        Pos2::new(w, 0.0),
        Pos2::new(w, h),
        Pos2::new(0.0, h),
    ]
    .map(|local| local_to_world(local, transform))
}

/// World positions of the 8 resize handles followed by the rotation handle.
///
/// The rotation handle sits `rotation_handle_offset` screen pixels above the
/// top edge, so its world distance shrinks as the canvas zooms in.
pub fn handle_positions(transform: &Transform, zoom: f32, config: &EditorConfig) -> Vec<(Handle, Pos2)> {
    let center = transform.center();
    let half = transform.size / 2.0;

    let mut handles: Vec<(Handle, Pos2)> = Handle::RESIZE
        .iter()
        .filter_map(|handle| {
            let (sx, sy) = handle.resize_signs()?;
            let offset = Vec2::new(sx * half.x, sy * half.y);
            Some((*handle, center + rotate_vec(offset, transform.rotation)))
        })
        .collect();

    let rotate_offset = Vec2::new(0.0, -half.y - config.rotation_handle_offset / zoom);
    handles.push((Handle::Rotate, center + rotate_vec(rotate_offset, transform.rotation)));
    handles
}

/// The handle under `point`, if any. The rotation handle wins over resize handles.
pub fn handle_at(point: Pos2, transform: &Transform, zoom: f32, config: &EditorConfig) -> Option<Handle> {
    let radius = config.handle_size * 1.5 / zoom;
    let handles = handle_positions(transform, zoom, config);

    if let Some((handle, _)) = handles
        .iter()
        .find(|(handle, pos)| *handle == Handle::Rotate && pos.distance(point) <= radius)
    {
        return Some(*handle);
    }

    handles
        .iter()
        .map(|(handle, pos)| (*handle, pos.distance(point)))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}

/// Resize `original` by dragging `handle` a cumulative `world_delta`.
///
/// The delta is projected into the layer's rotated frame and the handle
/// opposite the dragged one stays fixed in world space. With `keep_aspect` the
/// original width/height ratio is preserved by growing whichever dimension
/// changed relatively less. Neither side ever drops below `min_size`.
pub fn resized_transform(
    original: &Transform,
    handle: Handle,
    world_delta: Vec2,
    keep_aspect: bool,
    min_size: f32,
) -> Transform {
    let Some((sx, sy)) = handle.resize_signs() else {
        return *original;
    };

    let local_delta = rotate_vec(world_delta, -original.rotation);
    let mut width = original.size.x + sx * local_delta.x;
    let mut height = original.size.y + sy * local_delta.y;

    if keep_aspect {
        let aspect = original.size.x / original.size.y;
        if sx == 0.0 {
            width = height * aspect;
        } else if sy == 0.0 {
            height = width / aspect;
        } else if width / original.size.x < height / original.size.y {
            width = height * aspect;
        } else {
            height = width / aspect;
        }

        if width < min_size || height < min_size {
            if aspect >= 1.0 {
                height = min_size;
                width = min_size * aspect;
            } else {
                width = min_size;
                height = min_size / aspect;
            }
        }
    } else {
        width = width.max(min_size);
        height = height.max(min_size);
    }

    let half = original.size / 2.0;
    let anchor = original.center() + rotate_vec(Vec2::new(-sx * half.x, -sy * half.y), original.rotation);
    let new_size = Vec2::new(width, height);
    let new_center = anchor + rotate_vec(Vec2::new(sx * width / 2.0, sy * height / 2.0), original.rotation);

    Transform {
        position: new_center - new_size / 2.0,
        size: new_size,
        rotation: original.rotation,
    }
}

/// Rotate `original` about its center by the angle swept from `start` to `current`
pub fn rotated_transform(original: &Transform, start: Pos2, current: Pos2) -> Transform {
    let center = original.center();
    let angle_of = |p: Pos2| {
        let v = p - center;
        v.y.atan2(v.x).to_degrees()
    };

    Transform {
        rotation: (original.rotation + angle_of(current) - angle_of(start)).rem_euclid(360.0),
        ..*original
    }
}
