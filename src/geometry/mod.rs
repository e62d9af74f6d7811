pub mod handles;
pub mod hit_testing;
pub mod transform;

pub use handles::{Handle, corners, handle_at, handle_positions, resized_transform, rotated_transform};
pub use hit_testing::{bounding_rect, contains_point, quad_intersects_rect, rect_corners};
pub use transform::{Viewport, local_to_world, rotate_point, rotate_vec, world_to_local};
