use egui::{Pos2, Vec2};
use studio_canvas::Transform;
use studio_canvas::geometry::{Handle, bounding_rect, corners, local_to_world, resized_transform, world_to_local};

fn rotated(position: Pos2, size: Vec2, rotation: f32) -> Transform {
    Transform {
        position,
        size,
        rotation,
    }
}

fn assert_near(a: Pos2, b: Pos2) {
    assert!((a - b).length() < 1e-2, "{a:?} != {b:?}");
}

#[test]
fn test_local_world_round_trip_at_every_angle() {
    let point = Pos2::new(13.0, 71.0);
    for degrees in (0..360).step_by(15) {
        let transform = rotated(Pos2::new(-40.0, 25.0), Vec2::new(120.0, 80.0), degrees as f32);
        let world = local_to_world(point, &transform);
        assert_near(world_to_local(world, &transform), point);
    }
}

#[test]
fn test_corner_centroid_is_center() {
    for degrees in (0..360).step_by(20) {
        let transform = rotated(Pos2::new(10.0, -30.0), Vec2::new(64.0, 200.0), degrees as f32);
        let sum = corners(&transform)
            .iter()
            .fold(Vec2::ZERO, |sum, corner| sum + corner.to_vec2());
        assert_near((sum / 4.0).to_pos2(), transform.center());
    }
}

#[test]
fn test_resize_never_collapses() {
    let original = rotated(Pos2::ZERO, Vec2::splat(100.0), 30.0);
    for handle in Handle::RESIZE {
        let squashed = resized_transform(&original, handle, Vec2::new(-500.0, 500.0), false, 10.0);
        assert!(squashed.size.x >= 10.0 && squashed.size.y >= 10.0, "{handle:?} gave {:?}", squashed.size);
        let squashed = resized_transform(&original, handle, Vec2::new(500.0, -500.0), false, 10.0);
        assert!(squashed.size.x >= 10.0 && squashed.size.y >= 10.0, "{handle:?} gave {:?}", squashed.size);
    }
}

#[test]
fn test_shift_resize_keeps_aspect() {
    let original = Transform::new(Pos2::ZERO, Vec2::new(200.0, 100.0));
    let resized = resized_transform(&original, Handle::BottomRight, Vec2::new(100.0, 10.0), true, 10.0);
    assert!((resized.size.x / resized.size.y - 2.0).abs() < 1e-3);
    // The opposite corner stays put
    assert_near(corners(&resized)[0], Pos2::ZERO);
}

#[test]
fn test_quarter_turn_keeps_bounding_square() {
    let square = Transform::new(Pos2::ZERO, Vec2::splat(100.0));
    let turned = Transform { rotation: 90.0, ..square };
    let before = bounding_rect(corners(&square));
    let after = bounding_rect(corners(&turned));
    assert_near(after.min, before.min);
    assert_near(after.max, before.max);
}
