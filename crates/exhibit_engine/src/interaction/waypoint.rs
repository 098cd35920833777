//! Waypoint teleport targets
//!
//! Waypoints only carry a position. A facing is inferred from the
//! waypoint's horizontal direction, and the composite root pose is chosen so
//! that the waypoint lands at a fixed offset in front of the viewer.

use crate::entity::MarkerSpec;
use crate::foundation::math::{Quat, Transform, Vec2, Vec3};

/// Horizontal distance below which a waypoint has no usable direction
const MIN_HORIZONTAL_LENGTH: f32 = 1.0e-4;

/// Yaw-only rotation facing along the waypoint's horizontal direction
pub fn inferred_waypoint_rotation(position: &Vec3) -> Quat {
    let horizontal = Vec2::new(position.x, position.z);
    if horizontal.norm() <= MIN_HORIZONTAL_LENGTH {
        return Quat::identity();
    }
    Quat::from_axis_angle(&Vec3::y_axis(), position.x.atan2(position.z))
}

/// Local pose of a waypoint in model space
pub fn waypoint_local_transform(position: Vec3) -> Transform {
    Transform::from_position_rotation(position, inferred_waypoint_rotation(&position))
}

/// Root pose that brings a waypoint to the viewer
///
/// The viewer pose is `viewer_rotation` at `viewer_offset`; the result is
/// that pose composed with the inverse of the waypoint's local pose, at unit
/// scale.
pub fn waypoint_target_pose(waypoint_position: Vec3, viewer_rotation: Quat, viewer_offset: Vec3) -> Transform {
    let viewer = Transform::from_position_rotation(viewer_offset, viewer_rotation);
    let local = waypoint_local_transform(waypoint_position);
    viewer.combine(&local.inverse()).with_uniform_scale(1.0)
}

/// Waypoint to teleport to
///
/// Prefers the immersive selection, then the exploration selection, then
/// the first waypoint. Selections that name an unknown waypoint are skipped.
pub fn resolve_active_waypoint<'a>(
    waypoints: &'a [MarkerSpec],
    immersive_selection: Option<&str>,
    explore_selection: Option<&str>,
) -> Option<&'a MarkerSpec> {
    let find = |selection: Option<&str>| {
        selection.and_then(|id| waypoints.iter().find(|waypoint| waypoint.id == id))
    };
    find(immersive_selection)
        .or_else(|| find(explore_selection))
        .or_else(|| waypoints.first())
}
