//! Fit a model into a preview volume

use crate::foundation::math::{Quat, Transform, Vec3};
use crate::scene::Aabb;

/// Transform that fits a model into a container volume
///
/// `model_bounds` are the model's bounds in its own space. The model is
/// rotated by `orientation`, scaled uniformly so the rotated bounds fill the
/// container's width or height (whichever is tighter), centered on the
/// origin and pushed back by half its scaled depth.
///
/// Returns `None` when either volume is degenerate, in which case the caller
/// keeps its previous transform.
pub fn fit_model_transform(
    container_size: Vec3,
    model_bounds: &Aabb,
    orientation: Quat,
) -> Option<Transform> {
    if !(container_size.x > 0.0 && container_size.y > 0.0) {
        return None;
    }

    let oriented = model_bounds.transformed(&Transform::from_position_rotation(Vec3::zeros(), orientation));
    let model_size = oriented.size();
    if !(model_size.x > 0.0 && model_size.y > 0.0) {
        return None;
    }

    let scale = (container_size.x / model_size.x).min(container_size.y / model_size.y);
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let scaled_center = oriented.center() * scale;
    let depth_offset = model_size.z * scale * 0.5;
    Some(Transform::from_uniform_scale(
        scale,
        orientation,
        Vec3::new(-scaled_center.x, -scaled_center.y, -scaled_center.z - depth_offset),
    ))
}
