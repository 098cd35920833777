//! Math utilities and types
//!
//! Provides the vector, quaternion and transform types shared by the cache,
//! composition and animation layers.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Quaternion, Unit, Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
///
/// Used both as the live transform of scene nodes and as the endpoints of
/// pose animations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform with a uniform scale factor
    pub fn from_uniform_scale(scale: f32, rotation: Quat, position: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::repeat(scale),
        }
    }

    /// Builder pattern: replace the scale with a uniform factor
    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::repeat(scale);
        self
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(point)
    }

    /// Combine this transform with another (`self` is the parent)
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Get the inverse transform
    ///
    /// Exact for uniform scales, which is all the composition layer produces.
    pub fn inverse(&self) -> Self {
        let inv_scale = Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let inv_rotation = self.rotation.inverse();
        let inv_position = inv_rotation * (-self.position.component_mul(&inv_scale));

        Self {
            position: inv_position,
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Whether every component is finite and the scale is strictly positive
    ///
    /// Transforms failing this check are never written to a scene node.
    pub fn is_well_formed(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
            && self.scale.iter().all(|v| v.is_finite() && *v > 0.0)
    }

    /// Interpolate between two poses
    ///
    /// Scale and position are blended componentwise, rotation follows the
    /// shortest spherical path. `t` is clamped to `[0, 1]` and the endpoints
    /// are returned exactly.
    pub fn interpolate(from: &Self, to: &Self, t: f32) -> Self {
        if t <= 0.0 {
            return *from;
        }
        if t >= 1.0 {
            return *to;
        }
        Self {
            position: utils::lerp_vec(&from.position, &to.position, t),
            rotation: utils::slerp(&from.rotation, &to.rotation, t),
            scale: utils::lerp_vec(&from.scale, &to.scale, t),
        }
    }
}

/// Math utility functions
pub mod utils {
    use super::{Quat, Vec3};

    /// Componentwise linear interpolation of two vectors
    pub fn lerp_vec(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a * (1.0 - t) + b * t
    }

    /// Shortest-path spherical interpolation
    pub fn slerp(a: &Quat, b: &Quat, t: f32) -> Quat {
        a.try_slerp(b, t, 1.0e-6)
            .unwrap_or_else(|| if t < 0.5 { *a } else { *b })
    }

    /// Smoothstep ease-in-out: `t² · (3 − 2t)` over a clamped `t`
    pub fn smoothstep(t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    /// Wrap an angle in degrees into `(-180, 180]`
    pub fn wrap_degrees(degrees: f32) -> f32 {
        let mut wrapped = degrees % 360.0;
        if wrapped > 180.0 {
            wrapped -= 360.0;
        } else if wrapped <= -180.0 {
            wrapped += 360.0;
        }
        wrapped
    }

    /// Rotation from Euler angles in degrees, composed intrinsically in
    /// X (pitch), Y (yaw), Z (roll) order
    pub fn rotation_from_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> Quat {
        Quat::from_axis_angle(&Vec3::x_axis(), pitch.to_radians())
            * Quat::from_axis_angle(&Vec3::y_axis(), yaw.to_radians())
            * Quat::from_axis_angle(&Vec3::z_axis(), roll.to_radians())
    }
}
