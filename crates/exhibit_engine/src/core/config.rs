//! # Motion and caching settings
//!
//! Every numeric policy constant used by the cache, the rotation gesture and
//! the pose animator lives here with its default value. Hosts can override
//! any of them from a TOML or RON file through [`Config`].
//!
//! ## Sections
//!
//! - **Pool**: prototype cache capacity
//! - **Rotation**: drag sensitivities, clamps and momentum decay
//! - **Animation**: teleport/reset timing and the viewer-relative target
//! - **Markers**: visual style of hotspot and waypoint markers

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec3;

/// Root settings record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Prototype cache settings
    pub pool: PoolSettings,
    /// Drag-to-rotate settings
    pub rotation: RotationSettings,
    /// Pose animation settings
    pub animation: AnimationSettings,
    /// Marker styles
    pub markers: MarkerStyles,
}

impl Config for MotionSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()?;
        self.rotation.validate()?;
        self.animation.validate()
    }
}

/// Prototype cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of resident prototypes
    pub max_prototype_count: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_prototype_count: 2,
        }
    }
}

impl PoolSettings {
    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_prototype_count == 0 {
            return Err(ConfigError::Invalid {
                field: "pool.max_prototype_count",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Drag-to-rotate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Yaw change per unit of horizontal drag (degrees)
    pub yaw_degrees_per_unit: f32,
    /// Pitch change per unit of vertical drag (degrees)
    pub pitch_degrees_per_unit: f32,
    /// Pitch is clamped to `[-limit, limit]`
    pub pitch_limit_degrees: f32,
    /// Largest yaw momentum carried into coasting
    pub coast_yaw_limit_degrees: f32,
    /// Largest pitch momentum carried into coasting
    pub coast_pitch_limit_degrees: f32,
    /// Fraction of momentum kept after each coasting tick
    pub damping: f32,
    /// Coasting stops once both per-tick steps fall below this
    pub minimum_step_degrees: f32,
    /// Interval between coasting ticks (milliseconds)
    pub tick_interval_ms: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            yaw_degrees_per_unit: 220.0,
            pitch_degrees_per_unit: 180.0,
            pitch_limit_degrees: 70.0,
            coast_yaw_limit_degrees: 80.0,
            coast_pitch_limit_degrees: 55.0,
            damping: 0.82,
            minimum_step_degrees: 0.02,
            tick_interval_ms: 16,
        }
    }
}

impl RotationSettings {
    /// Interval between coasting ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(ConfigError::Invalid {
                field: "rotation.damping",
                reason: format!("{} is outside [0, 1)", self.damping),
            });
        }
        if !(self.minimum_step_degrees > 0.0) {
            return Err(ConfigError::Invalid {
                field: "rotation.minimum_step_degrees",
                reason: format!("{} must be positive", self.minimum_step_degrees),
            });
        }
        let limits = [
            ("rotation.pitch_limit_degrees", self.pitch_limit_degrees),
            ("rotation.coast_yaw_limit_degrees", self.coast_yaw_limit_degrees),
            ("rotation.coast_pitch_limit_degrees", self.coast_pitch_limit_degrees),
        ];
        for (field, value) in limits {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} must be non-negative"),
                });
            }
        }
        Ok(())
    }
}

/// Pose animation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Duration of teleport and reset animations (seconds)
    pub teleport_duration_secs: f32,
    /// Samples written per second while animating
    pub samples_per_second: u32,
    /// Duration of animated configuration updates (seconds)
    pub update_transition_secs: f32,
    /// Where a teleported waypoint ends up, relative to the scene origin
    pub viewer_offset: Vec3,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            teleport_duration_secs: 0.9,
            samples_per_second: 60,
            update_transition_secs: 0.25,
            viewer_offset: Vec3::new(0.0, -0.1, -1.25),
        }
    }
}

impl AnimationSettings {
    /// Number of interpolation steps for a teleport (at least one)
    pub fn frame_count(&self) -> u32 {
        let frames = (self.teleport_duration_secs * self.samples_per_second as f32).round();
        if frames.is_finite() && frames >= 1.0 {
            frames as u32
        } else {
            1
        }
    }

    /// Interval between animation samples
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.samples_per_second.max(1)))
    }

    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_second == 0 {
            return Err(ConfigError::Invalid {
                field: "animation.samples_per_second",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.teleport_duration_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "animation.teleport_duration_secs",
                reason: format!("{} must be positive", self.teleport_duration_secs),
            });
        }
        if !(self.update_transition_secs > 0.0) {
            return Err(ConfigError::Invalid {
                field: "animation.update_transition_secs",
                reason: format!("{} must be positive", self.update_transition_secs),
            });
        }
        Ok(())
    }
}

/// Visual style of one marker category
///
/// Carried through to marker nodes for the renderer; composition logic never
/// reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    /// Sphere radius in model units
    pub radius: f32,
    /// RGBA color
    pub color: [f32; 4],
}

/// Styles for both marker categories
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyles {
    /// Hotspot marker style
    pub hotspot: MarkerStyle,
    /// Waypoint marker style
    pub waypoint: MarkerStyle,
}

impl Default for MarkerStyles {
    fn default() -> Self {
        Self {
            hotspot: MarkerStyle {
                radius: 2.0,
                color: [1.0, 0.58, 0.0, 1.0],
            },
            waypoint: MarkerStyle {
                radius: 1.0,
                color: [0.0, 0.48, 1.0, 1.0],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_constants() {
        let settings = MotionSettings::default();
        assert_eq!(settings.pool.max_prototype_count, 2);
        assert_eq!(settings.rotation.yaw_degrees_per_unit, 220.0);
        assert_eq!(settings.rotation.pitch_degrees_per_unit, 180.0);
        assert_eq!(settings.rotation.damping, 0.82);
        assert_eq!(settings.animation.frame_count(), 54);
        assert_eq!(settings.rotation.tick_interval(), Duration::from_millis(16));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_damping_out_of_range_rejected() {
        let mut settings = MotionSettings::default();
        settings.rotation.damping = 1.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { field: "rotation.damping", .. })
        ));
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion.toml");

        let mut settings = MotionSettings::default();
        settings.pool.max_prototype_count = 3;
        settings.animation.teleport_duration_secs = 0.5;
        settings.save_to_file(&path).unwrap();

        let loaded = MotionSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion.ron");
        std::fs::write(&path, "(rotation: (damping: 0.5))").unwrap();

        let loaded = MotionSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded.rotation.damping, 0.5);
        assert_eq!(loaded.rotation.yaw_degrees_per_unit, 220.0);
        assert_eq!(loaded.pool, PoolSettings::default());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = MotionSettings::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
