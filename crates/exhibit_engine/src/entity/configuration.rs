//! Per-entity configuration record
//!
//! A [`Configuration`] is a plain value: callers build a new one (or clone
//! and edit) and hand it to the composite wholesale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::foundation::math::{utils, Transform, Vec3};

/// Marker position overrides keyed by marker id
///
/// Entries that do not hold exactly three components are ignored.
pub type MarkerOverrides = HashMap<String, Vec<f32>>;

/// Configuration shared between a gesture driver and its host
pub type SharedConfiguration = Arc<Mutex<Configuration>>;

/// Placement, marker visibility and marker overrides of a composite entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Uniform scale
    pub scale: f32,
    /// Rotation about Y (degrees)
    pub yaw_degrees: f32,
    /// Rotation about X (degrees)
    pub pitch_degrees: f32,
    /// Rotation about Z (degrees)
    pub roll_degrees: f32,
    /// Translation
    pub position: Vec3,

    /// Whether hotspot markers are shown
    pub shows_hotspots: bool,
    /// Hotspot position overrides
    pub hotspot_overrides: MarkerOverrides,
    /// Whether waypoint markers are shown
    pub shows_waypoints: bool,
    /// Waypoint position overrides
    pub waypoint_overrides: MarkerOverrides,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            scale: 1.0,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            roll_degrees: 0.0,
            position: Vec3::zeros(),
            shows_hotspots: true,
            hotspot_overrides: HashMap::new(),
            shows_waypoints: true,
            waypoint_overrides: HashMap::new(),
        }
    }
}

impl Configuration {
    /// Tabletop exploration: small model, markers shown
    pub fn explore_default() -> Self {
        Self {
            scale: 0.00628,
            yaw_degrees: -46.5,
            ..Self::default()
        }
    }

    /// Catalog preview: markers hidden
    pub fn preview_default() -> Self {
        Self {
            scale: 0.006,
            yaw_degrees: 90.0,
            shows_hotspots: false,
            shows_waypoints: false,
            ..Self::default()
        }
    }

    /// Full-size immersive view in front of the viewer, markers hidden
    pub fn immersive_default() -> Self {
        Self {
            scale: 0.12,
            yaw_degrees: -45.0,
            position: Vec3::new(0.0, -1.0, -2.0),
            shows_hotspots: false,
            shows_waypoints: false,
            ..Self::default()
        }
    }

    /// Copy of `self` with marker visibility and overrides taken from `source`
    #[must_use]
    pub fn with_markers_from(&self, source: &Self) -> Self {
        Self {
            shows_hotspots: source.shows_hotspots,
            hotspot_overrides: source.hotspot_overrides.clone(),
            shows_waypoints: source.shows_waypoints,
            waypoint_overrides: source.waypoint_overrides.clone(),
            ..self.clone()
        }
    }

    /// Immersive placement sharing marker state with an exploration setup,
    /// at real-world scale
    #[must_use]
    pub fn immersive_from(immersive: &Self, explore: &Self) -> Self {
        Self {
            scale: 1.0,
            ..immersive.with_markers_from(explore)
        }
    }

    /// Root transform described by this configuration
    ///
    /// Rotation is composed from pitch, yaw and roll in that intrinsic order.
    pub fn target_transform(&self) -> Transform {
        Transform::from_uniform_scale(
            self.scale,
            utils::rotation_from_euler_degrees(self.pitch_degrees, self.yaw_degrees, self.roll_degrees),
            self.position,
        )
    }

    /// Hotspot override for `id`, if it has exactly three components
    pub fn hotspot_override(&self, id: &str) -> Option<Vec3> {
        override_position(&self.hotspot_overrides, id)
    }

    /// Waypoint override for `id`, if it has exactly three components
    pub fn waypoint_override(&self, id: &str) -> Option<Vec3> {
        override_position(&self.waypoint_overrides, id)
    }
}

fn override_position(overrides: &MarkerOverrides, id: &str) -> Option<Vec3> {
    match overrides.get(id).map(Vec::as_slice) {
        Some(&[x, y, z]) => Some(Vec3::new(x, y, z)),
        _ => None,
    }
}

/// A marker to attach: domain id plus model-space position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    /// Hotspot or waypoint id
    pub id: String,
    /// Position in model space
    pub position: Vec3,
}

impl MarkerSpec {
    /// Create a marker spec
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}
