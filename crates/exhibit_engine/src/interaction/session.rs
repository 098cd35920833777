//! Interaction session for one composite
//!
//! Owns the rotation controller and the pose animator that act on a single
//! composite and keeps them from writing at the same time: a drag stops any
//! teleport or reset, and a teleport or reset stops any coasting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{AnimationSettings, MotionSettings};
use crate::entity::{CompositeEntity, Configuration, SharedComposite, SharedConfiguration};
use crate::foundation::math::Transform;
use crate::foundation::time::Ticker;
use crate::interaction::pose_animator::{PoseAnimator, PoseTarget};
use crate::interaction::rotation::{DragSample, RotationController};
use crate::interaction::waypoint::waypoint_target_pose;
use crate::scene::{SceneError, SceneGraph, SceneNodes};

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coordinates gestures and animations on one composite
pub struct InteractionSession<S: SceneNodes + Send + 'static = SceneGraph> {
    composite: SharedComposite<S>,
    configuration: SharedConfiguration,
    rotation: RotationController,
    animator: PoseAnimator,
    animation: AnimationSettings,
    last_applied: Option<Configuration>,
}

impl<S: SceneNodes + Send + 'static> InteractionSession<S> {
    /// Start a session
    ///
    /// The composite's current pose becomes the default pose for
    /// [`reset`](Self::reset).
    pub fn new(
        composite: CompositeEntity<S>,
        configuration: Configuration,
        settings: &MotionSettings,
        ticker: Arc<dyn Ticker>,
    ) -> Self {
        let configuration = Arc::new(Mutex::new(configuration));
        let mut animator = PoseAnimator::new(settings.animation.clone(), Arc::clone(&ticker));
        animator.capture_default(composite.pose());

        Self {
            composite: Arc::new(Mutex::new(composite)),
            rotation: RotationController::new(Arc::clone(&configuration), settings.rotation.clone(), ticker),
            configuration,
            animator,
            animation: settings.animation.clone(),
            last_applied: None,
        }
    }

    /// Shared handle to the composite
    pub fn composite(&self) -> &SharedComposite<S> {
        &self.composite
    }

    /// Shared handle to the configuration driven by drags
    pub fn configuration(&self) -> &SharedConfiguration {
        &self.configuration
    }

    /// Pose [`reset`](Self::reset) returns to
    pub fn default_pose(&self) -> Option<Transform> {
        self.animator.default_pose()
    }

    /// Replace the configuration wholesale
    pub fn set_configuration(&self, configuration: Configuration) {
        *lock(&self.configuration) = configuration;
    }

    /// Forward a drag movement, stopping any running pose animation
    pub fn drag_changed(&mut self, sample: &DragSample) {
        self.animator.cancel();
        self.rotation.drag_changed(sample);
    }

    /// Forward the end of a drag
    pub fn drag_ended(&mut self, sample: &DragSample) {
        self.rotation.drag_ended(sample);
    }

    /// Teleport so the waypoint `id` ends up in front of the viewer
    ///
    /// The waypoint position honours overrides in `overrides_from`. Returns
    /// `false` if the composite has no such waypoint.
    pub fn teleport_to_waypoint(&mut self, id: &str, overrides_from: &Configuration) -> bool {
        let (position, current) = {
            let composite = lock(&self.composite);
            (composite.resolved_waypoint_position(id, overrides_from), composite.pose())
        };
        let Some(position) = position else {
            log::warn!("Unknown waypoint '{}'", id);
            return false;
        };

        self.rotation.cancel();
        let viewer_rotation = self.animator.default_pose().unwrap_or(current).rotation;
        let destination = waypoint_target_pose(position, viewer_rotation, self.animation.viewer_offset);
        log::info!("Teleporting to waypoint '{}'", id);
        self.animator.animate_to(&self.composite, destination);
        true
    }

    /// Animate back to the default pose, stopping any coasting
    pub fn reset(&mut self) -> bool {
        self.rotation.cancel();
        self.animator.reset_to_default(&self.composite)
    }

    /// Apply the shared configuration to the composite if it changed since
    /// the last sync
    ///
    /// Call from the host's frame loop. Returns whether anything was applied.
    /// While a teleport or reset is running it owns the root pose, so only
    /// marker visibility and positions are applied; the configured pose is
    /// dropped rather than written over the animation.
    pub fn sync(&mut self) -> Result<bool, SceneError> {
        let current = lock(&self.configuration).clone();
        if self.last_applied.as_ref() == Some(&current) {
            return Ok(false);
        }
        {
            let mut composite = lock(&self.composite);
            if self.animator.is_animating() {
                log::debug!("Pose animation running, syncing markers only");
                composite.update_markers(&current)?;
            } else {
                composite.update(&current, false)?;
            }
        }
        self.last_applied = Some(current);
        Ok(true)
    }

    /// Whether drag momentum is still being applied
    pub fn is_coasting(&self) -> bool {
        self.rotation.is_coasting()
    }

    /// Whether a teleport or reset is running
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Whether any gesture or animation is in progress
    pub fn is_busy(&self) -> bool {
        self.rotation.is_dragging() || self.rotation.is_coasting() || self.animator.is_animating()
    }

    /// Block until coasting and pose animation finish
    pub fn wait_idle(&mut self) {
        self.rotation.wait_for_coasting();
        self.animator.wait();
    }

    /// Stop everything in flight
    pub fn cancel_all(&mut self) {
        self.rotation.cancel();
        self.animator.cancel();
    }
}

impl<S: SceneNodes + Send + 'static> Drop for InteractionSession<S> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
