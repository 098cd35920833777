//! Pose animation for teleport and reset
//!
//! Runs a fixed-length, eased interpolation of a target's root pose on a
//! background task. Each sample is written under the target's lock after a
//! cancellation check, so a cancelled animation leaves the last fully
//! written pose in place.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::AnimationSettings;
use crate::foundation::math::{utils, Transform};
use crate::foundation::task::TaskSlot;
use crate::foundation::time::Ticker;
use crate::scene::SceneError;

/// Something with an animatable root pose
pub trait PoseTarget {
    /// Current root pose
    fn pose(&self) -> Transform;

    /// Replace the root pose
    fn set_pose(&mut self, pose: Transform) -> Result<(), SceneError>;
}

fn lock<T>(target: &Mutex<T>) -> MutexGuard<'_, T> {
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Animates one target's pose at a time
pub struct PoseAnimator {
    settings: AnimationSettings,
    ticker: Arc<dyn Ticker>,
    task: TaskSlot,
    default_pose: Option<Transform>,
}

impl PoseAnimator {
    /// Create an idle animator
    pub fn new(settings: AnimationSettings, ticker: Arc<dyn Ticker>) -> Self {
        Self {
            settings,
            ticker,
            task: TaskSlot::new(),
            default_pose: None,
        }
    }

    /// Animation settings in use
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    /// Remember the pose [`reset_to_default`](Self::reset_to_default) returns to
    pub fn capture_default(&mut self, pose: Transform) {
        self.default_pose = Some(pose);
    }

    /// Captured default pose
    pub fn default_pose(&self) -> Option<Transform> {
        self.default_pose
    }

    /// Animate `target` from its current pose to `destination`
    ///
    /// Any animation already running is cancelled and joined first. A
    /// degenerate destination is ignored.
    pub fn animate_to<T>(&mut self, target: &Arc<Mutex<T>>, destination: Transform)
    where
        T: PoseTarget + Send + 'static,
    {
        if !destination.is_well_formed() {
            log::debug!("Ignoring animation to degenerate pose {:?}", destination);
            return;
        }

        let target = Arc::clone(target);
        let ticker = Arc::clone(&self.ticker);
        let frame_count = self.settings.frame_count();
        let interval = self.settings.frame_interval();

        self.task.start("pose-animation", move |token| {
            let start = lock(&target).pose();
            log::debug!("Pose animation started over {} frames", frame_count);

            for frame in 0..=frame_count {
                if token.is_cancelled() {
                    log::debug!("Pose animation cancelled at frame {}", frame);
                    return;
                }

                let progress = frame as f32 / frame_count as f32;
                let pose = Transform::interpolate(&start, &destination, utils::smoothstep(progress));
                {
                    let mut target = lock(&target);
                    if token.is_cancelled() {
                        log::debug!("Pose animation cancelled at frame {}", frame);
                        return;
                    }
                    if let Err(e) = target.set_pose(pose) {
                        log::error!("Pose animation aborted: {}", e);
                        return;
                    }
                }

                if frame < frame_count {
                    ticker.wait(interval);
                }
            }
            log::debug!("Pose animation complete");
        });
    }

    /// Animate `target` back to the captured default pose
    ///
    /// Returns `false` when no default pose was captured.
    pub fn reset_to_default<T>(&mut self, target: &Arc<Mutex<T>>) -> bool
    where
        T: PoseTarget + Send + 'static,
    {
        match self.default_pose {
            Some(pose) => {
                self.animate_to(target, pose);
                true
            }
            None => {
                log::warn!("No default pose captured, nothing to reset to");
                false
            }
        }
    }

    /// Stop the running animation, leaving the last written pose
    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    /// Whether an animation is still running
    pub fn is_animating(&self) -> bool {
        self.task.is_active()
    }

    /// Block until the running animation finishes
    pub fn wait(&mut self) {
        self.task.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use crate::foundation::time::ImmediateTicker;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records every pose written to it
    #[derive(Default)]
    struct RecordingTarget {
        pose: Transform,
        writes: Vec<Transform>,
    }

    impl PoseTarget for RecordingTarget {
        fn pose(&self) -> Transform {
            self.pose
        }

        fn set_pose(&mut self, pose: Transform) -> Result<(), SceneError> {
            self.pose = pose;
            self.writes.push(pose);
            Ok(())
        }
    }

    fn destination() -> Transform {
        Transform::from_uniform_scale(
            1.0,
            Quat::from_axis_angle(&Vec3::y_axis(), 1.2),
            Vec3::new(0.3, -0.1, -1.25),
        )
    }

    #[test]
    fn test_teleport_ends_exactly_at_destination() {
        let ticker = Arc::new(ImmediateTicker::new());
        let mut animator = PoseAnimator::new(AnimationSettings::default(), ticker.clone());
        let target = Arc::new(Mutex::new(RecordingTarget {
            pose: Transform::identity().with_uniform_scale(0.12),
            writes: Vec::new(),
        }));

        animator.animate_to(&target, destination());
        animator.wait();

        let target = lock(&target);
        assert_eq!(target.pose, destination());
        assert_eq!(target.writes.len(), 55);
        assert_eq!(target.writes[0], Transform::identity().with_uniform_scale(0.12));
        // No sleep after the final sample
        assert_eq!(ticker.ticks(), 54);
    }

    #[test]
    fn test_samples_are_eased() {
        let mut animator = PoseAnimator::new(AnimationSettings::default(), Arc::new(ImmediateTicker::new()));
        let target = Arc::new(Mutex::new(RecordingTarget::default()));
        let end = Transform::from_position(Vec3::new(0.0, 0.0, -10.0));

        animator.animate_to(&target, end);
        animator.wait();

        let target = lock(&target);
        let writes = &target.writes;
        let quarter = writes[54 / 4].position.z;
        let middle = writes[27].position.z;
        // Slow start, linear-looking middle
        assert!(quarter > -2.5, "quarter was {quarter}");
        assert!((middle + 5.0).abs() < 1e-4, "middle was {middle}");
        for pair in writes.windows(2) {
            assert!(pair[1].position.z <= pair[0].position.z);
        }
    }

    /// Target that raises a stop flag after a number of writes
    struct CancellingTarget {
        pose: Transform,
        writes: usize,
        stop_after: usize,
        stop: Arc<AtomicBool>,
    }

    impl PoseTarget for CancellingTarget {
        fn pose(&self) -> Transform {
            self.pose
        }

        fn set_pose(&mut self, pose: Transform) -> Result<(), SceneError> {
            self.pose = pose;
            self.writes += 1;
            if self.writes == self.stop_after {
                self.stop.store(true, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    #[test]
    fn test_cancel_leaves_last_written_pose() {
        let stop = Arc::new(AtomicBool::new(false));
        let target = Arc::new(Mutex::new(CancellingTarget {
            pose: Transform::identity(),
            writes: 0,
            stop_after: 10,
            stop: Arc::clone(&stop),
        }));

        // Runs instantly until the target asks to stop, then crawls so the
        // cancellation lands long before the last frame
        struct SlowAfterStop(Arc<AtomicBool>);
        impl Ticker for SlowAfterStop {
            fn wait(&self, _interval: std::time::Duration) {
                if self.0.load(Ordering::SeqCst) {
                    std::thread::sleep(std::time::Duration::from_millis(20));
                }
            }
        }

        let mut animator = PoseAnimator::new(
            AnimationSettings::default(),
            Arc::new(SlowAfterStop(Arc::clone(&stop))),
        );
        animator.animate_to(&target, destination());
        while !stop.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        animator.cancel();

        let target = lock(&target);
        assert!(target.writes >= 10 && target.writes < 55);
        assert_ne!(target.pose, destination());
        assert!(target.pose.is_well_formed());
    }

    #[test]
    fn test_new_animation_replaces_running_one() {
        let mut animator = PoseAnimator::new(AnimationSettings::default(), Arc::new(ImmediateTicker::new()));
        let target = Arc::new(Mutex::new(RecordingTarget::default()));
        let first = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));

        animator.animate_to(&target, first);
        animator.animate_to(&target, destination());
        animator.wait();

        assert_eq!(lock(&target).pose, destination());
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_reset_requires_captured_default() {
        let mut animator = PoseAnimator::new(AnimationSettings::default(), Arc::new(ImmediateTicker::new()));
        let target = Arc::new(Mutex::new(RecordingTarget::default()));
        assert!(!animator.reset_to_default(&target));

        let home = Transform::from_position(Vec3::new(0.0, -1.0, -2.0)).with_uniform_scale(0.12);
        animator.capture_default(home);
        animator.animate_to(&target, destination());
        animator.wait();

        assert!(animator.reset_to_default(&target));
        animator.wait();
        assert_eq!(lock(&target).pose, home);
    }

    #[test]
    fn test_degenerate_destination_ignored() {
        let mut animator = PoseAnimator::new(AnimationSettings::default(), Arc::new(ImmediateTicker::new()));
        let target = Arc::new(Mutex::new(RecordingTarget::default()));

        animator.animate_to(&target, Transform::identity().with_uniform_scale(0.0));
        animator.wait();
        assert!(lock(&target).writes.is_empty());
    }
}
