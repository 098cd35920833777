//! Drag-to-rotate with momentum
//!
//! Gesture states: idle, dragging, coasting. Dragging maps pointer
//! displacement since the gesture start onto yaw and pitch relative to the
//! values captured when the gesture began. Releasing hands the predicted
//! remaining displacement to a coasting task that decays it geometrically.
//!
//! Every write goes straight into the shared [`Configuration`], so the host
//! sees it on its next frame.

use std::sync::{Arc, MutexGuard, PoisonError};

use crate::core::RotationSettings;
use crate::entity::{Configuration, SharedConfiguration};
use crate::foundation::math::{utils, Vec3};
use crate::foundation::task::TaskSlot;
use crate::foundation::time::Ticker;

/// One pointer sample in scene space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSample {
    /// Current pointer location
    pub location: Vec3,
    /// Location where the gesture started
    pub start_location: Vec3,
    /// Where the pointer would come to rest if released now
    pub predicted_end_location: Vec3,
}

impl DragSample {
    /// Sample with no predicted movement beyond `location`
    pub fn new(start_location: Vec3, location: Vec3) -> Self {
        Self {
            location,
            start_location,
            predicted_end_location: location,
        }
    }

    /// Builder pattern: set the predicted end location
    #[must_use]
    pub fn with_predicted_end(mut self, predicted_end_location: Vec3) -> Self {
        self.predicted_end_location = predicted_end_location;
        self
    }

    fn is_finite(&self) -> bool {
        [self.location, self.start_location, self.predicted_end_location]
            .iter()
            .all(|v| v.iter().all(|c| c.is_finite()))
    }
}

/// Remaining coasting rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Momentum {
    /// Remaining yaw
    pub yaw: f32,
    /// Remaining pitch
    pub pitch: f32,
}

impl Momentum {
    /// Take the next coasting step
    ///
    /// The step is `(1 - damping)` of the remaining momentum, which then
    /// decays by `damping`. Returns `None` once both step components are
    /// smaller than `minimum_step`.
    pub fn step(&mut self, damping: f32, minimum_step: f32) -> Option<(f32, f32)> {
        let step_yaw = self.yaw * (1.0 - damping);
        let step_pitch = self.pitch * (1.0 - damping);
        if step_yaw.abs() < minimum_step && step_pitch.abs() < minimum_step {
            return None;
        }
        self.yaw *= damping;
        self.pitch *= damping;
        Some((step_yaw, step_pitch))
    }
}

/// Yaw and pitch for a drag `delta` applied to a gesture baseline
pub fn drag_angles(settings: &RotationSettings, baseline: (f32, f32), delta: Vec3) -> (f32, f32) {
    let (base_yaw, base_pitch) = baseline;
    let yaw = utils::wrap_degrees(base_yaw + delta.x * settings.yaw_degrees_per_unit);
    let pitch = (base_pitch - delta.y * settings.pitch_degrees_per_unit)
        .clamp(-settings.pitch_limit_degrees, settings.pitch_limit_degrees);
    (yaw, pitch)
}

/// Momentum carried into coasting for a predicted displacement
pub fn release_momentum(settings: &RotationSettings, predicted_delta: Vec3) -> Momentum {
    Momentum {
        yaw: (predicted_delta.x * settings.yaw_degrees_per_unit)
            .clamp(-settings.coast_yaw_limit_degrees, settings.coast_yaw_limit_degrees),
        pitch: (-predicted_delta.y * settings.pitch_degrees_per_unit)
            .clamp(-settings.coast_pitch_limit_degrees, settings.coast_pitch_limit_degrees),
    }
}

fn apply_step(configuration: &mut Configuration, settings: &RotationSettings, step: (f32, f32)) {
    configuration.yaw_degrees = utils::wrap_degrees(configuration.yaw_degrees + step.0);
    configuration.pitch_degrees = (configuration.pitch_degrees + step.1)
        .clamp(-settings.pitch_limit_degrees, settings.pitch_limit_degrees);
}

fn lock(configuration: &SharedConfiguration) -> MutexGuard<'_, Configuration> {
    configuration.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turns drag gestures into yaw/pitch updates on a shared configuration
pub struct RotationController {
    configuration: SharedConfiguration,
    settings: RotationSettings,
    ticker: Arc<dyn Ticker>,
    baseline: Option<(f32, f32)>,
    coasting: TaskSlot,
}

impl RotationController {
    /// Create an idle controller
    pub fn new(configuration: SharedConfiguration, settings: RotationSettings, ticker: Arc<dyn Ticker>) -> Self {
        Self {
            configuration,
            settings,
            ticker,
            baseline: None,
            coasting: TaskSlot::new(),
        }
    }

    /// Configuration this controller writes to
    pub fn configuration(&self) -> &SharedConfiguration {
        &self.configuration
    }

    /// Whether a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.baseline.is_some()
    }

    /// Whether momentum is still being applied
    pub fn is_coasting(&self) -> bool {
        self.coasting.is_active()
    }

    /// Handle a drag movement
    ///
    /// The first sample of a gesture captures the yaw/pitch baseline. Any
    /// coasting from a previous gesture stops first.
    pub fn drag_changed(&mut self, sample: &DragSample) {
        if !sample.is_finite() {
            log::debug!("Ignoring non-finite drag sample");
            return;
        }
        self.coasting.cancel();

        let mut configuration = lock(&self.configuration);
        let baseline = *self
            .baseline
            .get_or_insert((configuration.yaw_degrees, configuration.pitch_degrees));
        let (yaw, pitch) = drag_angles(&self.settings, baseline, sample.location - sample.start_location);
        configuration.yaw_degrees = yaw;
        configuration.pitch_degrees = pitch;
    }

    /// Handle the end of a drag
    ///
    /// Applies the final position like [`drag_changed`](Self::drag_changed),
    /// then starts coasting with the predicted remaining movement.
    pub fn drag_ended(&mut self, sample: &DragSample) {
        let baseline = self.baseline.take();
        if !sample.is_finite() {
            log::debug!("Ignoring non-finite drag end");
            return;
        }
        self.coasting.cancel();

        {
            let mut configuration = lock(&self.configuration);
            let baseline = baseline.unwrap_or((configuration.yaw_degrees, configuration.pitch_degrees));
            let (yaw, pitch) = drag_angles(&self.settings, baseline, sample.location - sample.start_location);
            configuration.yaw_degrees = yaw;
            configuration.pitch_degrees = pitch;
        }

        let momentum = release_momentum(&self.settings, sample.predicted_end_location - sample.location);
        self.start_coasting(momentum);
    }

    /// Stop coasting and forget any gesture in progress
    pub fn cancel(&mut self) {
        self.coasting.cancel();
        self.baseline = None;
    }

    /// Block until coasting finishes on its own
    pub fn wait_for_coasting(&mut self) {
        self.coasting.wait();
    }

    fn start_coasting(&mut self, momentum: Momentum) {
        let configuration = Arc::clone(&self.configuration);
        let settings = self.settings.clone();
        let ticker = Arc::clone(&self.ticker);

        self.coasting.start("rotation-coasting", move |token| {
            let mut momentum = momentum;
            let mut ticks = 0_u32;
            while !token.is_cancelled() {
                let Some(step) = momentum.step(settings.damping, settings.minimum_step_degrees) else {
                    break;
                };
                {
                    let mut configuration = lock(&configuration);
                    if token.is_cancelled() {
                        break;
                    }
                    apply_step(&mut configuration, &settings, step);
                }
                ticks += 1;
                ticker.wait(settings.tick_interval());
            }
            log::trace!("Coasting stopped after {} ticks", ticks);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::time::ImmediateTicker;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn controller(configuration: Configuration) -> RotationController {
        RotationController::new(
            Arc::new(Mutex::new(configuration)),
            RotationSettings::default(),
            Arc::new(ImmediateTicker::new()),
        )
    }

    fn angles(controller: &RotationController) -> (f32, f32) {
        let configuration = lock(controller.configuration());
        (configuration.yaw_degrees, configuration.pitch_degrees)
    }

    #[test]
    fn test_small_horizontal_drag() {
        let mut controller = controller(Configuration::default());
        controller.drag_changed(&DragSample::new(Vec3::zeros(), Vec3::new(0.01, 0.0, 0.0)));

        let (yaw, pitch) = angles(&controller);
        assert_relative_eq!(yaw, 2.2, epsilon = 1e-5);
        assert_eq!(pitch, 0.0);
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_drag_is_relative_to_gesture_start() {
        let mut controller = controller(Configuration {
            yaw_degrees: 10.0,
            pitch_degrees: 5.0,
            ..Configuration::default()
        });
        let start = Vec3::new(1.0, 1.0, 0.0);

        controller.drag_changed(&DragSample::new(start, start + Vec3::new(0.05, 0.0, 0.0)));
        controller.drag_changed(&DragSample::new(start, start + Vec3::new(0.1, 0.1, 0.0)));

        let (yaw, pitch) = angles(&controller);
        assert_relative_eq!(yaw, 32.0, epsilon = 1e-4);
        // Upward drag tilts pitch down
        assert_relative_eq!(pitch, -13.0, epsilon = 1e-4);
    }

    #[test]
    fn test_angles_stay_in_range_for_large_drags() {
        let mut controller = controller(Configuration::default());
        for step in -50..50 {
            let delta = Vec3::new(step as f32 * 0.73, step as f32 * -0.41, 0.0);
            controller.drag_changed(&DragSample::new(Vec3::zeros(), delta));
            let (yaw, pitch) = angles(&controller);
            assert!(yaw > -180.0 && yaw <= 180.0, "yaw {yaw}");
            assert!((-70.0..=70.0).contains(&pitch), "pitch {pitch}");
        }
    }

    #[test]
    fn test_release_momentum_is_clamped() {
        let settings = RotationSettings::default();
        let momentum = release_momentum(&settings, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(momentum, Momentum { yaw: 80.0, pitch: -55.0 });

        let gentle = release_momentum(&settings, Vec3::new(0.1, -0.1, 0.0));
        assert_relative_eq!(gentle.yaw, 22.0, epsilon = 1e-4);
        assert_relative_eq!(gentle.pitch, 18.0, epsilon = 1e-4);
    }

    #[test]
    fn test_momentum_terminates_and_decreases() {
        let settings = RotationSettings::default();
        let mut momentum = Momentum { yaw: 80.0, pitch: -55.0 };
        let mut previous = momentum.yaw.abs() + momentum.pitch.abs();
        let mut steps = 0;
        while momentum.step(settings.damping, settings.minimum_step_degrees).is_some() {
            let magnitude = momentum.yaw.abs() + momentum.pitch.abs();
            assert!(magnitude < previous);
            previous = magnitude;
            steps += 1;
            assert!(steps < 1000);
        }
        // 80 * 0.18 * 0.82^n < 0.02 first holds at n = 34
        assert_eq!(steps, 34);
        assert_eq!(Momentum::default().step(settings.damping, settings.minimum_step_degrees), None);
    }

    #[test]
    fn test_release_coasts_then_stops() {
        let mut controller = controller(Configuration::default());
        let start = Vec3::zeros();
        let location = Vec3::new(0.01, 0.0, 0.0);
        controller.drag_changed(&DragSample::new(start, location));
        controller.drag_ended(&DragSample::new(start, location).with_predicted_end(Vec3::new(0.11, 0.0, 0.0)));
        assert!(!controller.is_dragging());

        controller.wait_for_coasting();
        assert!(!controller.is_coasting());

        // 2.2 from the drag plus nearly all of the 22 degrees of momentum
        let (yaw, pitch) = angles(&controller);
        assert!(yaw > 24.0 && yaw < 24.2, "yaw {yaw}");
        assert_eq!(pitch, 0.0);
    }

    #[test]
    fn test_new_drag_cancels_coasting() {
        let mut controller = RotationController::new(
            Arc::new(Mutex::new(Configuration::default())),
            RotationSettings::default(),
            Arc::new(crate::foundation::time::FrameTicker),
        );
        controller.drag_ended(
            &DragSample::new(Vec3::zeros(), Vec3::zeros()).with_predicted_end(Vec3::new(1.0, 0.0, 0.0)),
        );
        assert!(controller.is_coasting());

        controller.drag_changed(&DragSample::new(Vec3::zeros(), Vec3::zeros()));
        assert!(!controller.is_coasting());

        // Coasting is gone: the drag baseline is the only thing moving yaw now
        let baseline = angles(&controller).0;
        std::thread::sleep(std::time::Duration::from_millis(40));
        assert_eq!(angles(&controller).0, baseline);
    }

    #[test]
    fn test_non_finite_samples_ignored() {
        let mut controller = controller(Configuration::default());
        controller.drag_changed(&DragSample::new(Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!controller.is_dragging());
        assert_eq!(angles(&controller), (0.0, 0.0));
    }
}
